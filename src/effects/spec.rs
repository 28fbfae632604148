use crate::animation::pace::Pace;
use crate::foundation::core::{Epoch, Point, Rgba8, Tick, Vec2};

/// Default effect duration in ticks (two seconds at 24 ticks/second).
pub const DEFAULT_EFFECT_TICKS: Tick = 48;

/// Whether an effect models an appearance or a disappearance.
///
/// `Intro` effects are anchored to their owner's begin time and run from
/// hidden toward revealed; `Outro` effects are anchored to the owner's end
/// time and run the opposite direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    Intro,
    Outro,
}

/// Which paint tools an effect acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolMask {
    pub stroke: bool,
    pub fill: bool,
}

impl ToolMask {
    pub const BOTH: Self = Self {
        stroke: true,
        fill: true,
    };
    pub const STROKE: Self = Self {
        stroke: true,
        fill: false,
    };
    pub const FILL: Self = Self {
        stroke: false,
        fill: true,
    };
}

impl Default for ToolMask {
    fn default() -> Self {
        Self::BOTH
    }
}

/// Child ordering policy for composite-effect distribution.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DistributionOrder {
    /// Insertion order.
    Ascending,
    /// Reverse insertion order.
    Descending,
    /// Caller-supplied permutation of `0..n`.
    Explicit(Vec<usize>),
    /// Deterministic seeded shuffle.
    Shuffled { seed: u64 },
}

/// The visual transform an effect applies while active.
///
/// The last three kinds are composite: they are never applied to a curve
/// directly and only make sense on a sequenced block, which distributes
/// them into ordinary per-child effects.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum EffectKind {
    /// Interpolate the masked paints toward a target color.
    Fade { tools: ToolMask, to: Rgba8 },
    /// Interpolate the anchor toward a target point.
    Travel { to: Point },
    /// Scale about a center toward a target ratio.
    Zoom { center: Point, ratio: f64 },
    /// Rotate and apply a sinusoidal vertical squash (flip illusion).
    Spin { center: Point, angle: f64 },
    /// Rotate and apply a smooth vertical squash reveal.
    Rise { center: Point, angle: f64 },
    /// Horizontal sinusoidal squeeze whose frequency grows with progress.
    Wring { center: Point, amplitude: f64 },
    /// Reveal a window of a polyline's vertex sequence around `index`.
    Trace { index: f64 },
    /// Composite: staggered per-child fade.
    Reveal {
        tools: ToolMask,
        order: DistributionOrder,
        /// Stage-relative schedule override used by two-pass distribution;
        /// `None` spreads over the template window.
        window: Option<Epoch>,
    },
    /// Composite: staggered per-child travel toward `anchor + separation`.
    Trickle {
        separation: Vec2,
        order: DistributionOrder,
    },
    /// Composite: stroke reveal followed by an overlapping fill reveal.
    StrokeThenFill { order: DistributionOrder },
}

impl EffectKind {
    /// Composite kinds are block-only and always distributed.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::Reveal { .. } | Self::Trickle { .. } | Self::StrokeThenFill { .. }
        )
    }

    /// Stable kind name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fade { .. } => "fade",
            Self::Travel { .. } => "travel",
            Self::Zoom { .. } => "zoom",
            Self::Spin { .. } => "spin",
            Self::Rise { .. } => "rise",
            Self::Wring { .. } => "wring",
            Self::Trace { .. } => "trace",
            Self::Reveal { .. } => "reveal",
            Self::Trickle { .. } => "trickle",
            Self::StrokeThenFill { .. } => "stroke-then-fill",
        }
    }

    fn default_pace(&self) -> Pace {
        match self {
            // Paint interpolation reads most naturally unshaped.
            Self::Fade { .. } | Self::Reveal { .. } => Pace::Linear,
            _ => Pace::Smooth,
        }
    }
}

/// A reusable effect template.
///
/// Templates are standalone values: they can be re-timed freely and attached
/// to any number of curves. Attachment deep-copies the template, so no two
/// owners ever share one effect instance.
///
/// The `window` is stage-relative until attachment: intro templates occupy
/// `[0, d)` ticks past their owner's begin, outro templates `[-d, 0)` ticks
/// before their owner's end.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectSpec {
    pub kind: EffectKind,
    pub stage: Stage,
    pub pace: Pace,
    pub window: Epoch,
}

fn stage_window(stage: Stage, duration: Tick) -> Epoch {
    let duration = duration.max(0);
    match stage {
        Stage::Intro => Epoch::new(0, duration),
        Stage::Outro => Epoch::new(-duration, 0),
    }
}

impl EffectSpec {
    /// Template with the kind's default pace and the default duration.
    pub fn new(kind: EffectKind, stage: Stage) -> Self {
        let pace = kind.default_pace();
        Self {
            kind,
            stage,
            pace,
            window: stage_window(stage, DEFAULT_EFFECT_TICKS),
        }
    }

    /// Replace the duration, re-deriving the stage-relative window.
    ///
    /// Negative durations clamp to zero with a diagnostic.
    pub fn with_duration(mut self, duration: Tick) -> Self {
        if duration < 0 {
            tracing::warn!(
                effect = self.kind.name(),
                duration,
                "negative effect duration clamped to 0"
            );
        }
        let offset = match self.stage {
            Stage::Intro => self.window.begin,
            Stage::Outro => self.window.end,
        };
        self.window = stage_window(self.stage, duration).shifted(offset);
        self
    }

    /// Replace the pacing function.
    pub fn with_pace(mut self, pace: Pace) -> Self {
        self.pace = pace;
        self
    }

    /// Replace the stage-relative window outright.
    pub fn with_window(mut self, window: Epoch) -> Self {
        self.window = window;
        self
    }

    /// Shift the stage-relative window by `dt` ticks.
    pub fn delayed(mut self, dt: Tick) -> Self {
        self.window = self.window.shifted(dt);
        self
    }

    /// Window length in ticks.
    pub fn duration(&self) -> Tick {
        self.window.len()
    }

    // Convenience constructors for the common kinds.

    /// Fade both tools toward full transparency.
    pub fn fade(stage: Stage) -> Self {
        Self::new(
            EffectKind::Fade {
                tools: ToolMask::BOTH,
                to: Rgba8::TRANSPARENT,
            },
            stage,
        )
    }

    /// Fade the masked tools toward `to`.
    pub fn fade_to(stage: Stage, tools: ToolMask, to: Rgba8) -> Self {
        Self::new(EffectKind::Fade { tools, to }, stage)
    }

    /// Move the anchor toward `to`.
    pub fn travel(stage: Stage, to: Point) -> Self {
        Self::new(EffectKind::Travel { to }, stage)
    }

    /// Scale about `center` toward `ratio`.
    pub fn zoom(stage: Stage, center: Point, ratio: f64) -> Self {
        Self::new(EffectKind::Zoom { center, ratio }, stage)
    }

    /// Flip about the axis through `center` at `angle`.
    pub fn spin(stage: Stage, center: Point, angle: f64) -> Self {
        Self::new(EffectKind::Spin { center, angle }, stage)
    }

    /// Unfold about the axis through `center` at `angle`.
    pub fn rise(stage: Stage, center: Point, angle: f64) -> Self {
        Self::new(EffectKind::Rise { center, angle }, stage)
    }

    /// Sinusoidal squeeze about `center`.
    pub fn wring(stage: Stage, center: Point, amplitude: f64) -> Self {
        Self::new(EffectKind::Wring { center, amplitude }, stage)
    }

    /// Polyline window reveal anchored at normalized `index`.
    pub fn trace(stage: Stage, index: f64) -> Self {
        Self::new(
            EffectKind::Trace {
                index: index.clamp(0.0, 1.0),
            },
            stage,
        )
    }

    /// Composite staggered fade.
    pub fn reveal(stage: Stage, tools: ToolMask, order: DistributionOrder) -> Self {
        Self::new(
            EffectKind::Reveal {
                tools,
                order,
                window: None,
            },
            stage,
        )
    }

    /// Composite staggered travel.
    pub fn trickle(stage: Stage, separation: Vec2, order: DistributionOrder) -> Self {
        Self::new(EffectKind::Trickle { separation, order }, stage)
    }

    /// Composite two-pass stroke/fill reveal.
    pub fn stroke_then_fill(stage: Stage, order: DistributionOrder) -> Self {
        Self::new(EffectKind::StrokeThenFill { order }, stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_template_window_is_zero_based() {
        let e = EffectSpec::fade(Stage::Intro);
        assert_eq!(e.window, Epoch::new(0, DEFAULT_EFFECT_TICKS));
        assert_eq!(e.duration(), DEFAULT_EFFECT_TICKS);
    }

    #[test]
    fn outro_template_window_is_end_anchored() {
        let e = EffectSpec::fade(Stage::Outro).with_duration(10);
        assert_eq!(e.window, Epoch::new(-10, 0));
    }

    #[test]
    fn with_duration_preserves_stage_offset() {
        let e = EffectSpec::fade(Stage::Intro).delayed(5).with_duration(10);
        assert_eq!(e.window, Epoch::new(5, 15));

        let e = EffectSpec::fade(Stage::Outro).delayed(-3).with_duration(10);
        assert_eq!(e.window, Epoch::new(-13, -3));
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let e = EffectSpec::fade(Stage::Intro).with_duration(-4);
        assert_eq!(e.duration(), 0);
    }

    #[test]
    fn composite_kinds_are_flagged() {
        assert!(
            EffectSpec::trickle(Stage::Intro, Vec2::ZERO, DistributionOrder::Ascending)
                .kind
                .is_composite()
        );
        assert!(!EffectSpec::fade(Stage::Intro).kind.is_composite());
        assert!(
            EffectSpec::stroke_then_fill(Stage::Outro, DistributionOrder::Descending)
                .kind
                .is_composite()
        );
    }

    #[test]
    fn fade_defaults_to_linear_pace() {
        assert_eq!(EffectSpec::fade(Stage::Intro).pace, Pace::Linear);
        assert_eq!(
            EffectSpec::travel(Stage::Intro, Point::ORIGIN).pace,
            Pace::Smooth
        );
    }
}
