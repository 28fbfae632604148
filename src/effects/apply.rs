use crate::animation::lerp::Lerp;
use crate::animation::pace::smooth;
use crate::effects::spec::{EffectKind, EffectSpec, Stage};
use crate::eval::avatar::Avatar;
use crate::foundation::core::{BezPath, Epoch, Point, Rgba8, Tick};
use crate::scene::curve::{point_along, polyline_vertices};

// Full cos cycles of the spin squash over one reveal (a quarter turn past
// four flips leaves the face upright at the end).
const SPIN_CYCLES: f64 = 4.25;

// Squeeze frequency in cycles per unit of x distance at full progress.
const WRING_FREQ: f64 = 1.0 / 128.0;

/// An effect bound to one owning curve, with an absolute window.
///
/// Created by deep-copying an [`EffectSpec`] template at attachment time;
/// the window is re-derived from the owner's interval whenever that
/// interval changes, preserving the stage-relative offset and duration.
#[derive(Clone, Debug)]
pub struct AttachedEffect {
    pub(crate) spec: EffectSpec,
    pub(crate) epoch: Epoch,
}

enum Gate {
    Hidden,
    Unaffected,
    Active(f64),
}

impl AttachedEffect {
    /// Resolve a template against the owner's current interval.
    pub(crate) fn attach(spec: EffectSpec, owner: Epoch) -> Self {
        let d = spec.duration();
        let epoch = match spec.stage {
            Stage::Intro => {
                let begin = owner.clamp_tick(owner.begin + spec.window.begin);
                let end = owner.clamp_tick(begin + d);
                Epoch::new(begin, end)
            }
            Stage::Outro => {
                let end = owner.clamp_tick(owner.end + spec.window.end);
                let begin = owner.clamp_tick(end - d);
                Epoch::new(begin, end)
            }
        };
        Self { spec, epoch }
    }

    /// Re-derive the window after the owner's interval changed from
    /// `old` to `new`, keeping the stage-relative offset measured against
    /// `old` and clamping both bounds into `new`.
    pub(crate) fn resync(&mut self, old: Epoch, new: Epoch) {
        let d = self.epoch.len();
        self.epoch = match self.spec.stage {
            Stage::Intro => {
                let dt_begin = self.epoch.begin - old.begin;
                let begin = new.clamp_tick(new.begin + dt_begin);
                let end = new.clamp_tick(new.begin + dt_begin + d);
                Epoch::new(begin, end)
            }
            Stage::Outro => {
                let dt_end = self.epoch.end - old.end;
                let end = new.clamp_tick(new.end + dt_end);
                let begin = new.clamp_tick(new.end + dt_end - d);
                Epoch::new(begin, end)
            }
        };
    }

    /// Resolved absolute window.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Stage tag of the underlying template.
    pub fn stage(&self) -> Stage {
        self.spec.stage
    }

    /// Kind of the underlying template.
    pub fn kind(&self) -> &EffectKind {
        &self.spec.kind
    }

    // On the hidden side of the window the owner is not visible at all; on
    // the far side the effect's influence is complete and the base state
    // renders untouched.
    fn gate(&self, t: Tick) -> Gate {
        let Epoch { begin, end } = self.epoch;
        match self.spec.stage {
            Stage::Intro if t >= end => Gate::Unaffected,
            Stage::Intro if t < begin => Gate::Hidden,
            Stage::Outro if t <= begin => Gate::Unaffected,
            Stage::Outro if t > end => Gate::Hidden,
            stage => {
                let s = if end <= begin {
                    0.0
                } else {
                    (t - begin) as f64 / (end - begin) as f64
                };
                let s = s.clamp(0.0, 1.0);
                // Intro runs from hidden toward revealed as t increases.
                let s = match stage {
                    Stage::Intro => 1.0 - s,
                    Stage::Outro => s,
                };
                Gate::Active(self.spec.pace.apply(s))
            }
        }
    }

    /// Fold this effect's contribution at `t` into `avatar`.
    ///
    /// `base` is the owner's pristine state; effects compose in attachment
    /// order but each interpolates from the base, never from another
    /// effect's output paint.
    pub(crate) fn sample(&self, base: &Avatar, avatar: &mut Avatar, t: Tick) {
        match self.gate(t) {
            Gate::Unaffected => {}
            Gate::Hidden => {
                avatar.style.stroke = None;
                avatar.style.fill = None;
            }
            Gate::Active(s) => self.apply_kind(base, avatar, s),
        }
    }

    fn apply_kind(&self, base: &Avatar, avatar: &mut Avatar, s: f64) {
        match &self.spec.kind {
            EffectKind::Fade { tools, to } => {
                if tools.stroke
                    && let Some(c0) = base.style.stroke
                {
                    avatar.style.stroke = Some(Rgba8::lerp(&c0, to, s));
                }
                if tools.fill
                    && let Some(c0) = base.style.fill
                {
                    avatar.style.fill = Some(Rgba8::lerp(&c0, to, s));
                }
            }
            EffectKind::Travel { to } => {
                avatar.anchor = <Point as Lerp>::lerp(&base.anchor, to, s);
            }
            EffectKind::Zoom { center, ratio } => {
                let k = f64::lerp(&1.0, ratio, s);
                avatar.scale_about(*center, k, k);
            }
            EffectKind::Spin { center, angle } => {
                let sy = (std::f64::consts::TAU * SPIN_CYCLES * smooth(s)).cos();
                avatar.rotate_about(*center, -angle);
                avatar.scale_about(*center, 1.0, sy);
                avatar.rotate_about(*center, *angle);
            }
            EffectKind::Rise { center, angle } => {
                let sy = smooth(1.0 - s);
                avatar.rotate_about(*center, -angle);
                avatar.scale_about(*center, 1.0, sy);
                avatar.rotate_about(*center, *angle);
            }
            EffectKind::Wring { center, amplitude } => {
                let freq = s * WRING_FREQ;
                avatar.map_absolute_points(|p| {
                    let wave = (std::f64::consts::TAU * (p.x - center.x) * freq).cos();
                    Point::new(p.x, center.y + amplitude * (p.y - center.y) * wave)
                });
            }
            EffectKind::Trace { index } => apply_trace(base, avatar, *index, s),
            composite => {
                tracing::warn!(
                    effect = composite.name(),
                    label = %base.label,
                    "composite effect cannot be sampled on a curve; ignored"
                );
            }
        }
    }
}

// Reveal the vertex window [k0, k1] of the owner's polyline, where the
// window collapses onto the anchor index on the hidden side (s = 1) and
// covers the whole vertex sequence once the effect completes (s = 0).
fn apply_trace(base: &Avatar, avatar: &mut Avatar, index: f64, s: f64) {
    let Some((mut verts, closed)) = polyline_vertices(&base.path) else {
        tracing::warn!(
            label = %base.label,
            "trace effect only supports polygonal curves; ignored"
        );
        return;
    };
    if closed {
        let first = verts[0];
        verts.push(first);
    }

    let last = (verts.len() - 1) as f64;
    let i = index.clamp(0.0, 1.0) * last;
    let k0 = i - (1.0 - s) * i;
    let k1 = i + (1.0 - s) * (last - i);

    let mut pts = vec![point_along(&verts, k0)];
    for (vi, &v) in verts.iter().enumerate() {
        let vi = vi as f64;
        if vi > k0 && vi < k1 {
            pts.push(v);
        }
    }
    pts.push(point_along(&verts, k1));

    let mut path = BezPath::new();
    path.move_to(pts[0]);
    for &p in &pts[1..] {
        path.line_to(p);
    }
    avatar.path = path;
    avatar.style.fill = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::pace::Pace;
    use crate::effects::spec::ToolMask;
    use crate::foundation::core::DrawStyle;
    use kurbo::Shape as _;

    fn square_avatar() -> Avatar {
        let mut path = BezPath::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));
        path.line_to(Point::new(10.0, 10.0));
        path.line_to(Point::new(0.0, 10.0));
        path.close_path();
        Avatar {
            label: "sq".to_owned(),
            anchor: Point::new(100.0, 100.0),
            path,
            style: DrawStyle::default(),
        }
    }

    #[test]
    fn attach_clamps_into_owner_window() {
        let owner = Epoch::new(0, 120);
        let spec = EffectSpec::fade(Stage::Intro).with_duration(24);
        assert_eq!(AttachedEffect::attach(spec, owner).epoch, Epoch::new(0, 24));

        let spec = EffectSpec::fade(Stage::Outro).with_duration(24);
        assert_eq!(
            AttachedEffect::attach(spec, owner).epoch,
            Epoch::new(96, 120)
        );

        let spec = EffectSpec::fade(Stage::Intro).with_duration(500);
        assert_eq!(AttachedEffect::attach(spec, owner).epoch, Epoch::new(0, 120));
    }

    #[test]
    fn resync_preserves_stage_relative_offset() {
        let old = Epoch::new(0, 100);
        let spec = EffectSpec::fade(Stage::Intro).delayed(10).with_duration(20);
        let mut eff = AttachedEffect::attach(spec, old);
        assert_eq!(eff.epoch, Epoch::new(10, 30));

        eff.resync(old, Epoch::new(50, 150));
        assert_eq!(eff.epoch, Epoch::new(60, 80));
    }

    #[test]
    fn outro_resync_clamps_both_bounds() {
        let old = Epoch::new(0, 100);
        let spec = EffectSpec::fade(Stage::Outro).with_duration(20);
        let mut eff = AttachedEffect::attach(spec, old);
        assert_eq!(eff.epoch, Epoch::new(80, 100));

        // Shrinking the owner below the effect duration clamps the whole
        // window into the new interval.
        eff.resync(old, Epoch::new(0, 10));
        assert_eq!(eff.epoch, Epoch::new(0, 10));
    }

    #[test]
    fn intro_gate_boundaries() {
        let owner = Epoch::new(0, 120);
        let spec = EffectSpec::fade(Stage::Intro).delayed(10).with_duration(20);
        let eff = AttachedEffect::attach(spec, owner);

        let base = square_avatar();

        // Before the window: hidden side.
        let mut a = base.clone();
        eff.sample(&base, &mut a, 9);
        assert!(a.style.stroke.is_none());

        // After the window: untouched.
        let mut a = base.clone();
        eff.sample(&base, &mut a, 30);
        assert_eq!(a.style.stroke, base.style.stroke);
    }

    #[test]
    fn outro_gate_boundaries() {
        let owner = Epoch::new(0, 100);
        let spec = EffectSpec::fade(Stage::Outro).with_duration(20);
        let eff = AttachedEffect::attach(spec, owner);

        let base = square_avatar();

        // At or before the window begin: untouched.
        let mut a = base.clone();
        eff.sample(&base, &mut a, 80);
        assert_eq!(a.style.stroke, base.style.stroke);

        // Inside: fading.
        let mut a = base.clone();
        eff.sample(&base, &mut a, 90);
        let faded = a.style.stroke.unwrap();
        assert!(faded.a < 255);
    }

    #[test]
    fn fade_skips_tools_without_base_paint() {
        let owner = Epoch::new(0, 100);
        let spec = EffectSpec::fade_to(Stage::Intro, ToolMask::BOTH, Rgba8::BLACK);
        let eff = AttachedEffect::attach(spec, owner);

        let base = square_avatar(); // default style: no fill
        let mut a = base.clone();
        eff.sample(&base, &mut a, 10);
        assert!(a.style.fill.is_none());
        assert!(a.style.stroke.is_some());
    }

    #[test]
    fn trace_rejects_non_polyline() {
        let owner = Epoch::new(0, 100);
        let spec = EffectSpec::trace(Stage::Intro, 0.5);
        let eff = AttachedEffect::attach(spec, owner);

        let mut base = square_avatar();
        base.path = kurbo::Circle::new(Point::ORIGIN, 5.0).to_path(0.1);
        let mut a = base.clone();
        eff.sample(&base, &mut a, 10);
        assert_eq!(a.path.elements().len(), base.path.elements().len());
        assert!(a.style.fill.is_none() || a.style.fill == base.style.fill);
    }

    #[test]
    fn trace_reveals_full_polyline_when_complete() {
        let owner = Epoch::new(0, 100);
        // Sample just before the intro window closes so the gate is still
        // active with s approaching 0.
        let spec = EffectSpec::trace(Stage::Intro, 0.0)
            .with_duration(100)
            .with_pace(Pace::Linear);
        let eff = AttachedEffect::attach(spec, owner);

        let base = square_avatar();
        let mut a = base.clone();
        eff.sample(&base, &mut a, 99);
        // 4 original vertices (+ closing vertex) survive, fill is dropped.
        assert!(a.path.elements().len() >= 5);
        assert!(a.style.fill.is_none());
    }
}
