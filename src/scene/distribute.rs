use crate::animation::pace::Pace;
use crate::effects::spec::{DistributionOrder, EffectKind, EffectSpec, ToolMask};
use crate::foundation::core::{Epoch, Rgba8, Tick, Vec2};
use crate::scene::graph::{NodeId, Scene};

// Each synthesized per-child window is this fraction of the composite span;
// the remainder is the stagger spread.
const REVEAL_FRACTION: Tick = 4;
const TRICKLE_FRACTION: Tick = 8;

impl Scene {
    // Composite effects never land on a block directly: they synthesize one
    // ordinary effect per child, scheduled in stage-relative coordinates so
    // each child's own attachment re-anchors and clamps the window. Simple
    // effects broadcast, with travel/wring centers re-expressed per child.
    pub(crate) fn block_add_effect(&mut self, block: NodeId, spec: EffectSpec) {
        let children = self.children(block).to_vec();
        if children.is_empty() {
            tracing::warn!(
                label = %self.label(block),
                effect = spec.kind.name(),
                "block holds no children; effect dropped"
            );
            return;
        }

        match spec.kind.clone() {
            EffectKind::Fade { .. }
            | EffectKind::Zoom { .. }
            | EffectKind::Spin { .. }
            | EffectKind::Rise { .. }
            | EffectKind::Trace { .. } => {
                for &ch in &children {
                    self.add_effects(ch, [spec.clone()]);
                }
            }
            EffectKind::Travel { to } => {
                let base = self.anchor(block);
                for &ch in &children {
                    let target = to + (self.anchor(ch) - base);
                    let eff = EffectSpec {
                        kind: EffectKind::Travel { to: target },
                        ..spec.clone()
                    };
                    self.add_effects(ch, [eff]);
                }
            }
            EffectKind::Wring { center, amplitude } => {
                let base = self.anchor(block);
                for &ch in &children {
                    let recentered = center + (self.anchor(ch) - base);
                    let eff = EffectSpec {
                        kind: EffectKind::Wring {
                            center: recentered,
                            amplitude,
                        },
                        ..spec.clone()
                    };
                    self.add_effects(ch, [eff]);
                }
            }
            EffectKind::Trickle { separation, order } => {
                self.distribute_trickle(&spec, separation, &order, &children);
            }
            EffectKind::Reveal {
                tools,
                order,
                window,
            } => {
                self.distribute_reveal(&spec, tools, &order, window, &children);
            }
            EffectKind::StrokeThenFill { order } => {
                self.distribute_stroke_then_fill(block, &spec, &order, children.len());
            }
        }
    }

    fn distribute_trickle(
        &mut self,
        spec: &EffectSpec,
        separation: Vec2,
        order: &DistributionOrder,
        children: &[NodeId],
    ) {
        let w = spec.window;
        let dt = (w.len() / TRICKLE_FRACTION).max(1);
        let span = w.len() - dt;
        let n = children.len() as Tick;
        let ranks = resolve_order(order, children.len());

        for (i, &ch) in children.iter().enumerate() {
            let begin = w.begin + (ranks[i] as Tick) * span / n;
            let target = self.anchor(ch) + separation;
            let eff = EffectSpec::new(EffectKind::Travel { to: target }, spec.stage)
                .with_pace(Pace::SoftLanding)
                .with_window(Epoch::new(begin, begin + dt));
            self.add_effects(ch, [eff]);
        }
    }

    fn distribute_reveal(
        &mut self,
        spec: &EffectSpec,
        tools: ToolMask,
        order: &DistributionOrder,
        window: Option<Epoch>,
        children: &[NodeId],
    ) {
        let w = window.unwrap_or(spec.window);
        let dt = (w.len() / REVEAL_FRACTION).max(1);
        let span = w.len() - dt;
        let n = children.len() as Tick;
        let ranks = resolve_order(order, children.len());

        for (i, &ch) in children.iter().enumerate() {
            let begin = w.begin + (ranks[i] as Tick) * span / n;
            let eff = EffectSpec::new(
                EffectKind::Fade {
                    tools,
                    to: Rgba8::TRANSPARENT,
                },
                spec.stage,
            )
            .with_window(Epoch::new(begin, begin + dt));
            self.add_effects(ch, [eff]);
        }
    }

    // Two reveal passes over one shared ordering: the stroke pass covers the
    // first two thirds of the span, the fill pass the last two thirds.
    fn distribute_stroke_then_fill(
        &mut self,
        block: NodeId,
        spec: &EffectSpec,
        order: &DistributionOrder,
        n: usize,
    ) {
        let w = spec.window;
        let d = w.len();
        let ranks = resolve_order(order, n);

        let stroke = EffectSpec::new(
            EffectKind::Reveal {
                tools: ToolMask::STROKE,
                order: DistributionOrder::Explicit(ranks.clone()),
                window: Some(Epoch::new(w.begin, w.begin + 2 * d / 3)),
            },
            spec.stage,
        );
        let fill = EffectSpec::new(
            EffectKind::Reveal {
                tools: ToolMask::FILL,
                order: DistributionOrder::Explicit(ranks),
                window: Some(Epoch::new(w.begin + d / 3, w.begin + d)),
            },
            spec.stage,
        );
        self.block_add_effect(block, stroke);
        self.block_add_effect(block, fill);
    }
}

fn resolve_order(order: &DistributionOrder, n: usize) -> Vec<usize> {
    match order {
        DistributionOrder::Ascending => (0..n).collect(),
        DistributionOrder::Descending => (0..n).rev().collect(),
        DistributionOrder::Explicit(v) => {
            if v.len() == n && is_permutation(v) {
                v.clone()
            } else {
                tracing::warn!(
                    supplied = v.len(),
                    expected = n,
                    "explicit ordering is not a permutation; falling back to insertion order"
                );
                (0..n).collect()
            }
        }
        DistributionOrder::Shuffled { seed } => shuffled(*seed, n),
    }
}

fn is_permutation(v: &[usize]) -> bool {
    let mut seen = vec![false; v.len()];
    v.iter()
        .all(|&i| i < v.len() && !std::mem::replace(&mut seen[i], true))
}

// Seeded Fisher-Yates over an xorshift stream.
fn shuffled(seed: u64, n: usize) -> Vec<usize> {
    let mut v: Vec<usize> = (0..n).collect();
    let mut s = seed | 1;
    for i in (1..n).rev() {
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        let j = (s % (i as u64 + 1)) as usize;
        v.swap(i, j);
    }
    v
}
