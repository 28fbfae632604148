use std::collections::{BTreeMap, BTreeSet};

use crate::effects::apply::AttachedEffect;
use crate::effects::spec::EffectSpec;
use crate::foundation::core::{Cardinal, Cardinals, Epoch, Point, Rect, Tick};
use crate::scene::curve::CurveData;

/// Opaque handle to a node owned by a [`Scene`].
///
/// Ids are created only by `Scene` constructors and stay valid for the
/// scene's lifetime; passing an id to a different scene indexes the wrong
/// arena and is a caller bug.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

/// Container flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    /// Children keep independent time windows; group time-setting applies
    /// uniformly to all leaf descendants.
    Free,
    /// Children are chained in time on insertion and composite effects are
    /// distributed over them.
    Sequenced,
}

pub(crate) struct Node {
    pub(crate) label: String,
    pub(crate) epoch: Epoch,
    pub(crate) masters: Vec<NodeId>,
    pub(crate) anchor: Point,
    pub(crate) cardinals: Cardinals,
    pub(crate) kind: NodeKind,
}

pub(crate) enum NodeKind {
    Leaf(CurveData),
    Collection(CollectionData),
}

pub(crate) struct CollectionData {
    pub(crate) kind: ContainerKind,
    pub(crate) children: Vec<NodeId>,
}

/// Caller-facing time argument: a literal tick, a literal window, or a
/// snapshot of another entity's window.
///
/// References are read at call time, never bound live.
#[derive(Clone, Copy, Debug)]
pub enum TimeRef {
    /// A single tick, treated as a degenerate `[t, t)` window.
    At(Tick),
    /// A literal window.
    Span(Epoch),
    /// Another entity's current window.
    Of(NodeId),
}

impl From<Tick> for TimeRef {
    fn from(t: Tick) -> Self {
        Self::At(t)
    }
}

impl From<Epoch> for TimeRef {
    fn from(e: Epoch) -> Self {
        Self::Span(e)
    }
}

impl From<NodeId> for TimeRef {
    fn from(id: NodeId) -> Self {
        Self::Of(id)
    }
}

/// Counters for aggregate recomputation passes, mostly useful to verify
/// the deferred-update contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Container-epoch recomputation events.
    pub epoch_recomputes: u64,
    /// Container-cardinal recomputation events.
    pub cardinal_recomputes: u64,
}

#[derive(Default)]
struct Pending {
    // Leaf id -> pre-edit epoch, first edit wins.
    saved_epochs: BTreeMap<u32, Epoch>,
    geom_touched: BTreeSet<u32>,
}

/// Arena holding every entity of one animation document.
///
/// All edits go through the scene so that interval and cardinal
/// invariants can ripple both ways: leaf edits re-aggregate ancestors,
/// container edits re-anchor descendants. The graph is kept cycle-free at
/// insertion time; propagation relies on that and carries no cycle guard
/// of its own.
pub struct Scene {
    nodes: Vec<Node>,
    deferred: u32,
    pending: Pending,
    stats: SyncStats,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            deferred: 0,
            pending: Pending::default(),
            stats: SyncStats::default(),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // -------------------- queries --------------------

    /// Number of nodes the arena owns (including unparented ones).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Caller-supplied label.
    pub fn label(&self, id: NodeId) -> &str {
        &self.node(id).label
    }

    /// Current activity window.
    pub fn epoch(&self, id: NodeId) -> Epoch {
        self.node(id).epoch
    }

    /// First/last tick of activity; alias of [`Scene::epoch`] for export
    /// collaborators.
    pub fn time_extent(&self, id: NodeId) -> Epoch {
        self.epoch(id)
    }

    /// Current anchor point.
    pub fn anchor(&self, id: NodeId) -> Point {
        self.node(id).anchor
    }

    /// Containers currently holding this node.
    pub fn masters(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).masters
    }

    /// Direct children (empty for leaves).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Collection(c) => &c.children,
            NodeKind::Leaf(_) => &[],
        }
    }

    /// Container flavor, `None` for leaves.
    pub fn container_kind(&self, id: NodeId) -> Option<ContainerKind> {
        match &self.node(id).kind {
            NodeKind::Collection(c) => Some(c.kind),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Absolute position of one compass point of the bounding box.
    pub fn cardinal_point(&self, id: NodeId, which: Cardinal) -> Point {
        let node = self.node(id);
        node.anchor + node.cardinals.get(which)
    }

    /// Absolute corner points in NW, SW, SE, NE order.
    pub fn corners(&self, id: NodeId) -> [Point; 4] {
        let node = self.node(id);
        node.cardinals.corners().map(|v| node.anchor + v)
    }

    /// Axis-aligned bounding box spanned by the corner points.
    pub fn bounds(&self, id: NodeId) -> Rect {
        let [nw, sw, se, ne] = self.corners(id);
        let mut rect = Rect::from_points(nw, sw);
        rect = rect.union_pt(se);
        rect.union_pt(ne)
    }

    /// Width of the bounding box.
    pub fn width(&self, id: NodeId) -> f64 {
        self.node(id).cardinals.width()
    }

    /// Height of the bounding box.
    pub fn height(&self, id: NodeId) -> f64 {
        self.node(id).cardinals.height()
    }

    /// Aggregate recomputation counters.
    pub fn sync_stats(&self) -> SyncStats {
        self.stats
    }

    /// Attached effects of a leaf (empty for containers, which never own
    /// effects directly).
    pub fn attached_effects(&self, id: NodeId) -> &[AttachedEffect] {
        match &self.node(id).kind {
            NodeKind::Leaf(c) => &c.effects,
            NodeKind::Collection(_) => &[],
        }
    }

    // -------------------- time kernel --------------------

    pub(crate) fn resolve(&self, r: TimeRef) -> Epoch {
        match r {
            TimeRef::At(t) => Epoch::new(t, t),
            TimeRef::Span(e) => e,
            TimeRef::Of(id) => self.epoch(id),
        }
    }

    /// Set the full window.
    pub fn set_span(&mut self, id: NodeId, r: impl Into<TimeRef>) {
        let target = self.resolve(r.into());
        match self.container_kind(id) {
            None => {
                let old = self.epoch(id);
                self.store_leaf_epoch(id, old, target);
            }
            Some(kind) => self.collection_set_span(id, target, kind),
        }
    }

    /// Set the begin time, clamping the end up when crossed.
    pub fn set_begin(&mut self, id: NodeId, r: impl Into<TimeRef>) {
        let target = self.resolve(r.into()).begin;
        match self.container_kind(id) {
            None => self.leaf_set_begin(id, target),
            Some(kind) => self.collection_set_begin(id, target, kind),
        }
    }

    /// Set the end time, clamping the begin down when crossed.
    pub fn set_end(&mut self, id: NodeId, r: impl Into<TimeRef>) {
        let target = self.resolve(r.into()).end;
        match self.container_kind(id) {
            None => self.leaf_set_end(id, target),
            Some(kind) => self.collection_set_end(id, target, kind),
        }
    }

    /// Set the window length, keeping the begin time fixed.
    pub fn set_duration(&mut self, id: NodeId, duration: Tick) {
        match self.container_kind(id) {
            None => self.leaf_set_duration(id, duration),
            Some(kind) => self.collection_set_duration(id, duration, kind),
        }
    }

    /// Shift the window by `dt` ticks.
    pub fn delay(&mut self, id: NodeId, dt: Tick) {
        match self.container_kind(id) {
            None => self.leaf_delay(id, dt),
            Some(kind) => self.collection_delay(id, dt, kind),
        }
    }

    /// Shift the window so it begins at the referent's begin time.
    pub fn shift_to_begin_at(&mut self, id: NodeId, r: impl Into<TimeRef>) {
        let target = self.resolve(r.into()).begin;
        match self.container_kind(id) {
            None => {
                let dt = target - self.epoch(id).begin;
                self.leaf_delay(id, dt);
            }
            Some(kind) => self.collection_shift_to_begin_at(id, target, kind),
        }
    }

    /// Shift the window so it ends at the referent's end time.
    pub fn shift_to_end_at(&mut self, id: NodeId, r: impl Into<TimeRef>) {
        let target = self.resolve(r.into()).end;
        match self.container_kind(id) {
            None => {
                let dt = target - self.epoch(id).end;
                self.leaf_delay(id, dt);
            }
            Some(kind) => self.collection_shift_to_end_at(id, target, kind),
        }
    }

    pub(crate) fn leaf_set_begin(&mut self, id: NodeId, begin: Tick) {
        let old = self.epoch(id);
        let mut end = old.end;
        if end < begin {
            tracing::warn!(
                label = %self.node(id).label,
                begin,
                end,
                "end time precedes new begin time; clamped to begin"
            );
            end = begin;
        }
        self.store_leaf_epoch(id, old, Epoch::new(begin, end));
    }

    pub(crate) fn leaf_set_end(&mut self, id: NodeId, end: Tick) {
        let old = self.epoch(id);
        let mut begin = old.begin;
        if begin > end {
            tracing::warn!(
                label = %self.node(id).label,
                begin,
                end,
                "begin time follows new end time; clamped to end"
            );
            begin = end;
        }
        self.store_leaf_epoch(id, old, Epoch::new(begin, end));
    }

    pub(crate) fn leaf_set_duration(&mut self, id: NodeId, duration: Tick) {
        let duration = if duration < 0 {
            tracing::warn!(
                label = %self.node(id).label,
                duration,
                "negative duration clamped to 0"
            );
            0
        } else {
            duration
        };
        let old = self.epoch(id);
        self.store_leaf_epoch(id, old, Epoch::span(old.begin, duration));
    }

    pub(crate) fn leaf_delay(&mut self, id: NodeId, dt: Tick) {
        let old = self.epoch(id);
        self.store_leaf_epoch(id, old, old.shifted(dt));
    }

    fn store_leaf_epoch(&mut self, id: NodeId, old: Epoch, new: Epoch) {
        self.node_mut(id).epoch = new;
        if self.deferred > 0 {
            self.pending.saved_epochs.entry(id.0).or_insert(old);
        } else {
            self.resync_effects(id, old);
            self.propagate_epochs(id);
        }
    }

    // Re-derive every attached effect's window against the leaf's current
    // epoch, measuring stage offsets against the pre-edit epoch.
    pub(crate) fn resync_effects(&mut self, id: NodeId, old: Epoch) {
        let node = self.node_mut(id);
        let new = node.epoch;
        if let NodeKind::Leaf(curve) = &mut node.kind {
            for eff in &mut curve.effects {
                eff.resync(old, new);
            }
        }
    }

    // Every master re-aggregates, recursively, with no early exit.
    pub(crate) fn propagate_epochs(&mut self, id: NodeId) {
        let masters = self.node(id).masters.clone();
        for m in masters {
            self.recompute_collection_epoch(m);
            self.propagate_epochs(m);
        }
    }

    pub(crate) fn recompute_collection_epoch(&mut self, id: NodeId) {
        let leaves = self.leaf_descendants(id);
        let epoch = match leaves.split_first() {
            None => {
                tracing::warn!(
                    label = %self.node(id).label,
                    "container holds no leaf descendants; epoch collapsed to [0, 0)"
                );
                Epoch::new(0, 0)
            }
            Some((&first, rest)) => rest
                .iter()
                .fold(self.epoch(first), |acc, &l| acc.union(self.epoch(l))),
        };
        self.node_mut(id).epoch = epoch;
        self.stats.epoch_recomputes += 1;
    }

    // -------------------- structure walks --------------------

    /// Leaf descendants, deduplicated (shared nodes count once).
    pub(crate) fn leaf_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        self.walk_leaves(id, &mut seen, &mut out);
        out
    }

    fn walk_leaves(&self, id: NodeId, seen: &mut BTreeSet<u32>, out: &mut Vec<NodeId>) {
        match &self.node(id).kind {
            NodeKind::Leaf(_) => {
                if seen.insert(id.0) {
                    out.push(id);
                }
            }
            NodeKind::Collection(c) => {
                for &ch in &c.children {
                    self.walk_leaves(ch, seen, out);
                }
            }
        }
    }

    /// Transitive container descendants (not including `id` itself).
    pub(crate) fn collection_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for &ch in self.children(id) {
            self.walk_collections(ch, &mut seen, &mut out);
        }
        out
    }

    fn walk_collections(&self, id: NodeId, seen: &mut BTreeSet<u32>, out: &mut Vec<NodeId>) {
        if let NodeKind::Collection(c) = &self.node(id).kind {
            if seen.insert(id.0) {
                out.push(id);
                for &ch in &c.children {
                    self.walk_collections(ch, seen, out);
                }
            }
        }
    }

    fn collection_depth(&self, id: NodeId) -> u32 {
        match &self.node(id).kind {
            NodeKind::Leaf(_) => 0,
            NodeKind::Collection(c) => {
                1 + c
                    .children
                    .iter()
                    .map(|&ch| self.collection_depth(ch))
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    // -------------------- geometry propagation --------------------

    pub(crate) fn after_leaf_geometry(&mut self, id: NodeId) {
        if self.deferred > 0 {
            self.pending.geom_touched.insert(id.0);
        } else {
            self.propagate_cardinals(id);
        }
    }

    pub(crate) fn propagate_cardinals(&mut self, id: NodeId) {
        let masters = self.node(id).masters.clone();
        for m in masters {
            self.recompute_collection_cardinals(m);
            self.propagate_cardinals(m);
        }
    }

    // Containers re-anchor to the NW corner of the box spanned by their
    // children's corners.
    pub(crate) fn recompute_collection_cardinals(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut bbox: Option<Rect> = None;
        for ch in children {
            for p in self.corners(ch) {
                bbox = Some(match bbox {
                    None => Rect::from_points(p, p),
                    Some(r) => r.union_pt(p),
                });
            }
        }
        self.stats.cardinal_recomputes += 1;
        let Some(bbox) = bbox else {
            return;
        };
        let node = self.node_mut(id);
        node.anchor = Point::new(bbox.x0, bbox.y0);
        node.cardinals = Cardinals::from_bounds(bbox, node.anchor);
    }

    // -------------------- deferred scopes --------------------

    /// Open a deferred-update scope; nestable.
    ///
    /// While a scope is open, leaf time/geometry edits record their
    /// pre-edit state instead of cascading. Closing the outermost scope
    /// performs exactly one recomputation pass: effect windows re-derive
    /// once against the recorded baselines, then each affected container
    /// re-aggregates once, children before parents.
    pub fn begin_deferred(&mut self) {
        self.deferred += 1;
    }

    /// Close one deferred-update scope.
    pub fn end_deferred(&mut self) {
        if self.deferred == 0 {
            tracing::warn!("end_deferred without matching begin_deferred; ignored");
            return;
        }
        self.deferred -= 1;
        if self.deferred == 0 {
            self.flush_pending();
        }
    }

    /// Run `f` inside a deferred-update scope.
    pub fn with_deferred<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_deferred();
        let out = f(self);
        self.end_deferred();
        out
    }

    fn flush_pending(&mut self) {
        let saved = std::mem::take(&mut self.pending.saved_epochs);
        let geom = std::mem::take(&mut self.pending.geom_touched);

        for (&raw, &old) in &saved {
            self.resync_effects(NodeId(raw), old);
        }

        let time_affected = self.transitive_masters(saved.keys().copied());
        let geom_affected = self.transitive_masters(geom.iter().copied());

        for id in self.ordered_by_depth(time_affected) {
            self.recompute_collection_epoch(id);
        }
        for id in self.ordered_by_depth(geom_affected) {
            self.recompute_collection_cardinals(id);
        }
    }

    fn transitive_masters(&self, seeds: impl Iterator<Item = u32>) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        let mut stack: Vec<NodeId> = seeds.map(NodeId).collect();
        while let Some(id) = stack.pop() {
            for &m in &self.node(id).masters {
                if out.insert(m.0) {
                    stack.push(m);
                }
            }
        }
        out
    }

    fn ordered_by_depth(&self, set: BTreeSet<u32>) -> Vec<NodeId> {
        let mut v: Vec<NodeId> = set.into_iter().map(NodeId).collect();
        v.sort_by_key(|&id| self.collection_depth(id));
        v
    }

    // -------------------- effects --------------------

    /// Attach effect templates to a leaf, broadcast them through a free
    /// group, or distribute them over a sequenced block.
    pub fn add_effects(&mut self, id: NodeId, specs: impl IntoIterator<Item = EffectSpec>) {
        for spec in specs {
            match self.container_kind(id) {
                None => self.leaf_add_effect(id, spec),
                Some(ContainerKind::Free) => self.group_add_effect(id, spec),
                Some(ContainerKind::Sequenced) => self.block_add_effect(id, spec),
            }
        }
    }

    pub(crate) fn leaf_add_effect(&mut self, id: NodeId, spec: EffectSpec) {
        if spec.kind.is_composite() {
            tracing::warn!(
                effect = spec.kind.name(),
                label = %self.node(id).label,
                "composite effect is only supported on sequenced blocks; dropped"
            );
            return;
        }
        let owner = self.epoch(id);
        if let NodeKind::Leaf(curve) = &mut self.node_mut(id).kind {
            curve.effects.push(AttachedEffect::attach(spec, owner));
        }
    }
}
