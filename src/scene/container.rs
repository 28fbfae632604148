use std::collections::BTreeSet;

use crate::effects::spec::EffectSpec;
use crate::foundation::core::{Cardinals, Epoch, Point, Tick, Vec2};
use crate::foundation::error::{ScenographError, ScenographResult};
use crate::scene::graph::{CollectionData, ContainerKind, Node, NodeId, NodeKind, Scene};

impl Scene {
    /// Add an empty free composite: children keep independent windows and
    /// group time-setting applies uniformly to leaf descendants.
    pub fn add_group(&mut self, label: impl Into<String>) -> NodeId {
        self.push_collection(label.into(), ContainerKind::Free)
    }

    /// Add an empty sequenced block: children chain in time on insertion
    /// and composite effects are distributed over them.
    pub fn add_block(&mut self, label: impl Into<String>) -> NodeId {
        self.push_collection(label.into(), ContainerKind::Sequenced)
    }

    fn push_collection(&mut self, label: String, kind: ContainerKind) -> NodeId {
        self.push_node(Node {
            label,
            epoch: Epoch::new(0, 0),
            masters: Vec::new(),
            anchor: Point::ORIGIN,
            cardinals: Cardinals::default(),
            kind: NodeKind::Collection(CollectionData {
                kind,
                children: Vec::new(),
            }),
        })
    }

    /// Insert `child` into `parent`.
    ///
    /// Rejected with a structural error (and no state change) when the
    /// child is already mastered by a sequenced block, is already a direct
    /// child, is the parent itself, or contains the parent among its
    /// transitive container descendants. Sequenced parents additionally
    /// require a masterless child and chain its begin to the previous
    /// child's end.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> ScenographResult<()> {
        let Some(parent_kind) = self.container_kind(parent) else {
            return Err(self.reject(format!(
                "'{}' is not a container and cannot hold children",
                self.label(parent)
            )));
        };
        if parent == child {
            return Err(self.reject(format!("'{}' cannot contain itself", self.label(parent))));
        }
        if self.children(parent).contains(&child) {
            return Err(self.reject(format!(
                "'{}' is already a direct child of '{}'",
                self.label(child),
                self.label(parent)
            )));
        }
        if self
            .masters(child)
            .iter()
            .any(|&m| self.container_kind(m) == Some(ContainerKind::Sequenced))
        {
            return Err(self.reject(format!(
                "'{}' belongs to a sequenced block and cannot be reparented",
                self.label(child)
            )));
        }
        if parent_kind == ContainerKind::Sequenced && !self.masters(child).is_empty() {
            return Err(self.reject(format!(
                "'{}' already has a master and cannot join sequenced block '{}'",
                self.label(child),
                self.label(parent)
            )));
        }
        if self.collection_descendants(child).contains(&parent) {
            return Err(self.reject(format!(
                "inserting '{}' into '{}' would create a cycle",
                self.label(child),
                self.label(parent)
            )));
        }

        if parent_kind == ContainerKind::Sequenced {
            self.sequence_child(parent, child);
        }
        self.link_child(parent, child);
        Ok(())
    }

    fn reject(&self, msg: String) -> ScenographError {
        tracing::warn!("{msg}");
        ScenographError::structural(msg)
    }

    // Chain the child's begin to the previous child's end (block start for
    // the first child). Leaf windows are normalized to their current
    // duration, floored at one tick; container children only shift.
    fn sequence_child(&mut self, block: NodeId, child: NodeId) {
        let begin = self
            .children(block)
            .last()
            .map(|&prev| self.epoch(prev).end)
            .unwrap_or(0);
        if self.container_kind(child).is_none() {
            let d = self.epoch(child).len().max(1);
            self.set_span(child, Epoch::new(0, d));
        }
        self.shift_to_begin_at(child, begin);
    }

    pub(crate) fn link_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).masters.push(parent);
        if let NodeKind::Collection(c) = &mut self.node_mut(parent).kind {
            c.children.push(child);
        }
        self.recompute_collection_epoch(parent);
        self.propagate_epochs(parent);
        self.recompute_collection_cardinals(parent);
        self.propagate_cardinals(parent);
    }

    /// Remove a direct child, dropping the back-reference.
    ///
    /// A node removed from its last master simply becomes unparented; the
    /// scene arena keeps owning its storage.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> ScenographResult<()> {
        let Some(pos) = self.children(parent).iter().position(|&c| c == child) else {
            return Err(self.reject(format!(
                "'{}' is not a direct child of '{}'",
                self.label(child),
                self.label(parent)
            )));
        };
        if let NodeKind::Collection(c) = &mut self.node_mut(parent).kind {
            c.children.remove(pos);
        }
        let masters = &mut self.node_mut(child).masters;
        if let Some(mpos) = masters.iter().position(|&m| m == parent) {
            masters.remove(mpos);
        }
        self.recompute_collection_epoch(parent);
        self.propagate_epochs(parent);
        self.recompute_collection_cardinals(parent);
        self.propagate_cardinals(parent);
        Ok(())
    }

    /// Direct leaves and whole sequenced blocks; free groups are
    /// transparent and recursed through.
    pub(crate) fn standalones(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        self.walk_standalones(id, &mut seen, &mut out);
        out
    }

    fn walk_standalones(&self, id: NodeId, seen: &mut BTreeSet<u32>, out: &mut Vec<NodeId>) {
        for &ch in self.children(id) {
            match self.container_kind(ch) {
                Some(ContainerKind::Free) => self.walk_standalones(ch, seen, out),
                _ => {
                    if seen.insert(ch.0) {
                        out.push(ch);
                    }
                }
            }
        }
    }

    // -------------------- group time-setting --------------------

    pub(crate) fn collection_set_span(&mut self, id: NodeId, target: Epoch, kind: ContainerKind) {
        match kind {
            ContainerKind::Free => self.with_deferred(|s| {
                for st in s.standalones(id) {
                    s.set_span(st, target);
                }
            }),
            ContainerKind::Sequenced => {
                tracing::warn!(
                    label = %self.node(id).label,
                    "set_span is not supported on a sequenced block; shifting begin instead"
                );
                self.collection_shift_to_begin_at(id, target.begin, kind);
            }
        }
    }

    // Sequenced blocks treat bound-setting as a shift of the whole chain so
    // children's relative offsets and durations survive.
    pub(crate) fn collection_set_begin(&mut self, id: NodeId, target: Tick, kind: ContainerKind) {
        match kind {
            ContainerKind::Free => self.with_deferred(|s| {
                for st in s.standalones(id) {
                    s.set_begin(st, target);
                }
            }),
            ContainerKind::Sequenced => {
                let dt = target - self.epoch(id).begin;
                self.collection_delay(id, dt, kind);
            }
        }
    }

    pub(crate) fn collection_set_end(&mut self, id: NodeId, target: Tick, kind: ContainerKind) {
        match kind {
            ContainerKind::Free => self.with_deferred(|s| {
                for st in s.standalones(id) {
                    s.set_end(st, target);
                }
            }),
            ContainerKind::Sequenced => {
                let dt = target - self.epoch(id).end;
                self.collection_delay(id, dt, kind);
            }
        }
    }

    pub(crate) fn collection_set_duration(
        &mut self,
        id: NodeId,
        duration: Tick,
        kind: ContainerKind,
    ) {
        match kind {
            ContainerKind::Free => self.with_deferred(|s| {
                for st in s.standalones(id) {
                    s.set_duration(st, duration);
                }
            }),
            ContainerKind::Sequenced => {
                tracing::warn!(
                    label = %self.node(id).label,
                    "set_duration is not supported on a sequenced block; ignored"
                );
            }
        }
    }

    pub(crate) fn collection_delay(&mut self, id: NodeId, dt: Tick, _kind: ContainerKind) {
        self.with_deferred(|s| {
            for st in s.standalones(id) {
                s.delay(st, dt);
            }
        });
    }

    pub(crate) fn collection_shift_to_begin_at(
        &mut self,
        id: NodeId,
        target: Tick,
        kind: ContainerKind,
    ) {
        match kind {
            ContainerKind::Free => self.with_deferred(|s| {
                for st in s.standalones(id) {
                    s.shift_to_begin_at(st, target);
                }
            }),
            ContainerKind::Sequenced => {
                let dt = target - self.epoch(id).begin;
                self.collection_delay(id, dt, kind);
            }
        }
    }

    pub(crate) fn collection_shift_to_end_at(
        &mut self,
        id: NodeId,
        target: Tick,
        kind: ContainerKind,
    ) {
        match kind {
            ContainerKind::Free => self.with_deferred(|s| {
                for st in s.standalones(id) {
                    s.shift_to_end_at(st, target);
                }
            }),
            ContainerKind::Sequenced => {
                let dt = target - self.epoch(id).end;
                self.collection_delay(id, dt, kind);
            }
        }
    }

    // -------------------- group geometry --------------------

    pub(crate) fn collection_translate(&mut self, id: NodeId, v: Vec2) {
        let kids = self.children(id).to_vec();
        self.with_deferred(|s| {
            for k in kids {
                s.translate(k, v);
            }
        });
    }

    pub(crate) fn collection_scale_about(&mut self, id: NodeId, center: Point, sx: f64, sy: f64) {
        let kids = self.children(id).to_vec();
        self.with_deferred(|s| {
            for k in kids {
                s.scale_about(k, center, sx, sy);
            }
        });
    }

    pub(crate) fn collection_rotate_about(&mut self, id: NodeId, center: Point, angle: f64) {
        let kids = self.children(id).to_vec();
        self.with_deferred(|s| {
            for k in kids {
                s.rotate_about(k, center, angle);
            }
        });
    }

    pub(crate) fn collection_move_to(&mut self, id: NodeId, p: Point) {
        let kind = self.container_kind(id);
        let base = self.anchor(id);
        let kids = self.children(id).to_vec();
        self.with_deferred(|s| {
            for k in kids {
                match kind {
                    Some(ContainerKind::Sequenced) => {
                        let offset = s.anchor(k) - base;
                        s.move_to(k, p + offset);
                    }
                    _ => s.move_to(k, p),
                }
            }
        });
    }

    // -------------------- effects --------------------

    // Free composites forward effects to every child unchanged; leaves
    // reject composite kinds themselves and nested blocks distribute.
    pub(crate) fn group_add_effect(&mut self, id: NodeId, spec: EffectSpec) {
        let kids = self.children(id).to_vec();
        if kids.is_empty() {
            tracing::warn!(
                label = %self.node(id).label,
                effect = spec.kind.name(),
                "container holds no children; effect dropped"
            );
            return;
        }
        for k in kids {
            self.add_effects(k, [spec.clone()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::shapes::Outline;

    fn curve(scene: &mut Scene, label: &str, span: Epoch) -> NodeId {
        let id = scene.add_curve(label, Outline::rect(Point::new(0.0, 0.0), 10.0, 10.0));
        scene.set_span(id, span);
        id
    }

    #[test]
    fn group_epoch_is_union_of_leaf_descendants() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(5, 20));
        let b = curve(&mut scene, "b", Epoch::new(0, 8));
        let g = scene.add_group("g");
        scene.add_child(g, a).unwrap();
        scene.add_child(g, b).unwrap();
        assert_eq!(scene.epoch(g), Epoch::new(0, 20));

        scene.set_end(a, 100);
        assert_eq!(scene.epoch(g), Epoch::new(0, 100));

        scene.remove_child(g, a).unwrap();
        assert_eq!(scene.epoch(g), Epoch::new(0, 8));
    }

    #[test]
    fn nested_edits_ripple_to_the_outermost_master() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(0, 10));
        let inner = scene.add_group("inner");
        let outer = scene.add_group("outer");
        scene.add_child(inner, a).unwrap();
        scene.add_child(outer, inner).unwrap();

        scene.delay(a, 100);
        assert_eq!(scene.epoch(inner), Epoch::new(100, 110));
        assert_eq!(scene.epoch(outer), Epoch::new(100, 110));
    }

    #[test]
    fn self_and_duplicate_insertions_are_rejected() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(0, 10));
        let g = scene.add_group("g");
        assert!(scene.add_child(g, g).is_err());
        scene.add_child(g, a).unwrap();
        assert!(scene.add_child(g, a).is_err());
        assert_eq!(scene.children(g).len(), 1);
        assert_eq!(scene.masters(a).len(), 1);
    }

    #[test]
    fn cycle_insertion_is_rejected_without_mutation() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(0, 10));
        let g1 = scene.add_group("g1");
        let g2 = scene.add_group("g2");
        scene.add_child(g1, g2).unwrap();
        scene.add_child(g2, a).unwrap();

        let g1_children = scene.children(g1).to_vec();
        let g2_masters = scene.masters(g2).to_vec();
        assert!(scene.add_child(g2, g1).is_err());
        assert_eq!(scene.children(g2), &[a]);
        assert_eq!(scene.children(g1), g1_children.as_slice());
        assert_eq!(scene.masters(g2), g2_masters.as_slice());
        assert!(scene.masters(g1).is_empty());
    }

    #[test]
    fn block_members_cannot_be_reparented() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(0, 1));
        let block = scene.add_block("b");
        scene.add_child(block, a).unwrap();

        let g = scene.add_group("g");
        assert!(scene.add_child(g, a).is_err());
        assert!(scene.children(g).is_empty());

        // And blocks only accept masterless children.
        let c = curve(&mut scene, "c", Epoch::new(0, 1));
        scene.add_child(g, c).unwrap();
        let block2 = scene.add_block("b2");
        assert!(scene.add_child(block2, c).is_err());
    }

    #[test]
    fn block_chains_children_end_to_begin() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(0, 1));
        let b = curve(&mut scene, "b", Epoch::new(0, 1));
        let c = curve(&mut scene, "c", Epoch::new(0, 1));
        let block = scene.add_block("blk");
        scene.add_child(block, a).unwrap();
        scene.add_child(block, b).unwrap();
        scene.add_child(block, c).unwrap();

        assert_eq!(scene.epoch(a), Epoch::new(0, 1));
        assert_eq!(scene.epoch(b), Epoch::new(1, 2));
        assert_eq!(scene.epoch(c), Epoch::new(2, 3));
        assert_eq!(scene.epoch(block), Epoch::new(0, 3));
    }

    #[test]
    fn block_chaining_preserves_durations() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(10, 14));
        let b = curve(&mut scene, "b", Epoch::new(3, 10));
        let block = scene.add_block("blk");
        scene.add_child(block, a).unwrap();
        scene.add_child(block, b).unwrap();

        assert_eq!(scene.epoch(a), Epoch::new(0, 4));
        assert_eq!(scene.epoch(b), Epoch::new(4, 11));
    }

    #[test]
    fn free_group_time_setting_is_uniform() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(0, 10));
        let b = curve(&mut scene, "b", Epoch::new(20, 30));
        let g = scene.add_group("g");
        scene.add_child(g, a).unwrap();
        scene.add_child(g, b).unwrap();

        scene.set_begin(g, 5);
        assert_eq!(scene.epoch(a).begin, 5);
        assert_eq!(scene.epoch(b).begin, 5);
    }

    #[test]
    fn block_time_shifts_preserve_offsets() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(0, 2));
        let b = curve(&mut scene, "b", Epoch::new(0, 3));
        let block = scene.add_block("blk");
        scene.add_child(block, a).unwrap();
        scene.add_child(block, b).unwrap();

        scene.set_begin(block, 100);
        assert_eq!(scene.epoch(a), Epoch::new(100, 102));
        assert_eq!(scene.epoch(b), Epoch::new(102, 105));
        assert_eq!(scene.epoch(block), Epoch::new(100, 105));

        scene.shift_to_end_at(block, 205);
        assert_eq!(scene.epoch(a), Epoch::new(200, 202));
        assert_eq!(scene.epoch(b), Epoch::new(202, 205));
    }

    #[test]
    fn batch_translate_recomputes_cardinals_once() {
        let mut scene = Scene::new();
        let g = scene.add_group("g");
        for i in 0..5 {
            let c = curve(&mut scene, &format!("c{i}"), Epoch::new(0, 10));
            scene.add_child(g, c).unwrap();
        }

        let before = scene.sync_stats().cardinal_recomputes;
        scene.translate(g, Vec2::new(10.0, -5.0));
        let after = scene.sync_stats().cardinal_recomputes;
        assert_eq!(after - before, 1);
    }

    #[test]
    fn standalones_flatten_free_groups_but_not_blocks() {
        let mut scene = Scene::new();
        let a = curve(&mut scene, "a", Epoch::new(0, 1));
        let b = curve(&mut scene, "b", Epoch::new(0, 1));
        let c = curve(&mut scene, "c", Epoch::new(0, 1));
        let block = scene.add_block("blk");
        scene.add_child(block, c).unwrap();
        let inner = scene.add_group("inner");
        scene.add_child(inner, b).unwrap();
        let outer = scene.add_group("outer");
        scene.add_child(outer, a).unwrap();
        scene.add_child(outer, inner).unwrap();
        scene.add_child(outer, block).unwrap();

        let st = scene.standalones(outer);
        assert!(st.contains(&a));
        assert!(st.contains(&b));
        assert!(st.contains(&block));
        assert!(!st.contains(&c));
        assert!(!st.contains(&inner));
    }

    #[test]
    fn containers_bound_their_children() {
        let mut scene = Scene::new();
        let a = scene.add_curve("a", Outline::rect(Point::new(0.0, 0.0), 10.0, 10.0));
        let b = scene.add_curve("b", Outline::rect(Point::new(40.0, 20.0), 10.0, 10.0));
        let g = scene.add_group("g");
        scene.add_child(g, a).unwrap();
        scene.add_child(g, b).unwrap();

        assert_eq!(scene.anchor(g), Point::new(0.0, 0.0));
        assert_eq!(scene.bounds(g), kurbo::Rect::new(0.0, 0.0, 50.0, 30.0));

        scene.translate(b, Vec2::new(100.0, 0.0));
        assert_eq!(scene.bounds(g).x1, 150.0);
    }
}
