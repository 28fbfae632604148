use scenograph::{
    DistributionOrder, EffectKind, EffectSpec, Epoch, NodeId, Outline, Point, Scene, Stage,
    ToolMask, Vec2,
};

fn block_with_children(scene: &mut Scene, n: usize, shared_span: Epoch) -> (NodeId, Vec<NodeId>) {
    let block = scene.add_block("blk");
    let mut kids = Vec::new();
    for i in 0..n {
        let c = scene.add_curve(
            format!("c{i}"),
            Outline::rect(Point::new(30.0 * i as f64, 0.0), 20.0, 20.0),
        );
        scene.add_child(block, c).unwrap();
        kids.push(c);
    }
    // Re-time the chained children onto one shared window so stagger
    // schedules are directly observable.
    for &c in &kids {
        scene.set_span(c, shared_span);
    }
    (block, kids)
}

#[test]
fn block_auto_sequences_unit_children() {
    let mut scene = Scene::new();
    let block = scene.add_block("blk");
    for i in 0..3 {
        let c = scene.add_curve(format!("c{i}"), Outline::rect(Point::ORIGIN, 5.0, 5.0));
        scene.set_duration(c, 1);
        scene.add_child(block, c).unwrap();
    }
    let kids = scene.children(block).to_vec();
    assert_eq!(scene.epoch(kids[0]), Epoch::new(0, 1));
    assert_eq!(scene.epoch(kids[1]), Epoch::new(1, 2));
    assert_eq!(scene.epoch(kids[2]), Epoch::new(2, 3));
    assert_eq!(scene.epoch(block), Epoch::new(0, 3));
}

#[test]
fn reversed_stagger_schedules_children_in_reverse_rank_order() {
    let mut scene = Scene::new();
    let (block, kids) = block_with_children(&mut scene, 4, Epoch::new(0, 200));

    scene.add_effects(
        block,
        [EffectSpec::reveal(
            Stage::Intro,
            ToolMask::BOTH,
            DistributionOrder::Descending,
        )
        .with_duration(48)],
    );

    // D = 48, per-child dt = D/4 = 12, spread = (D - dt) / N = 9.
    let begins: Vec<i64> = kids
        .iter()
        .map(|&c| scene.attached_effects(c)[0].epoch().begin)
        .collect();
    assert_eq!(begins, vec![27, 18, 9, 0]);

    for &c in &kids {
        let w = scene.attached_effects(c)[0].epoch();
        assert_eq!(w.len(), 12);
    }

    // Start ranks are the exact reverse of insertion order: sorted starts
    // are evenly spaced by the declared stagger fraction.
    let mut sorted = begins.clone();
    sorted.sort();
    assert_eq!(sorted, vec![0, 9, 18, 27]);
}

#[test]
fn trickle_distributes_travel_with_narrow_windows() {
    let mut scene = Scene::new();
    let (block, kids) = block_with_children(&mut scene, 4, Epoch::new(0, 200));
    let separation = Vec2::new(0.0, -300.0);

    scene.add_effects(
        block,
        [
            EffectSpec::trickle(Stage::Intro, separation, DistributionOrder::Ascending)
                .with_duration(48),
        ],
    );

    // Trickle windows are an eighth of the composite span.
    for (i, &c) in kids.iter().enumerate() {
        let eff = &scene.attached_effects(c)[0];
        assert_eq!(eff.epoch().len(), 6);
        assert_eq!(eff.epoch().begin, (i as i64) * 42 / 4);

        let EffectKind::Travel { to } = eff.kind() else {
            panic!("trickle must synthesize travel effects");
        };
        assert_eq!(*to, scene.anchor(c) + separation);
    }
}

#[test]
fn outro_composites_anchor_to_owner_ends() {
    let mut scene = Scene::new();
    let (block, kids) = block_with_children(&mut scene, 4, Epoch::new(0, 100));

    scene.add_effects(
        block,
        [EffectSpec::reveal(
            Stage::Outro,
            ToolMask::BOTH,
            DistributionOrder::Ascending,
        )
        .with_duration(48)],
    );

    let windows: Vec<Epoch> = kids
        .iter()
        .map(|&c| scene.attached_effects(c)[0].epoch())
        .collect();

    // The schedule is mirrored into the 48 ticks before the owners' end.
    for (i, w) in windows.iter().enumerate() {
        assert!(w.end <= 100);
        assert!(w.begin >= 52);
        if i > 0 {
            assert!(w.begin > windows[i - 1].begin);
        }
        assert_eq!(scene.attached_effects(kids[i])[0].stage(), Stage::Outro);
    }
}

#[test]
fn stroke_pass_precedes_fill_pass_per_child() {
    let mut scene = Scene::new();
    let (block, kids) = block_with_children(&mut scene, 3, Epoch::new(0, 300));

    scene.add_effects(
        block,
        [EffectSpec::stroke_then_fill(Stage::Intro, DistributionOrder::Ascending)
            .with_duration(96)],
    );

    for &c in &kids {
        let effects = scene.attached_effects(c);
        assert_eq!(effects.len(), 2);

        let EffectKind::Fade { tools: t0, .. } = effects[0].kind() else {
            panic!("expected fade");
        };
        let EffectKind::Fade { tools: t1, .. } = effects[1].kind() else {
            panic!("expected fade");
        };
        assert_eq!(*t0, ToolMask::STROKE);
        assert_eq!(*t1, ToolMask::FILL);
        assert!(effects[0].epoch().begin < effects[1].epoch().begin);
    }
}

#[test]
fn shared_ordering_across_stroke_and_fill_passes() {
    let mut scene = Scene::new();
    let (block, kids) = block_with_children(&mut scene, 4, Epoch::new(0, 300));

    scene.add_effects(
        block,
        [EffectSpec::stroke_then_fill(
            Stage::Intro,
            DistributionOrder::Shuffled { seed: 7 },
        )
        .with_duration(96)],
    );

    // Both passes must use one ordering: the rank offsets agree.
    let stroke_begins: Vec<i64> = kids
        .iter()
        .map(|&c| scene.attached_effects(c)[0].epoch().begin)
        .collect();
    let fill_begins: Vec<i64> = kids
        .iter()
        .map(|&c| scene.attached_effects(c)[1].epoch().begin)
        .collect();
    let deltas: Vec<i64> = stroke_begins
        .iter()
        .zip(&fill_begins)
        .map(|(s, f)| f - s)
        .collect();
    assert!(deltas.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn simple_effects_broadcast_with_recentered_travel() {
    let mut scene = Scene::new();
    let (block, kids) = block_with_children(&mut scene, 3, Epoch::new(0, 100));
    let block_anchor = scene.anchor(block);
    let to = Point::new(400.0, 300.0);

    scene.add_effects(block, [EffectSpec::travel(Stage::Intro, to)]);

    for &c in &kids {
        let eff = &scene.attached_effects(c)[0];
        let EffectKind::Travel { to: target } = eff.kind() else {
            panic!("expected travel");
        };
        assert_eq!(*target, to + (scene.anchor(c) - block_anchor));
    }
}

#[test]
fn composite_on_a_curve_is_dropped_with_no_effect() {
    let mut scene = Scene::new();
    let c = scene.add_curve("c", Outline::rect(Point::ORIGIN, 10.0, 10.0));
    scene.add_effects(
        c,
        [EffectSpec::reveal(
            Stage::Intro,
            ToolMask::BOTH,
            DistributionOrder::Ascending,
        )],
    );
    assert!(scene.attached_effects(c).is_empty());
}

#[test]
fn free_group_broadcasts_and_leaves_reject_composites() {
    let mut scene = Scene::new();
    let a = scene.add_curve("a", Outline::rect(Point::ORIGIN, 10.0, 10.0));
    let g = scene.add_group("g");
    scene.add_child(g, a).unwrap();

    scene.add_effects(g, [EffectSpec::fade(Stage::Intro)]);
    assert_eq!(scene.attached_effects(a).len(), 1);

    // A composite forwarded through a free group still dies at the leaf.
    scene.add_effects(
        g,
        [EffectSpec::trickle(
            Stage::Intro,
            Vec2::new(0.0, -10.0),
            DistributionOrder::Ascending,
        )],
    );
    assert_eq!(scene.attached_effects(a).len(), 1);
}
