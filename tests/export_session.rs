use scenograph::{
    Canvas, DistributionOrder, EffectSpec, Epoch, ExportOpts, ExportSession, Fps, FrameRgba,
    FrameSink, InMemorySink, Outline, PaintPrim, Point, Rasterizer, Rgba8, Scene, ScenographError,
    ScenographResult, SinkConfig, Stage, Tick, ToolMask,
};

struct CountingRaster {
    calls: u64,
    prims_seen: Vec<usize>,
}

impl CountingRaster {
    fn new() -> Self {
        Self {
            calls: 0,
            prims_seen: Vec::new(),
        }
    }
}

impl Rasterizer for CountingRaster {
    fn rasterize(&mut self, prims: &[PaintPrim], canvas: Canvas) -> ScenographResult<FrameRgba> {
        self.calls += 1;
        self.prims_seen.push(prims.len());
        Ok(FrameRgba::filled(canvas, Rgba8::BLACK))
    }
}

struct FailingSink {
    fail_at: u64,
    pushed: u64,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> ScenographResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _tick: Tick, _frame: &FrameRgba) -> ScenographResult<()> {
        if self.pushed == self.fail_at {
            return Err(ScenographError::pipeline("disk full"));
        }
        self.pushed += 1;
        Ok(())
    }

    fn end(&mut self) -> ScenographResult<()> {
        Ok(())
    }
}

fn demo(scene: &mut Scene) -> scenograph::NodeId {
    let id = scene.add_curve("r", Outline::rect(Point::new(10.0, 10.0), 20.0, 20.0));
    scene.set_span(id, Epoch::new(2, 10));
    id
}

fn opts() -> ExportOpts {
    ExportOpts {
        canvas: Canvas {
            width: 64,
            height: 64,
        },
        fps: Fps::new(24, 1).unwrap(),
    }
}

#[test]
fn export_covers_the_extent_in_increasing_tick_order() {
    let mut scene = Scene::new();
    let id = demo(&mut scene);

    let mut session = ExportSession::new(&scene);
    session.add_root(id);
    assert_eq!(session.time_extent(), Epoch::new(2, 10));

    let mut raster = CountingRaster::new();
    let mut sink = InMemorySink::new();
    let stats = session.run(opts(), &mut raster, &mut sink).unwrap();

    assert_eq!(stats.frames, 8);
    assert_eq!(raster.calls, 8);
    assert_eq!(sink.frames().len(), 8);
    let ticks: Vec<Tick> = sink.frames().iter().map(|(t, _)| *t).collect();
    assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ticks[0], 2);
    assert_eq!(sink.config().unwrap().width, 64);
}

#[test]
fn export_aborts_at_first_sink_failure() {
    let mut scene = Scene::new();
    let id = demo(&mut scene);

    let mut session = ExportSession::new(&scene);
    session.add_root(id);

    let mut raster = CountingRaster::new();
    let mut sink = FailingSink {
        fail_at: 3,
        pushed: 0,
    };
    let err = session.run(opts(), &mut raster, &mut sink).unwrap_err();
    assert!(matches!(err, ScenographError::Pipeline(_)));
    assert_eq!(sink.pushed, 3);
    // No frames were produced past the failure point.
    assert_eq!(raster.calls, 4);
}

#[test]
fn multiple_roots_export_their_union_extent() {
    let mut scene = Scene::new();
    let a = demo(&mut scene);
    let b = scene.add_curve("b", Outline::rect(Point::ORIGIN, 5.0, 5.0));
    scene.set_span(b, Epoch::new(20, 25));

    let mut session = ExportSession::new(&scene);
    session.add_root(a);
    session.add_root(b);
    session.add_root(a); // duplicate, ignored
    assert_eq!(session.time_extent(), Epoch::new(2, 25));

    let mut raster = CountingRaster::new();
    let mut sink = InMemorySink::new();
    let stats = session.run(opts(), &mut raster, &mut sink).unwrap();
    assert_eq!(stats.frames, 23);

    // Ticks in the gap sample to zero primitives but still produce frames.
    assert!(raster.prims_seen.iter().any(|&n| n == 0));
    assert!(raster.prims_seen.iter().any(|&n| n == 1));
}

#[test]
fn empty_session_exports_nothing() {
    let scene = Scene::new();
    let session = ExportSession::new(&scene);
    let mut raster = CountingRaster::new();
    let mut sink = InMemorySink::new();
    let stats = session.run(opts(), &mut raster, &mut sink).unwrap();
    assert_eq!(stats.frames, 0);
    assert_eq!(raster.calls, 0);
}

#[test]
fn staggered_reveal_gates_visibility_over_time() {
    let mut scene = Scene::new();
    let block = scene.add_block("glyphs");
    let mut kids = Vec::new();
    for i in 0..3 {
        let c = scene.add_curve(
            format!("g{i}"),
            Outline::rect(Point::new(12.0 * i as f64, 0.0), 10.0, 10.0),
        );
        scene.add_child(block, c).unwrap();
        kids.push(c);
    }
    for &c in &kids {
        scene.set_span(c, Epoch::new(0, 100));
    }
    scene.add_effects(
        block,
        [EffectSpec::reveal(
            Stage::Intro,
            ToolMask::BOTH,
            DistributionOrder::Ascending,
        )
        .with_duration(48)],
    );

    // D = 48: dt = 12, spread = 12; starts at 0, 12, 24.
    assert_eq!(scene.sample(block, 6).len(), 1);
    assert_eq!(scene.sample(block, 18).len(), 2);
    assert_eq!(scene.sample(block, 40).len(), 3);
}
