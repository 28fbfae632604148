use clap::{Parser, Subcommand};

use scenograph::{
    Cardinal, DistributionOrder, EffectSpec, Epoch, NodeId, Outline, Point, Rgba8, Scene, Stage,
    ToolMask, Vec2,
};

#[derive(Parser, Debug)]
#[command(name = "scenograph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the timing tree of the built-in demo scene.
    Report,
    /// Dump the demo scene's paint primitives at one tick as JSON.
    Sample(SampleArgs),
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Tick to sample.
    #[arg(long)]
    tick: i64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (scene, roots) = demo_scene()?;
    match cli.cmd {
        Command::Report => cmd_report(&scene, &roots),
        Command::Sample(args) => cmd_sample(&scene, &roots, args),
    }
}

// A small scene exercising the main authoring surface: a traced ring, a
// traveling marker, and a staggered reveal over a block of bars.
fn demo_scene() -> anyhow::Result<(Scene, Vec<NodeId>)> {
    let mut scene = Scene::new();

    let ring = scene.add_curve(
        "ring",
        Outline::regular_polygon(Point::new(320.0, 240.0), 90.0, 48),
    );
    scene.set_stroke(ring, Some(Rgba8::rgb(120, 220, 140)));
    scene.set_span(ring, Epoch::new(0, 144));
    scene.add_effects(ring, [EffectSpec::trace(Stage::Intro, 0.25).with_duration(48)]);

    let marker = scene.add_curve("marker", Outline::dot(Point::new(60.0, 60.0), 8.0));
    scene.set_fill(marker, Some(Rgba8::WHITE));
    scene.set_span(marker, Epoch::new(24, 144));
    scene.add_effects(
        marker,
        [
            EffectSpec::fade(Stage::Intro).with_duration(24),
            EffectSpec::travel(Stage::Outro, Point::new(600.0, 420.0)).with_duration(48),
        ],
    );

    let bars = scene.add_block("bars");
    for i in 0..4 {
        let bar = scene.add_curve(
            format!("bar{i}"),
            Outline::rect(Point::new(80.0 + 70.0 * i as f64, 360.0), 50.0, 24.0),
        );
        scene.set_fill(bar, Some(Rgba8::rgb(200, 180, 90)));
        scene.set_duration(bar, 30);
        scene.add_child(bars, bar)?;
    }
    // Let the bars share the block window so the reveal spreads over them.
    let kids = scene.children(bars).to_vec();
    for bar in kids {
        scene.set_span(bar, Epoch::new(0, 120));
    }
    scene.add_effects(
        bars,
        [EffectSpec::reveal(
            Stage::Intro,
            ToolMask::BOTH,
            DistributionOrder::Descending,
        )
        .with_duration(96)],
    );
    scene.translate(bars, Vec2::new(0.0, -20.0));

    Ok((scene, vec![ring, marker, bars]))
}

fn cmd_report(scene: &Scene, roots: &[NodeId]) -> anyhow::Result<()> {
    for &root in roots {
        print_tree(scene, root, 0);
    }
    Ok(())
}

fn print_tree(scene: &Scene, id: NodeId, depth: usize) {
    let indent = "  ".repeat(depth);
    let epoch = scene.epoch(id);
    let kind = match scene.container_kind(id) {
        None => "curve",
        Some(scenograph::ContainerKind::Free) => "group",
        Some(scenograph::ContainerKind::Sequenced) => "block",
    };
    let anchor = scene.anchor(id);
    println!(
        "{indent}{} [{kind}] {}..{} anchor=({:.0},{:.0}) c=({:.0},{:.0})",
        scene.label(id),
        epoch.begin,
        epoch.end,
        anchor.x,
        anchor.y,
        scene.cardinal_point(id, Cardinal::Center).x,
        scene.cardinal_point(id, Cardinal::Center).y,
    );
    for eff in scene.attached_effects(id) {
        let w = eff.epoch();
        println!(
            "{indent}  ~ {} ({:?}) {}..{}",
            eff.kind().name(),
            eff.stage(),
            w.begin,
            w.end
        );
    }
    for &ch in scene.children(id) {
        print_tree(scene, ch, depth + 1);
    }
}

fn cmd_sample(scene: &Scene, roots: &[NodeId], args: SampleArgs) -> anyhow::Result<()> {
    let mut prims = Vec::new();
    for &root in roots {
        prims.extend(scene.sample(root, args.tick));
    }
    println!("{}", serde_json::to_string_pretty(&prims)?);
    Ok(())
}
