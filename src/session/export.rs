use crate::encode::sink::{FrameRgba, FrameSink, SinkConfig};
use crate::eval::avatar::PaintPrim;
use crate::foundation::core::{Canvas, Epoch, Fps};
use crate::foundation::error::ScenographResult;
use crate::scene::graph::{NodeId, Scene};

/// Rasterization collaborator: paints sampled primitives onto a pixel
/// surface. The engine has no opinion about how.
pub trait Rasterizer {
    /// Rasterize one frame's primitives.
    fn rasterize(&mut self, prims: &[PaintPrim], canvas: Canvas) -> ScenographResult<FrameRgba>;
}

/// Output parameters for one export run.
#[derive(Clone, Copy, Debug)]
pub struct ExportOpts {
    pub canvas: Canvas,
    pub fps: Fps,
}

/// Outcome of a completed export run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportStats {
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Tick extent that was exported.
    pub extent: Epoch,
}

/// Sequential frame-by-frame export driver.
///
/// Samples the registered roots over their union time extent, rasterizes
/// each frame and pushes it to the sink in strictly increasing tick order.
/// A failure at frame `k` aborts the remaining export.
pub struct ExportSession<'a> {
    scene: &'a Scene,
    roots: Vec<NodeId>,
}

impl<'a> ExportSession<'a> {
    /// Create a session over `scene` with no roots registered yet.
    pub fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            roots: Vec::new(),
        }
    }

    /// Register a subtree to export; duplicates are ignored.
    pub fn add_root(&mut self, id: NodeId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    /// Union time extent over the registered roots.
    pub fn time_extent(&self) -> Epoch {
        let mut roots = self.roots.iter();
        let Some(&first) = roots.next() else {
            return Epoch::new(0, 0);
        };
        roots.fold(self.scene.time_extent(first), |acc, &id| {
            acc.union(self.scene.time_extent(id))
        })
    }

    /// Run the export to completion or first failure.
    #[tracing::instrument(skip_all, fields(roots = self.roots.len()))]
    pub fn run(
        &self,
        opts: ExportOpts,
        raster: &mut dyn Rasterizer,
        sink: &mut dyn FrameSink,
    ) -> ScenographResult<ExportStats> {
        let extent = self.time_extent();
        sink.begin(SinkConfig {
            width: opts.canvas.width,
            height: opts.canvas.height,
            fps: opts.fps,
        })?;

        let mut frames = 0u64;
        let mut prims: Vec<PaintPrim> = Vec::new();
        for t in extent.begin..extent.end {
            prims.clear();
            for &root in &self.roots {
                prims.extend(self.scene.sample(root, t));
            }
            let frame = raster.rasterize(&prims, opts.canvas).map_err(|e| {
                tracing::warn!(tick = t, "export aborted by rasterizer failure");
                e
            })?;
            sink.push_frame(t, &frame).map_err(|e| {
                tracing::warn!(tick = t, "export aborted by sink failure");
                e
            })?;
            frames += 1;
        }
        sink.end()?;

        Ok(ExportStats { frames, extent })
    }
}
