use crate::foundation::core::{Canvas, Fps, Rgba8, Tick};
use crate::foundation::error::ScenographResult;

/// Raw straight-alpha RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, row-major RGBA.
    pub data: Vec<u8>,
}

impl FrameRgba {
    /// Frame filled with a single color.
    pub fn filled(canvas: Canvas, color: Rgba8) -> Self {
        let px = [color.r, color.g, color.b, color.a];
        Self {
            width: canvas.width,
            height: canvas.height,
            data: px.repeat((canvas.width as usize) * (canvas.height as usize)),
        }
    }
}

/// Configuration provided to a [`FrameSink`] at the start of an export.
#[derive(Clone, Copy, Debug)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing tick
/// order within the exported extent. A failure aborts the remainder of the
/// export; there is no partial-failure recovery.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ScenographResult<()>;
    /// Push one frame in strictly increasing tick order.
    fn push_frame(&mut self, tick: Tick, frame: &FrameRgba) -> ScenographResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> ScenographResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(Tick, FrameRgba)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(Tick, FrameRgba)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ScenographResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, tick: Tick, frame: &FrameRgba) -> ScenographResult<()> {
        self.frames.push((tick, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ScenographResult<()> {
        Ok(())
    }
}
