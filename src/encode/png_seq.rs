use std::path::PathBuf;

use crate::encode::sink::{FrameRgba, FrameSink, SinkConfig};
use crate::foundation::core::Tick;
use crate::foundation::error::{ScenographError, ScenographResult};

/// Sink writing each frame as a zero-padded PNG file in one directory.
///
/// Filenames follow `{prefix}-{index:05}.png` in push order, so a
/// downstream encoder can consume the sequence with a simple pattern.
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    index: u64,
}

impl PngSequenceSink {
    /// Create a sink writing under `dir` with the given filename prefix.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            index: 0,
        }
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.index
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, _cfg: SinkConfig) -> ScenographResult<()> {
        use anyhow::Context as _;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create frame directory '{}'", self.dir.display()))?;
        self.index = 0;
        Ok(())
    }

    fn push_frame(&mut self, _tick: Tick, frame: &FrameRgba) -> ScenographResult<()> {
        let name = format!("{}-{:05}.png", self.prefix, self.index);
        let path = self.dir.join(name);
        image::save_buffer_with_format(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| {
            ScenographError::pipeline(format!("failed to write '{}': {e}", path.display()))
        })?;
        self.index += 1;
        Ok(())
    }

    fn end(&mut self) -> ScenographResult<()> {
        Ok(())
    }
}
