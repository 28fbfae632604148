use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameRgba, FrameSink, SinkConfig};
use crate::foundation::core::Tick;
use crate::foundation::error::{ScenographError, ScenographResult};

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 path.
    pub out_path: PathBuf,
    /// Overwrite an existing output file.
    pub overwrite: bool,
}

/// Return `true` when a usable `ffmpeg` binary is on `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_parent_dir(path: &Path) -> ScenographResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

struct Running {
    child: Child,
    stdin: Option<ChildStdin>,
    frame_len: usize,
}

/// MP4 sink piping raw RGBA frames into the system `ffmpeg` binary.
///
/// The system binary is used intentionally so no native FFmpeg dev
/// headers/libs are required.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    running: Option<Running>,
}

impl FfmpegSink {
    /// Create a sink writing to `opts.out_path`; the encoder process is
    /// spawned in [`FrameSink::begin`].
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            running: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ScenographResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ScenographError::structural(
                "encode width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            // Default settings target yuv420p output for maximum compatibility.
            return Err(ScenographError::structural(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ScenographError::pipeline(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(ScenographError::pipeline(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ScenographError::pipeline(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScenographError::pipeline("failed to open ffmpeg stdin (unexpected)"))?;

        self.running = Some(Running {
            child,
            stdin: Some(stdin),
            frame_len: (cfg.width as usize) * (cfg.height as usize) * 4,
        });
        Ok(())
    }

    fn push_frame(&mut self, _tick: Tick, frame: &FrameRgba) -> ScenographResult<()> {
        let Some(running) = self.running.as_mut() else {
            return Err(ScenographError::pipeline(
                "ffmpeg sink received a frame before begin",
            ));
        };
        if frame.data.len() != running.frame_len {
            return Err(ScenographError::pipeline(format!(
                "frame size mismatch: got {} bytes, expected {}",
                frame.data.len(),
                running.frame_len
            )));
        }
        let Some(stdin) = running.stdin.as_mut() else {
            return Err(ScenographError::pipeline("ffmpeg sink already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            ScenographError::pipeline(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ScenographResult<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };
        drop(running.stdin.take());

        let output = running.child.wait_with_output().map_err(|e| {
            ScenographError::pipeline(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScenographError::pipeline(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
