use crate::engine::backend::PixelFrame;
use crate::export::encoder::{
    BitrateMode, ChromaSubsampling, VideoCodec, VideoEncoder, VideoEncoderConfig,
};
use crate::foundation::error::{PlaycastError, PlaycastResult};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

/// Options for [`FfmpegEncoder`] WebM output.
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// Keyframe (GOP) interval in frames.
    ///
    /// Rawvideo piped into `ffmpeg` carries no per-frame keyframe flags, so
    /// the per-frame `keyframe` argument to `encode` is advisory here; the
    /// cadence is enforced through `-g` instead.
    pub keyframe_interval: u32,
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            keyframe_interval: 64,
        }
    }
}

/// Encoder that spawns the system `ffmpeg` and streams raw RGBA frames to
/// its stdin, muxing a WebM container into a temporary file that `finish`
/// reads back as the result buffer.
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    out_tmp: Option<PathBuf>,

    cfg: Option<VideoEncoderConfig>,
}

impl FfmpegEncoder {
    /// Create a new idle encoder.
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            out_tmp: None,
            cfg: None,
        }
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn supports(&self, cfg: &VideoEncoderConfig) -> bool {
        // libvpx VP8 only encodes 4:2:0.
        !(cfg.codec == VideoCodec::Vp8 && cfg.subsampling == ChromaSubsampling::S444)
    }

    fn begin(&mut self, cfg: &VideoEncoderConfig) -> PlaycastResult<()> {
        cfg.validate()?;
        if !self.supports(cfg) {
            return Err(PlaycastError::validation(
                "unsupported codec/subsampling combination",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(PlaycastError::encode(
                "ffmpeg is required for video export, but was not found on PATH",
            ));
        }

        let out_tmp = std::env::temp_dir().join(format!(
            "playcast_export_{}_{}.webm",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
        ]);

        cmd.args(["-c:v", codec_arg(cfg.codec)]);
        cmd.args(["-pix_fmt", pix_fmt_arg(cfg.subsampling)]);
        cmd.args(["-g", &self.opts.keyframe_interval.to_string()]);
        push_bitrate_args(&mut cmd, cfg);
        cmd.args(["-f", "webm"]).arg(&out_tmp);

        let mut child = cmd.spawn().map_err(|e| {
            PlaycastError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PlaycastError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| PlaycastError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.out_tmp = Some(out_tmp);
        self.cfg = Some(*cfg);
        Ok(())
    }

    fn encode(
        &mut self,
        frame: &PixelFrame,
        _timestamp: f64,
        _keyframe: bool,
    ) -> PlaycastResult<()> {
        let Some(cfg) = self.cfg.as_ref() else {
            return Err(PlaycastError::encode("ffmpeg encoder not started"));
        };
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(PlaycastError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != (cfg.width as usize) * (cfg.height as usize) * 4 {
            return Err(PlaycastError::encode(
                "frame data size mismatch with width*height*4",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(PlaycastError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            PlaycastError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn flush(&mut self) -> PlaycastResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(PlaycastError::encode("ffmpeg encoder is already finalized"));
        };
        use std::io::Write as _;
        stdin
            .flush()
            .map_err(|e| PlaycastError::encode(format!("failed to flush ffmpeg stdin: {e}")))
    }

    fn finish(&mut self) -> PlaycastResult<Vec<u8>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| PlaycastError::encode("ffmpeg encoder not started"))?;

        let status = child
            .wait()
            .map_err(|e| PlaycastError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PlaycastError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| PlaycastError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        let out_tmp = TempFileGuard(self.out_tmp.take());
        self.cfg = None;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(PlaycastError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let Some(path) = out_tmp.0.as_ref() else {
            return Err(PlaycastError::encode("ffmpeg output path missing"));
        };
        std::fs::read(path)
            .map_err(|e| PlaycastError::encode(format!("failed to read ffmpeg output: {e}")))
    }
}

impl Drop for FfmpegEncoder {
    // An abandoned export (failed or cancelled before `finish`) must not
    // leave a zombie ffmpeg, a dangling drain thread or a temp file behind.
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        drop(TempFileGuard(self.out_tmp.take()));
    }
}

fn codec_arg(codec: VideoCodec) -> &'static str {
    match codec {
        VideoCodec::Av1 => "libaom-av1",
        VideoCodec::Vp8 => "libvpx",
        VideoCodec::Vp9 => "libvpx-vp9",
    }
}

fn pix_fmt_arg(subsampling: ChromaSubsampling) -> &'static str {
    match subsampling {
        ChromaSubsampling::S420 => "yuv420p",
        ChromaSubsampling::S444 => "yuv444p",
    }
}

fn push_bitrate_args(cmd: &mut Command, cfg: &VideoEncoderConfig) {
    let b = cfg.bitrate.to_string();
    match cfg.bitrate_mode {
        BitrateMode::Constant => {
            cmd.args(["-b:v", &b, "-minrate", &b, "-maxrate", &b]);
        }
        BitrateMode::Variable => {
            cmd.args(["-b:v", &b]);
        }
        BitrateMode::Quantizer => {
            // bitrate carries the quantizer value in this mode.
            cmd.args(["-crf", &b, "-b:v", "0"]);
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/ffmpeg.rs"]
mod tests;
