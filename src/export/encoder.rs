use crate::engine::backend::PixelFrame;
use crate::foundation::core::Fps;
use crate::foundation::error::{PlaycastError, PlaycastResult};

/// Video codec requested for an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// AV1 (libaom).
    Av1,
    /// VP8 (libvpx).
    Vp8,
    /// VP9 (libvpx-vp9).
    Vp9,
}

/// How the bitrate parameter is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitrateMode {
    /// Constant bitrate.
    Constant,
    /// Variable bitrate, `bitrate` is the target average.
    Variable,
    /// Constant-quality mode, `bitrate` is the quantizer value.
    Quantizer,
}

/// Chroma subsampling of the encoded stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ChromaSubsampling {
    /// 4:2:0.
    #[serde(rename = "420")]
    S420,
    /// 4:4:4.
    #[serde(rename = "444")]
    S444,
}

/// Encoder configuration for one export job.
///
/// Validated, and checked against [`VideoEncoder::supports`], before any
/// frame is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoEncoderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate (12/24/30/60/90 are the typical values).
    pub fps: u32,
    /// Bitrate in bits per second, or the quantizer value in
    /// [`BitrateMode::Quantizer`] mode.
    pub bitrate: u32,
    /// Bitrate interpretation.
    pub bitrate_mode: BitrateMode,
    /// Codec.
    pub codec: VideoCodec,
    /// Chroma subsampling.
    pub subsampling: ChromaSubsampling,
}

impl VideoEncoderConfig {
    /// Check internal consistency of the configuration.
    pub fn validate(&self) -> PlaycastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PlaycastError::validation(
                "export width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(PlaycastError::validation("export fps must be non-zero"));
        }
        if self.subsampling == ChromaSubsampling::S420
            && (self.width % 2 != 0 || self.height % 2 != 0)
        {
            return Err(PlaycastError::validation(
                "export width/height must be even for 4:2:0 output",
            ));
        }
        if self.bitrate == 0 {
            return Err(PlaycastError::validation("export bitrate must be non-zero"));
        }
        Ok(())
    }

    /// Frame duration in seconds implied by `fps`.
    pub fn frame_duration_secs(&self) -> f64 {
        Fps {
            num: self.fps,
            den: 1,
        }
        .frame_duration_secs()
    }
}

/// Encoder/muxer contract consumed by the export pipeline.
///
/// Calls arrive in strictly increasing timestamp order: `begin` once, then
/// `encode` per frame with periodic `flush`es, then one final `flush` and
/// `finish`. `finish` delivers the complete muxed container; after it, the
/// encoder is spent.
pub trait VideoEncoder: Send {
    /// Whether this encoder can handle `cfg` at all.
    fn supports(&self, cfg: &VideoEncoderConfig) -> bool;
    /// Start an encode with the given configuration.
    fn begin(&mut self, cfg: &VideoEncoderConfig) -> PlaycastResult<()>;
    /// Encode one frame at `timestamp` seconds; `keyframe` requests a frame
    /// decodable without reference to prior frames.
    fn encode(&mut self, frame: &PixelFrame, timestamp: f64, keyframe: bool) -> PlaycastResult<()>;
    /// Force all buffered output to be emitted before continuing.
    fn flush(&mut self) -> PlaycastResult<()>;
    /// Finalize the container and return the muxed bytes.
    fn finish(&mut self) -> PlaycastResult<Vec<u8>>;
}

/// In-memory encoder for tests and debugging.
///
/// Records the call sequence (frame count, keyframe indices, flush count)
/// and "muxes" a tiny tagged buffer so callers can assert on a non-empty,
/// deterministic result.
#[derive(Debug, Default)]
pub struct MemoryEncoder {
    cfg: Option<VideoEncoderConfig>,
    /// Indices of frames encoded so far.
    pub frames: u64,
    /// Frame indices that were marked as keyframes.
    pub keyframes: Vec<u64>,
    /// Number of flush calls received.
    pub flushes: u64,
    finished: bool,
}

impl MemoryEncoder {
    const MAGIC: &'static [u8; 4] = b"PCV0";

    /// Create an idle in-memory encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured by `begin`, if any.
    pub fn config(&self) -> Option<VideoEncoderConfig> {
        self.cfg
    }
}

impl VideoEncoder for MemoryEncoder {
    fn supports(&self, _cfg: &VideoEncoderConfig) -> bool {
        true
    }

    fn begin(&mut self, cfg: &VideoEncoderConfig) -> PlaycastResult<()> {
        cfg.validate()?;
        self.cfg = Some(*cfg);
        self.frames = 0;
        self.keyframes.clear();
        self.flushes = 0;
        self.finished = false;
        Ok(())
    }

    fn encode(
        &mut self,
        frame: &PixelFrame,
        _timestamp: f64,
        keyframe: bool,
    ) -> PlaycastResult<()> {
        let Some(cfg) = &self.cfg else {
            return Err(PlaycastError::encode("encode before begin"));
        };
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(PlaycastError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if keyframe {
            self.keyframes.push(self.frames);
        }
        self.frames += 1;
        Ok(())
    }

    fn flush(&mut self) -> PlaycastResult<()> {
        self.flushes += 1;
        Ok(())
    }

    fn finish(&mut self) -> PlaycastResult<Vec<u8>> {
        if self.finished {
            return Err(PlaycastError::encode("encoder is already finalized"));
        }
        self.finished = true;
        let mut out = Self::MAGIC.to_vec();
        out.extend_from_slice(&self.frames.to_le_bytes());
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/encoder.rs"]
mod tests;
