use crate::foundation::error::{PlaycastError, PlaycastResult};

/// Rational frames-per-second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator, must be > 0.
    pub den: u32,
}

impl Fps {
    /// Validating constructor.
    pub fn new(num: u32, den: u32) -> PlaycastResult<Self> {
        if den == 0 {
            return Err(PlaycastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PlaycastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number helper for the common integer rates (12/24/30/60/90).
    pub fn whole(fps: u32) -> PlaycastResult<Self> {
        Self::new(fps, 1)
    }

    /// The rate as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Seconds spanned by `frames` whole frames.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }
}

/// Pixel dimensions of a surface or output stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Validating constructor.
    pub fn new(width: u32, height: u32) -> PlaycastResult<Self> {
        if width == 0 || height == 0 {
            return Err(PlaycastError::validation(
                "Canvas width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Byte length of one RGBA8 frame at this size.
    pub fn byte_len_rgba(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
