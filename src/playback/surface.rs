use crate::foundation::core::Canvas;
use crate::foundation::error::{PlaycastError, PlaycastResult};

/// Display surface consumed by the draw loop.
///
/// Uploads happen synchronously within a tick; the pixel slice is never
/// retained past the call. Resizes are applied at most once per tick,
/// immediately before the upload.
pub trait Surface: Send {
    /// Current surface size.
    fn size(&self) -> Canvas;
    /// Resize the backing store.
    fn resize(&mut self, size: Canvas) -> PlaycastResult<()>;
    /// Copy one frame of straight RGBA8 pixels onto the surface.
    fn upload(&mut self, size: Canvas, pixels: &[u8]) -> PlaycastResult<()>;
}

impl<T: Surface + ?Sized> Surface for Box<T> {
    fn size(&self) -> Canvas {
        (**self).size()
    }

    fn resize(&mut self, size: Canvas) -> PlaycastResult<()> {
        (**self).resize(size)
    }

    fn upload(&mut self, size: Canvas, pixels: &[u8]) -> PlaycastResult<()> {
        (**self).upload(size, pixels)
    }
}

/// In-memory surface for tests and debugging.
#[derive(Clone, Debug)]
pub struct MemorySurface {
    size: Canvas,
    /// Last uploaded frame, if any.
    pub last_frame: Option<Vec<u8>>,
    /// Total uploads performed.
    pub uploads: u64,
    /// Total resizes performed.
    pub resizes: u64,
}

impl MemorySurface {
    /// Create a surface of the given size with no uploaded frame.
    pub fn new(size: Canvas) -> Self {
        Self {
            size,
            last_frame: None,
            uploads: 0,
            resizes: 0,
        }
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> Canvas {
        self.size
    }

    fn resize(&mut self, size: Canvas) -> PlaycastResult<()> {
        self.size = size;
        self.resizes += 1;
        Ok(())
    }

    fn upload(&mut self, size: Canvas, pixels: &[u8]) -> PlaycastResult<()> {
        if pixels.len() != size.byte_len_rgba() {
            return Err(PlaycastError::validation(format!(
                "upload size mismatch: got {} bytes for {}x{}",
                pixels.len(),
                size.width,
                size.height
            )));
        }
        self.size = size;
        self.last_frame = Some(pixels.to_vec());
        self.uploads += 1;
        Ok(())
    }
}
