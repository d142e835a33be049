use crate::foundation::error::PlaycastResult;

/// Opaque identity of a compiled program inside the rendering engine.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ProgramId(pub u32);

/// Per-run inputs consumed by a single render call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunVars {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Program time in seconds.
    pub time: f64,
    /// Frame counter (fractional during speed changes).
    pub frame: f64,
    /// Duration of this frame in seconds.
    pub duration: f64,
}

/// A lease on one frame's pixel memory, owned by the rendering engine.
///
/// Regions are move-only and consumed exactly once, by
/// [`RenderEngine::copy_out`] or [`RenderEngine::release`]. Double release is
/// therefore unrepresentable in safe code; a region that is dropped without
/// being consumed leaks engine memory and shows up in
/// [`RenderEngine::memory_stats`].
#[derive(Debug, PartialEq, Eq)]
pub struct FrameRegion {
    /// Engine-assigned region identity (native offset in the original module).
    pub id: u64,
    /// Length of the pixel data in bytes.
    pub byte_len: usize,
}

/// One frame of straight RGBA8 pixels copied out of the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, row-major RGBA.
    pub data: Vec<u8>,
}

/// Engine-side resource accounting, surfaced through `DumpMemoryStats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryStats {
    /// Programs compiled and not yet released.
    pub live_programs: u64,
    /// Frame regions issued by `run` and not yet consumed.
    pub live_regions: u64,
    /// Total `run` calls served.
    pub runs: u64,
}

/// The rendering engine capability consumed by the draw loop and the export
/// pipeline.
///
/// One engine value backs one engine instance and is only ever touched from
/// that instance's thread, so methods take `&mut self` and no locking exists
/// at this seam.
pub trait RenderEngine {
    /// Compile `source` into a program registered under `id`.
    ///
    /// Returns [`crate::PlaycastError::Compile`] when the source is rejected.
    fn compile(&mut self, id: ProgramId, source: &str) -> PlaycastResult<ProgramId>;

    /// Produce one frame of pixels.
    ///
    /// `Ok(None)` signals a transient render failure: the caller skips the
    /// frame (draw loop) or aborts the job (export pipeline).
    fn run(&mut self, program: ProgramId, vars: RunVars) -> PlaycastResult<Option<FrameRegion>>;

    /// Copy a region's pixels out of engine memory, consuming (releasing) it.
    fn copy_out(&mut self, region: FrameRegion) -> PlaycastResult<Vec<u8>>;

    /// Release a region without reading it.
    ///
    /// Presenting a region the engine does not consider outstanding is a
    /// [`crate::PlaycastError::Protocol`] error, reported, never swallowed.
    fn release(&mut self, region: FrameRegion) -> PlaycastResult<()>;

    /// Release a compiled program.
    fn release_program(&mut self, program: ProgramId) -> PlaycastResult<()>;

    /// Drain log lines accumulated by the engine since the last call.
    fn flush_logs(&mut self) -> Vec<String>;

    /// Current resource accounting.
    fn memory_stats(&self) -> MemoryStats;
}
