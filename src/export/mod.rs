//! Offline video export.
//!
//! The export pipeline reuses the same compile/run primitive as the draw
//! loop, but against a constant frame duration derived from the configured
//! frame rate: no wall clock enters the frame math, so output is
//! bit-reproducible for a given script and configuration.

/// Encoder configuration, trait seam and in-memory encoder.
pub mod encoder;
/// `ffmpeg`-based encoder (WebM output via the system `ffmpeg` binary).
pub mod ffmpeg;
/// The one-shot export job state machine.
pub mod pipeline;
