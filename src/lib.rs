//! Playcast renders user-authored pixel programs continuously, and drives an
//! offline frame-by-frame video export from the same rendering primitive.
//!
//! The public API is instance-oriented:
//!
//! - Bring an engine capability ([`RenderEngine`]; tests use [`StubEngine`])
//! - Spawn an [`EngineHandle`] and drive it with [`Request`] messages, or use
//!   [`DrawLoop`] / [`ExportJob`] directly on the current thread
//! - Interactive playback goes through the [`Timeline`] scheduler and a
//!   registered [`Surface`]; exports stream into a [`VideoEncoder`]
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate. Engine-owned frame
//!   memory is lent out as a move-only [`FrameRegion`], consumed exactly
//!   once; double release is unrepresentable, leaks are accountable.
//! - **No shared mutable state**: one engine instance is one thread with a
//!   message inbox; everything else is channels.
//! - **Deterministic exports**: frame time is derived from the configured
//!   frame rate only, never from the wall clock, so a given script and
//!   configuration always produce the same bytes.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Rendering engine capability boundary.
pub mod engine;
/// Offline video export pipeline.
pub mod export;
/// Draw loop, pending state changes, surfaces and telemetry.
pub mod playback;
/// Frame-timing state machine.
pub mod timeline;
/// Message-passing worker boundary.
pub mod worker;

pub use engine::backend::{
    FrameRegion, MemoryStats, PixelFrame, ProgramId, RenderEngine, RunVars,
};
pub use engine::stub::StubEngine;
pub use export::encoder::{
    BitrateMode, ChromaSubsampling, MemoryEncoder, VideoCodec, VideoEncoder, VideoEncoderConfig,
};
pub use export::ffmpeg::{FfmpegEncoder, FfmpegEncoderOpts, is_ffmpeg_on_path};
pub use export::pipeline::{
    CancelToken, ExportJob, ExportOutcome, ExportParams, ExportPhase, FLUSH_INTERVAL,
    KEYFRAME_INTERVAL,
};
pub use foundation::core::{Canvas, Fps};
pub use foundation::error::{PlaycastError, PlaycastResult};
pub use playback::draw_loop::{DrawLoop, TickOutcome};
pub use playback::pending::{PendingChanges, StateChange};
pub use playback::surface::{MemorySurface, Surface};
pub use playback::telemetry::{TelemetryRing, TelemetrySample};
pub use timeline::clock::{
    DEFAULT_CLAMP_FRAMES, DEFAULT_FRAME_DURATION, FrameVars, Timeline,
};
pub use worker::instance::EngineHandle;
pub use worker::protocol::{ActionKind, ActionPayload, Request, Response};
