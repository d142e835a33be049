use crate::engine::backend::MemoryStats;
use crate::export::encoder::VideoEncoder;
use crate::export::pipeline::{CancelToken, ExportParams};
use crate::foundation::core::Canvas;
use crate::playback::pending::StateChange;
use crate::playback::surface::Surface;
use crate::playback::telemetry::TelemetrySample;

/// Request/response action kinds, correlated by a caller-assigned id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ActionKind {
    /// Drain engine log lines.
    FetchLogs,
    /// Drain the telemetry ring.
    FetchResourceUsage,
    /// Step one frame forward (paused only).
    StepNext,
    /// Step one frame back (paused only).
    StepPrevious,
    /// Rewind playback to frame zero.
    ResetPlayback,
    /// Liveness check; answered promptly even under load.
    Ping,
    /// Engine-side resource accounting.
    DumpMemoryStats,
}

/// Payload of a successful action response.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ActionPayload {
    /// Log lines drained from the engine.
    Logs(Vec<String>),
    /// Telemetry batch drained from the draw loop.
    ResourceUsage {
        /// Monotonically increasing batch identifier.
        batch: u64,
        /// Samples, oldest first.
        samples: Vec<TelemetrySample>,
    },
    /// Engine resource accounting.
    MemoryStats(MemoryStats),
    /// Answer to [`ActionKind::Ping`].
    Pong,
    /// Acknowledgement carrying no data.
    Done,
}

/// Inbound message to an engine instance.
pub enum Request {
    /// Bring the instance up; answered with [`Response::InitOk`].
    Init,
    /// Bind a display surface of the given size.
    Register {
        /// The surface to draw onto.
        surface: Box<dyn Surface>,
        /// Initial surface size.
        size: Canvas,
    },
    /// Queue a state change for the next tick (queue-and-coalesce).
    State(StateChange),
    /// An action answered exactly once via [`Response::ActionResult`].
    Action {
        /// Caller-assigned correlation id.
        request_id: u64,
        /// What to do.
        kind: ActionKind,
    },
    /// Run one export job to completion on this instance.
    VideoExport {
        /// Job parameters.
        params: ExportParams,
        /// Encoder/muxer chosen by the controller.
        encoder: Box<dyn VideoEncoder>,
        /// Cooperative cancellation flag held by the controller.
        cancel: CancelToken,
    },
    /// Tear the instance down; answered with [`Response::ShutdownComplete`].
    Shutdown,
}

/// Outbound message from an engine instance.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// The instance is ready for state changes and actions.
    InitOk,
    /// Answer to exactly one [`Request::Action`].
    ActionResult {
        /// Correlation id from the request.
        request_id: u64,
        /// Payload, or an explicit failure description (never a dropped
        /// request).
        result: Result<ActionPayload, String>,
    },
    /// Throttled export progress, strictly increasing frame counts.
    VideoProgress {
        /// Frames completed so far.
        frames: u64,
    },
    /// The export finished; the muxed container bytes.
    VideoFinished {
        /// Muxed output.
        data: Vec<u8>,
    },
    /// The export failed or was cancelled; no partial output.
    VideoError {
        /// Failure description.
        message: String,
    },
    /// Acknowledges [`Request::Shutdown`]; the channel is inert afterwards.
    ShutdownComplete,
}
