use crate::engine::backend::{PixelFrame, ProgramId, RenderEngine, RunVars};
use crate::export::encoder::{VideoEncoder, VideoEncoderConfig};
use crate::foundation::error::{PlaycastError, PlaycastResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Frames between forced encoder flushes, bounding internal encoder
/// buffering during long exports.
pub const FLUSH_INTERVAL: u64 = 256;

/// Frames between mandatory keyframes (frame 0 included).
pub const KEYFRAME_INTERVAL: u64 = 64;

/// Minimum wall time between progress callbacks.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Parameters of one export job.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExportParams {
    /// Script source to compile.
    pub source: String,
    /// Engine identity for the compiled program.
    pub program_id: ProgramId,
    /// Number of frames to render and encode.
    pub frame_count: u64,
    /// Encoder configuration.
    pub config: VideoEncoderConfig,
}

/// Phase of an export job. Advances strictly forward; `Finished`, `Failed`
/// and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportPhase {
    /// Compiling the target program.
    Compiling,
    /// Rendering and encoding frames.
    Encoding,
    /// Flushing the encoder and finalizing the container.
    Finalizing,
    /// All frames muxed, result delivered.
    Finished,
    /// Terminated with an error; partial output discarded.
    Failed,
    /// Cancelled between frames.
    Cancelled,
}

/// How an export job ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The muxed container bytes.
    Finished(Vec<u8>),
    /// Error description; no partial file is returned.
    Failed(String),
    /// Cancelled through the job's [`CancelToken`].
    Cancelled,
}

/// Cooperative cancellation flag, checked at every frame boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; a no-op once the job has ended.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One-shot, non-interactive export of a fixed number of frames.
///
/// Frame `N` renders at `time = N * frame_duration` with a constant duration
/// derived from the configured frame rate; no wall-clock timing enters the
/// frame math. The job terminates exactly once and is never resumed.
pub struct ExportJob {
    params: ExportParams,
    phase: ExportPhase,
}

impl ExportJob {
    /// Validate `params` and create a job ready to run.
    ///
    /// Invalid or unsupported configurations are rejected here, before any
    /// frame is rendered.
    pub fn new(params: ExportParams) -> PlaycastResult<Self> {
        params.config.validate()?;
        if params.frame_count == 0 {
            return Err(PlaycastError::validation(
                "export frame_count must be non-zero",
            ));
        }
        Ok(Self {
            params,
            phase: ExportPhase::Compiling,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    /// Drive the job to completion.
    ///
    /// `on_progress` is called with strictly increasing frame counts, at most
    /// every 200 ms of wall time, plus one unconditional final call equal to
    /// the target frame count (skipped only if the very last throttled call
    /// already reported it).
    pub fn run<E: RenderEngine>(
        &mut self,
        engine: &mut E,
        encoder: &mut dyn VideoEncoder,
        cancel: &CancelToken,
        on_progress: impl FnMut(u64),
    ) -> ExportOutcome {
        self.run_serviced(engine, encoder, cancel, on_progress, || {})
    }

    /// Like [`ExportJob::run`], but also calls `service` at every frame
    /// boundary, before the cancellation check.
    ///
    /// The job suspends between frame renders, so a caller that owns a
    /// message inbox can answer urgent traffic mid-export instead of going
    /// silent for the length of the job.
    #[tracing::instrument(skip_all, fields(frames = self.params.frame_count))]
    pub fn run_serviced<E: RenderEngine>(
        &mut self,
        engine: &mut E,
        encoder: &mut dyn VideoEncoder,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(u64),
        mut service: impl FnMut(),
    ) -> ExportOutcome {
        if !encoder.supports(&self.params.config) {
            self.phase = ExportPhase::Failed;
            return ExportOutcome::Failed("unsupported encoder configuration".to_owned());
        }

        let program = match engine.compile(self.params.program_id, &self.params.source) {
            Ok(id) => id,
            Err(e) => {
                self.phase = ExportPhase::Failed;
                return ExportOutcome::Failed(format!("compilation failed: {e}"));
            }
        };

        let outcome = self.encode_frames(
            engine,
            program,
            encoder,
            cancel,
            &mut on_progress,
            &mut service,
        );

        if let Err(e) = engine.release_program(program) {
            tracing::warn!(error = %e, "failed to release export program");
        }

        self.phase = match &outcome {
            ExportOutcome::Finished(_) => ExportPhase::Finished,
            ExportOutcome::Failed(_) => ExportPhase::Failed,
            ExportOutcome::Cancelled => ExportPhase::Cancelled,
        };
        outcome
    }

    fn encode_frames<E: RenderEngine>(
        &mut self,
        engine: &mut E,
        program: ProgramId,
        encoder: &mut dyn VideoEncoder,
        cancel: &CancelToken,
        on_progress: &mut impl FnMut(u64),
        service: &mut impl FnMut(),
    ) -> ExportOutcome {
        let cfg: VideoEncoderConfig = self.params.config;
        let duration = cfg.frame_duration_secs();
        let total = self.params.frame_count;

        if let Err(e) = encoder.begin(&cfg) {
            return ExportOutcome::Failed(e.to_string());
        }
        self.phase = ExportPhase::Encoding;

        let mut last_emit = Instant::now();
        let mut last_reported = 0u64;

        for n in 0..total {
            service();
            if cancel.is_cancelled() {
                return ExportOutcome::Cancelled;
            }

            if n > 0 && n % FLUSH_INTERVAL == 0
                && let Err(e) = encoder.flush()
            {
                return ExportOutcome::Failed(e.to_string());
            }

            let vars = RunVars {
                width: cfg.width,
                height: cfg.height,
                time: (n as f64) * duration,
                frame: n as f64,
                duration,
            };
            let region = match engine.run(program, vars) {
                Ok(Some(region)) => region,
                Ok(None) => {
                    return ExportOutcome::Failed(format!("render failed at frame {n}"));
                }
                Err(e) => return ExportOutcome::Failed(e.to_string()),
            };

            // Copy out and release immediately: the pipeline never holds more
            // than one frame's pixel data.
            let data = match engine.copy_out(region) {
                Ok(data) => data,
                Err(e) => return ExportOutcome::Failed(e.to_string()),
            };
            let frame = PixelFrame {
                width: cfg.width,
                height: cfg.height,
                data,
            };

            let keyframe = n % KEYFRAME_INTERVAL == 0;
            if let Err(e) = encoder.encode(&frame, vars.time, keyframe) {
                return ExportOutcome::Failed(e.to_string());
            }

            let done = n + 1;
            if last_emit.elapsed() >= PROGRESS_INTERVAL && done > last_reported {
                on_progress(done);
                last_reported = done;
                last_emit = Instant::now();
            }
        }

        self.phase = ExportPhase::Finalizing;
        if let Err(e) = encoder.flush() {
            return ExportOutcome::Failed(e.to_string());
        }
        let bytes = match encoder.finish() {
            Ok(bytes) => bytes,
            Err(e) => return ExportOutcome::Failed(e.to_string()),
        };

        if last_reported < total {
            on_progress(total);
        }

        ExportOutcome::Finished(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
