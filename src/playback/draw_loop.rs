use crate::engine::backend::{ProgramId, RenderEngine, RunVars};
use crate::foundation::core::Canvas;
use crate::foundation::error::PlaycastResult;
use crate::playback::pending::{PendingChanges, StateChange};
use crate::playback::surface::Surface;
use crate::playback::telemetry::{TelemetryRing, TelemetrySample};
use crate::timeline::clock::{FrameVars, Timeline};
use std::time::Instant;

/// Samples kept by the draw loop's telemetry ring.
const TELEMETRY_CAPACITY: usize = 240;

/// What a tick did, and whether another one is wanted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// A frame was rendered and uploaded.
    pub rendered: bool,
    /// The loop wants another tick at the next refresh opportunity.
    pub reschedule: bool,
}

/// The continuous-rendering scheduler.
///
/// Owns the single live program, the display surface and the timeline. One
/// call to [`DrawLoop::on_tick`] is one display refresh opportunity: pending
/// state changes are applied atomically first, then one frame is rendered,
/// uploaded and accounted for. The frame region returned by the engine is
/// always consumed before the tick returns; it is never held across ticks.
pub struct DrawLoop<E: RenderEngine, S: Surface> {
    engine: E,
    surface: Option<S>,
    timeline: Timeline,
    pending: PendingChanges,
    telemetry: TelemetryRing,
    program: Option<ProgramId>,
    next_program_id: u32,
    render_size: Canvas,
    pending_resize: Option<Canvas>,
    visible: bool,
}

impl<E: RenderEngine, S: Surface> DrawLoop<E, S> {
    /// Create a draw loop around `engine`, paused, with no surface bound.
    pub fn new(engine: E, now: f64) -> Self {
        Self {
            engine,
            surface: None,
            timeline: Timeline::new(now),
            pending: PendingChanges::new(),
            telemetry: TelemetryRing::new(TELEMETRY_CAPACITY),
            program: None,
            next_program_id: 0,
            render_size: Canvas {
                width: 1,
                height: 1,
            },
            pending_resize: None,
            visible: true,
        }
    }

    /// Bind a display surface, replacing (and releasing) any previous one.
    ///
    /// The resize to `size` is recorded as pending and applied on the next
    /// tick, immediately before the upload.
    pub fn register(&mut self, surface: S, size: Canvas) {
        // Dropping the old surface releases the rendering context bound to it.
        self.surface = Some(surface);
        self.render_size = size;
        self.pending.queue_resize(size);
    }

    /// Whether a surface is currently bound.
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Read access to the bound surface, if any.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Queue a state change for the next tick.
    pub fn queue(&mut self, change: StateChange) {
        self.pending.merge(change);
    }

    /// Read access to the timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutable access to the timeline, for paused-only actions (step/reset).
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    /// Mutable access to the engine, used by an export job sharing this
    /// instance's capability.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Destructively drain the telemetry ring.
    pub fn drain_telemetry(&mut self) -> (u64, Vec<TelemetrySample>) {
        self.telemetry.drain()
    }

    /// Drain engine log lines.
    pub fn flush_logs(&mut self) -> Vec<String> {
        self.engine.flush_logs()
    }

    /// Engine-side resource accounting.
    pub fn memory_stats(&self) -> crate::engine::backend::MemoryStats {
        self.engine.memory_stats()
    }

    /// Run one tick at wall time `now` (seconds).
    #[tracing::instrument(skip(self))]
    pub fn on_tick(&mut self, now: f64) -> PlaycastResult<TickOutcome> {
        self.apply_pending(now)?;

        let vars = self.timeline.next_frame_vars(now);
        let playing = self.timeline.is_playing();

        if !self.visible {
            // Time keeps advancing while hidden so nothing jumps when
            // visibility returns, but no pixels are produced.
            return Ok(TickOutcome {
                rendered: false,
                reschedule: playing,
            });
        }

        let Some(program) = self.program else {
            return Ok(TickOutcome {
                rendered: false,
                reschedule: playing,
            });
        };

        // The telemetry sample covers render, copy-out and upload only;
        // applying pending changes (compiles, resizes) is not render time.
        let started = Instant::now();
        let Some(region) = self.engine.run(program, self.run_vars(vars))? else {
            tracing::debug!(frame = vars.frame, "transient render failure, tick skipped");
            return Ok(TickOutcome {
                rendered: false,
                reschedule: false,
            });
        };

        // Consumes the region: released exactly once, before the tick returns.
        let pixels = self.engine.copy_out(region)?;

        let Some(surface) = self.surface.as_mut() else {
            // No surface bound yet; the frame is already released above.
            return Ok(TickOutcome {
                rendered: false,
                reschedule: playing,
            });
        };
        if let Some(size) = self.pending_resize.take() {
            // Applied once per tick, right before the upload, so the surface
            // never shows a half-resized frame.
            surface.resize(size)?;
        }
        surface.upload(self.render_size, &pixels)?;

        self.telemetry.push(TelemetrySample {
            frame: vars.frame,
            duration_secs: started.elapsed().as_secs_f64(),
        });

        Ok(TickOutcome {
            rendered: true,
            reschedule: playing,
        })
    }

    /// Release the live program and drop the surface.
    pub fn shutdown(&mut self) -> PlaycastResult<()> {
        if let Some(program) = self.program.take() {
            self.engine.release_program(program)?;
        }
        self.surface = None;
        Ok(())
    }

    fn run_vars(&self, vars: FrameVars) -> RunVars {
        RunVars {
            width: self.render_size.width,
            height: self.render_size.height,
            time: vars.time,
            frame: vars.frame,
            duration: vars.duration,
        }
    }

    fn apply_pending(&mut self, now: f64) -> PlaycastResult<()> {
        let Some(change) = self.pending.take() else {
            return Ok(());
        };

        if let Some(source) = change.program {
            self.swap_program(&source)?;
        }
        if let Some(size) = change.size {
            self.render_size = size;
            self.pending_resize = Some(size);
        }
        if let Some(playing) = change.playing {
            self.timeline.set_playing(playing, now);
        }
        if let Some(speed) = change.speed {
            self.timeline.set_speed(speed);
        }
        if let Some(visible) = change.visible {
            self.visible = visible;
        }
        Ok(())
    }

    // Compile-and-swap: the old program stays live until the replacement
    // compiles, so a bad script never takes down a working preview.
    fn swap_program(&mut self, source: &str) -> PlaycastResult<()> {
        let id = ProgramId(self.next_program_id);
        self.next_program_id += 1;

        match self.engine.compile(id, source) {
            Ok(id) => {
                if let Some(old) = self.program.replace(id) {
                    self.engine.release_program(old)?;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "compile failed, keeping previous program");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/draw_loop.rs"]
mod tests;
