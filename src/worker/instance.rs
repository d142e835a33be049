use crate::engine::backend::RenderEngine;
use crate::export::pipeline::{ExportJob, ExportOutcome};
use crate::foundation::error::{PlaycastError, PlaycastResult};
use crate::playback::draw_loop::DrawLoop;
use crate::playback::surface::Surface;
use crate::worker::protocol::{ActionKind, ActionPayload, Request, Response};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Simulated display refresh cadence for self-rescheduled ticks (60 Hz).
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Controller-side handle to one engine instance.
///
/// The instance owns all engine state on its own thread; this handle is the
/// only way to reach it. Dropping the handle tears the instance down. After
/// [`EngineHandle::shutdown`] (or teardown) further sends fail with a
/// protocol error instead of silently vanishing.
pub struct EngineHandle {
    tx: mpsc::Sender<Request>,
    rx: mpsc::Receiver<Response>,
    join: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Spawn a new engine instance around `engine`.
    pub fn spawn<E: RenderEngine + Send + 'static>(engine: E) -> Self {
        let (req_tx, req_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let join = std::thread::spawn(move || run_event_loop(engine, req_rx, resp_tx));
        Self {
            tx: req_tx,
            rx: resp_rx,
            join: Some(join),
        }
    }

    /// Send one request to the instance.
    pub fn send(&self, request: Request) -> PlaycastResult<()> {
        self.tx
            .send(request)
            .map_err(|_| PlaycastError::protocol("engine instance channel is inert"))
    }

    /// Receive the next response, waiting up to `timeout`.
    ///
    /// The controller owns timeout policy: an expired wait here is logged and
    /// the slot freed; a late response is matched (and discarded) by
    /// correlation id, not by arrival.
    pub fn recv_timeout(&self, timeout: Duration) -> PlaycastResult<Response> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => PlaycastError::protocol("response timed out"),
            mpsc::RecvTimeoutError::Disconnected => {
                PlaycastError::protocol("engine instance is gone")
            }
        })
    }

    /// Receive the next response without blocking.
    pub fn try_recv(&self) -> Option<Response> {
        self.rx.try_recv().ok()
    }

    /// Request shutdown and join the instance thread.
    pub fn shutdown(mut self) -> PlaycastResult<()> {
        self.send(Request::Shutdown)?;
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| PlaycastError::protocol("engine instance thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(Request::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Single-threaded event loop: drain every queued message, then tick at the
/// refresh cadence while the draw loop wants rescheduling. State is confined
/// to this function; no locking exists anywhere in the instance.
fn run_event_loop<E: RenderEngine>(
    engine: E,
    rx: mpsc::Receiver<Request>,
    tx: mpsc::Sender<Response>,
) {
    let clock = Instant::now();
    let mut engine = Some(engine);
    let mut dl: Option<DrawLoop<E, Box<dyn Surface>>> = None;
    let mut reschedule = false;
    let mut draw_now = false;
    let mut last_tick = Instant::now() - TICK_INTERVAL;

    'outer: loop {
        let first = if reschedule || draw_now {
            match rx.recv_timeout(TICK_INTERVAL) {
                Ok(req) => Some(req),
                Err(mpsc::RecvTimeoutError::Timeout) => None,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(req) => Some(req),
                Err(_) => break,
            }
        };

        // Apply everything already queued before computing the next frame.
        let mut batch: VecDeque<Request> = first.into_iter().collect();
        while let Ok(req) = rx.try_recv() {
            batch.push_back(req);
        }

        while let Some(req) = batch.pop_front() {
            match req {
                Request::Init => {
                    if dl.is_none() {
                        match engine.take() {
                            Some(engine) => {
                                dl = Some(DrawLoop::new(engine, clock.elapsed().as_secs_f64()));
                            }
                            None => {
                                // Engine capability unavailable: the instance
                                // stays unusable and Init goes unanswered.
                                tracing::warn!("init without an engine capability");
                                continue;
                            }
                        }
                    }
                    if tx.send(Response::InitOk).is_err() {
                        break 'outer;
                    }
                }
                Request::Register { surface, size } => {
                    let Some(dl) = dl.as_mut() else {
                        tracing::warn!("register before init, ignored");
                        continue;
                    };
                    dl.register(surface, size);
                    // One synchronous draw unless a tick is already coming.
                    if !reschedule {
                        draw_now = true;
                    }
                }
                Request::State(change) => {
                    let Some(dl) = dl.as_mut() else {
                        tracing::warn!("state change before init, ignored");
                        continue;
                    };
                    dl.queue(change);
                    // A state change is a draw trigger: it resumes a loop
                    // stalled by a transient render failure.
                    draw_now = true;
                }
                Request::Action { request_id, kind } => {
                    let result = handle_action(&mut dl, kind, &clock, &mut draw_now);
                    let sent = tx.send(Response::ActionResult { request_id, result });
                    if sent.is_err() {
                        break 'outer;
                    }
                }
                Request::VideoExport {
                    params,
                    mut encoder,
                    cancel,
                } => {
                    let Some(dl) = dl.as_mut() else {
                        let _ = tx.send(Response::VideoError {
                            message: "engine not ready".to_owned(),
                        });
                        continue;
                    };
                    let response = match ExportJob::new(params) {
                        Ok(mut job) => {
                            let progress_tx = tx.clone();
                            let mut deferred: Vec<Request> = Vec::new();
                            let outcome = job.run_serviced(
                                dl.engine_mut(),
                                encoder.as_mut(),
                                &cancel,
                                |frames| {
                                    let _ = progress_tx.send(Response::VideoProgress { frames });
                                },
                                || {
                                    // Liveness stays observable mid-export;
                                    // everything else waits until the job
                                    // is done.
                                    while let Ok(req) = rx.try_recv() {
                                        match req {
                                            Request::Action {
                                                request_id,
                                                kind: ActionKind::Ping,
                                            } => {
                                                let _ = tx.send(Response::ActionResult {
                                                    request_id,
                                                    result: Ok(ActionPayload::Pong),
                                                });
                                            }
                                            other => deferred.push(other),
                                        }
                                    }
                                },
                            );
                            batch.extend(deferred);
                            match outcome {
                                ExportOutcome::Finished(data) => Response::VideoFinished { data },
                                ExportOutcome::Failed(message) => Response::VideoError { message },
                                ExportOutcome::Cancelled => Response::VideoError {
                                    message: "export cancelled".to_owned(),
                                },
                            }
                        }
                        Err(e) => Response::VideoError {
                            message: e.to_string(),
                        },
                    };
                    if tx.send(response).is_err() {
                        break 'outer;
                    }
                }
                Request::Shutdown => {
                    let _ = tx.send(Response::ShutdownComplete);
                    break 'outer;
                }
            }
        }

        let due = draw_now || (reschedule && last_tick.elapsed() >= TICK_INTERVAL);
        if due && let Some(dl) = dl.as_mut() {
            draw_now = false;
            last_tick = Instant::now();
            match dl.on_tick(clock.elapsed().as_secs_f64()) {
                Ok(outcome) => reschedule = outcome.reschedule,
                Err(e) => {
                    tracing::warn!(error = %e, "tick failed");
                    reschedule = false;
                }
            }
        }
    }

    if let Some(mut dl) = dl {
        if let Err(e) = dl.shutdown() {
            tracing::warn!(error = %e, "engine teardown failed");
        }
    }
}

fn handle_action<E: RenderEngine>(
    dl: &mut Option<DrawLoop<E, Box<dyn Surface>>>,
    kind: ActionKind,
    clock: &Instant,
    draw_now: &mut bool,
) -> Result<ActionPayload, String> {
    // Liveness must be observable even before init.
    if kind == ActionKind::Ping {
        return Ok(ActionPayload::Pong);
    }

    let Some(dl) = dl.as_mut() else {
        return Err("engine not ready".to_owned());
    };
    if !dl.has_surface() && matches!(kind, ActionKind::StepNext | ActionKind::StepPrevious) {
        return Err("no surface registered".to_owned());
    }

    match kind {
        ActionKind::Ping => Ok(ActionPayload::Pong),
        ActionKind::FetchLogs => Ok(ActionPayload::Logs(dl.flush_logs())),
        ActionKind::FetchResourceUsage => {
            let (batch, samples) = dl.drain_telemetry();
            Ok(ActionPayload::ResourceUsage { batch, samples })
        }
        ActionKind::StepNext => {
            dl.timeline_mut().step_next();
            *draw_now = true;
            Ok(ActionPayload::Done)
        }
        ActionKind::StepPrevious => {
            dl.timeline_mut().step_previous();
            *draw_now = true;
            Ok(ActionPayload::Done)
        }
        ActionKind::ResetPlayback => {
            dl.timeline_mut().reset(clock.elapsed().as_secs_f64());
            *draw_now = true;
            Ok(ActionPayload::Done)
        }
        ActionKind::DumpMemoryStats => Ok(ActionPayload::MemoryStats(dl.memory_stats())),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/worker/instance.rs"]
mod tests;
