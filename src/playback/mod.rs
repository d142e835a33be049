//! Continuous interactive rendering.
//!
//! The draw loop owns the single live program, the display surface and the
//! re-schedule decision. State changes arriving between ticks are coalesced
//! in [`pending::PendingChanges`] and applied atomically at the start of the
//! next tick, so a change is visible starting with the tick after it was
//! queued, never the current one.

/// Draw loop: per-tick draw cycle and program ownership.
pub mod draw_loop;
/// Coalescing queue for state changes arriving between ticks.
pub mod pending;
/// Display surface seam and in-memory surface.
pub mod surface;
/// Per-frame render-duration ring buffer.
pub mod telemetry;
