//! Frame-timing state machine.
//!
//! [`clock::Timeline`] converts wall-clock queries into `(duration, frame,
//! time)` triples, honoring play/pause, speed and manual stepping. It never
//! reads the system clock itself; callers pass timestamps in, which keeps
//! every transition deterministic and testable.

/// Timeline state machine and frame variables.
pub mod clock;
