//! Rendering engine capability boundary.
//!
//! The engine that turns a compiled program into pixels is consumed here as a
//! trait, never implemented: production binds a native module, tests bind
//! [`stub::StubEngine`]. Frame memory stays owned by the engine and is lent
//! out per run as a move-only [`backend::FrameRegion`].

/// Engine trait, program/region handles and frame types.
pub mod backend;
/// Deterministic in-memory engine for tests and debugging.
pub mod stub;
