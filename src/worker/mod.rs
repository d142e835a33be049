//! Message-passing worker boundary.
//!
//! Each engine instance runs in its own thread with a private inbox; the
//! controller and the engine never share mutable memory. All coordination is
//! typed requests in, typed responses out.

/// Engine instance event loop and controller-side handle.
pub mod instance;
/// Request/response message shapes.
pub mod protocol;
