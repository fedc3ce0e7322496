//! Child process plumbing: output capture and shutdown.

pub mod diagnostics;
pub mod shutdown;
pub mod stream;

pub use diagnostics::{DEFAULT_DIAGNOSTIC_LINES, DiagnosticsBuffer, FAILURE_TAIL_LINES};
pub use shutdown::shutdown_child;
pub use stream::spawn_stream_reader;
