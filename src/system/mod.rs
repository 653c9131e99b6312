//! System-level modules
//!
//! Process-wide setup that is not tied to a request:
//! tracing subscriber initialization and log file rotation.

pub mod logging;

pub use logging::init_logging;
