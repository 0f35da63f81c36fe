//! Logging abstractions
//!
//! Components take a `SharedLogger` rather than writing to a global sink, so
//! the caller decides where resolution warnings end up.

mod traits;
mod noop;
mod console;
mod memory;

pub use traits::{Logger, LogLevel, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use memory::MemoryLogger;
