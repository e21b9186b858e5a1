/// Macro for prefixed status logging to stderr.
///
/// The orchestrator usually runs inside a task runner that captures stderr,
/// so lines are written whether or not stderr is a terminal.
///
/// Usage:
/// ```ignore
/// log_status!("step", "[{}/{}] {}", index, total, name);
/// log_status!("poll", "Run {}: {}", handle, status);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*))
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `orchestrator::config` instead of `orchestrator::core::config`
pub use core::*;
pub use utils::*;
