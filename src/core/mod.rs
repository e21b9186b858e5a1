// Public modules
pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod gateway;
pub mod interrupt;
pub mod paths;
pub mod preflight;
pub mod semaphore;
pub mod sequence;

// Internal modules - not part of public API
pub(crate) mod http;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
