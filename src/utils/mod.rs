//! Generic utility primitives with zero domain knowledge.
//!
//! - `args` - `KEY=VALUE` argument parsing
//! - `text` - Escape-sequence stripping and output line cleanup

pub mod args;
pub mod text;
