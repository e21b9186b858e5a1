//! `KEY=VALUE` argument handling.
//!
//! The task service hands variables to scripts as trailing `KEY=VALUE`
//! arguments, so every subcommand accepts them after its own flags.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Split `KEY=VALUE` arguments into a map. Later duplicates win.
///
/// Only the first `=` separates key from value, so values may contain `=`.
pub fn parse_assignments(args: &[String]) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    let mut rejected = Vec::new();

    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                vars.insert(key.trim().to_string(), value.to_string());
            }
            _ => rejected.push(arg.clone()),
        }
    }

    if !rejected.is_empty() {
        return Err(Error::validation_invalid_argument(
            "assignments",
            "Expected KEY=VALUE arguments",
            None,
            Some(rejected),
        ));
    }

    Ok(vars)
}
