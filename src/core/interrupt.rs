//! Operator interrupt handling.
//!
//! Ctrl-C flips a [`CancelToken`]; the poller and the sequencer check it at every
//! suspension point. Nothing is rolled back: a run already started on the
//! service keeps going on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit status for an interrupted run (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

static SIGINT_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Route Ctrl-C to a process-wide token and return it.
///
/// The handler is registered on first call only; later calls return the same
/// token. If registration fails the token still works but Ctrl-C keeps the
/// platform default.
pub fn install_sigint_handler() -> CancelToken {
    SIGINT_TOKEN
        .get_or_init(|| {
            let token = CancelToken::new();
            let handler_token = token.clone();
            if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
                log_status!("interrupt", "Could not install Ctrl-C handler: {}", err);
            }
            token
        })
        .clone()
}
