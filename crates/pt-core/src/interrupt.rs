//! Process-wide stop flag set by SIGINT/SIGTERM.
//!
//! The monitor loop and frame writer poll [`requested`] at safe points; the
//! handler itself only stores to an atomic.

use std::sync::atomic::{AtomicBool, Ordering};

static STOP: AtomicBool = AtomicBool::new(false);

/// Install handlers for SIGINT and SIGTERM.
pub fn install() {
    #[cfg(unix)]
    unsafe {
        extern "C" fn handle(_sig: libc::c_int) {
            STOP.store(true, Ordering::SeqCst);
        }
        libc::signal(libc::SIGINT, handle as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle as libc::sighandler_t);
    }
    tracing::debug!("Signal handlers installed");
}

/// Whether a stop has been requested.
pub fn requested() -> bool {
    STOP.load(Ordering::SeqCst)
}

/// Request a stop without a signal.
pub fn request() {
    STOP.store(true, Ordering::SeqCst);
}

/// Clear the flag.
pub fn reset() {
    STOP.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_and_reset() {
        reset();
        assert!(!requested());
        request();
        assert!(requested());
        reset();
        assert!(!requested());
    }
}
