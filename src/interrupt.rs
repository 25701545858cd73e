//! SIGINT handling for the logging loop
//!
//! Installs a signal handler that sets a process-wide flag instead of
//! killing the process, so a Ctrl+C lands on the same exit path as any
//! link failure and the log file still gets flushed. The 1 s serial read
//! timeout bounds how long the loop takes to notice the flag.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};

static TRIGGERED: AtomicBool = AtomicBool::new(false);

/// Install the SIGINT handler. On non-Unix platforms this is a no-op and
/// Ctrl+C keeps its default terminate behavior.
pub fn install() -> Result<()> {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGINT, handle_sigint as libc::sighandler_t);
    }

    Ok(())
}

/// Check whether an interrupt has been requested
pub fn triggered() -> bool {
    TRIGGERED.load(Ordering::SeqCst)
}

#[cfg(unix)]
extern "C" fn handle_sigint(_: libc::c_int) {
    TRIGGERED.store(true, Ordering::SeqCst);
}
