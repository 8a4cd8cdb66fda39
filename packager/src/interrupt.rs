//! Cooperative cancellation on SIGINT.
//!
//! The signal handler only sets a flag. Long-running stages poll it between
//! units of work and abort with [`PackagerError::Interrupted`], which lets
//! the archive builder drop its temporary file on the way out.

use crate::error::{PackagerError, Result};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cancellation flag polled by build stages.
#[derive(Debug, Default)]
pub struct Interrupt {
    flag: AtomicBool,
}

static GLOBAL: Interrupt = Interrupt::new();

impl Interrupt {
    /// Create a cleared flag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Request cancellation.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Return true once cancellation has been requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`PackagerError::Interrupted`] once cancellation has been
    /// requested.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Interrupted`] when the flag is set.
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            Err(PackagerError::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Return the process-wide flag set by the SIGINT handler.
#[must_use]
pub fn global() -> &'static Interrupt {
    &GLOBAL
}

#[cfg(unix)]
extern "C" fn on_sigint(_signal: libc::c_int) {
    GLOBAL.trigger();
}

/// Route SIGINT to the process-wide flag.
///
/// # Errors
///
/// Returns [`PackagerError::Io`] if the handler cannot be registered.
#[cfg(unix)]
pub fn install() -> Result<()> {
    let handler = on_sigint as extern "C" fn(libc::c_int);
    // SAFETY: the handler only performs an atomic store, which is
    // async-signal-safe.
    let previous = unsafe { libc::signal(libc::SIGINT, handler as libc::sighandler_t) };
    if previous == libc::SIG_ERR {
        return Err(std::io::Error::last_os_error().into());
    }
    debug!("SIGINT handler installed");
    Ok(())
}

/// Signals are not intercepted on this platform.
///
/// # Errors
///
/// Never fails.
#[cfg(not(unix))]
pub fn install() -> Result<()> {
    debug!("SIGINT handling unavailable on this platform");
    Ok(())
}
