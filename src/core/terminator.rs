//! Process termination after fatal records
//!
//! Fatal calls end the process through a [`Terminator`] so tests can observe
//! the request instead of exiting.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Exit code used for fatal records
pub const FATAL_EXIT_CODE: i32 = 1;

pub trait Terminator: Send + Sync {
    /// Called once the fatal record has been written and exported
    fn terminate(&self, code: i32);
}

/// Default terminator: `std::process::exit`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Records termination requests instead of exiting
#[derive(Default)]
pub struct RecordingTerminator {
    terminated: AtomicBool,
    code: AtomicI32,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Exit code of the last request, if any
    pub fn code(&self) -> Option<i32> {
        self.terminated().then(|| self.code.load(Ordering::SeqCst))
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, code: i32) {
        self.code.store(code, Ordering::SeqCst);
        self.terminated.store(true, Ordering::SeqCst);
    }
}

impl fmt::Debug for RecordingTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingTerminator")
            .field("terminated", &self.terminated())
            .finish()
    }
}
