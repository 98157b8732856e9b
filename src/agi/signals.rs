//! Hangup and broken-pipe signal flags for the gateway engine.
//!
//! Asterisk sends SIGHUP when the controlling channel hangs up, and the
//! process receives SIGPIPE when the far side of the stdio pipe goes
//! away. Watcher tasks do nothing but set the corresponding flag; the
//! engine inspects the flags at well-defined points — before each command
//! ([`Agi::test_hangup`](super::Agi::test_hangup)) and after each execute
//! — and [`SignalFlags::clear`] resets them explicitly.

use crate::error::{AgiError, AgiResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::signal::unix::{signal, SignalKind};

/// The pair of single-bit flags the signal watchers mutate
#[derive(Debug, Default)]
pub struct SignalFlags {
    hangup: AtomicBool,
    pipe: AtomicBool,
}

impl SignalFlags {
    pub const fn new() -> Self {
        Self {
            hangup: AtomicBool::new(false),
            pipe: AtomicBool::new(false),
        }
    }

    /// Whether SIGHUP has been received since the last [`clear`](Self::clear)
    pub fn got_hangup(&self) -> bool {
        self.hangup.load(Ordering::SeqCst)
    }

    /// Whether SIGPIPE has been received since the last [`clear`](Self::clear)
    pub fn got_pipe(&self) -> bool {
        self.pipe.load(Ordering::SeqCst)
    }

    /// Clear both flags
    pub fn clear(&self) {
        self.hangup.store(false, Ordering::SeqCst);
        self.pipe.store(false, Ordering::SeqCst);
    }

    pub(crate) fn raise_hangup(&self) {
        self.hangup.store(true, Ordering::SeqCst);
    }

    pub(crate) fn raise_pipe(&self) {
        self.pipe.store(true, Ordering::SeqCst);
    }
}

/// The process-global flags watched by [`install`]
pub fn process_flags() -> &'static Arc<SignalFlags> {
    static FLAGS: OnceLock<Arc<SignalFlags>> = OnceLock::new();
    FLAGS.get_or_init(|| Arc::new(SignalFlags::new()))
}

/// Install the SIGHUP and SIGPIPE watcher tasks over the process flags.
///
/// Idempotent; must run inside a tokio runtime. Failure to register
/// either stream is a construction-time error for the engine.
pub(crate) fn install() -> AgiResult<()> {
    static INSTALLED: AtomicBool = AtomicBool::new(false);
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let result = (|| {
        let hangup = signal(SignalKind::hangup())?;
        let pipe = signal(SignalKind::pipe())?;
        Ok::<_, std::io::Error>((hangup, pipe))
    })();

    let (mut hangup, mut pipe) = match result {
        Ok(streams) => streams,
        Err(e) => {
            INSTALLED.store(false, Ordering::SeqCst);
            return Err(AgiError::SignalSetup(e.to_string()));
        }
    };

    let flags = Arc::clone(process_flags());
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            flags.raise_hangup();
        }
    });

    let flags = Arc::clone(process_flags());
    tokio::spawn(async move {
        while pipe.recv().await.is_some() {
            flags.raise_pipe();
        }
    });

    Ok(())
}
