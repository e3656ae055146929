//! Client runtime context.
//!
//! The client library needs a one-time initialisation before the first
//! connect and a matching teardown before exit. `Runtime` carries that
//! state explicitly: connections are opened against a runtime, and a
//! runtime whose initialisation failed refuses every connect with a
//! client error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::protocol::transport::Transport;

/// Library state shared by a runtime and every connection opened on it.
///
/// Teardown runs when the last holder lets go, so no session outlives it.
pub(crate) struct Shared {
    transport: Arc<dyn Transport>,
    initialised: bool,
    released: AtomicBool,
}

impl Shared {
    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    fn release(&self) {
        if self.initialised && !self.released.swap(true, Ordering::AcqRel) {
            self.transport.teardown();
            tracing::debug!("client library released");
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.release();
    }
}

/// Initialised client library.
///
/// Connections keep the library alive: teardown happens once the runtime
/// and all connections opened on it are gone.
pub struct Runtime {
    shared: Arc<Shared>,
    left: bool,
}

impl Runtime {
    /// Initialise the client library behind `transport`.
    ///
    /// Never fails: an unsuccessful initialisation is reported by
    /// [`Runtime::is_initialised`] and by every later connect.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let status = transport.init();
        let initialised = status.is_ok();
        if !initialised {
            tracing::warn!(code = status.code(), "client library initialisation failed");
        }
        Self {
            shared: Arc::new(Shared {
                transport,
                initialised,
                released: AtomicBool::new(false),
            }),
            left: false,
        }
    }

    /// True if initialisation succeeded and `leave` has not run.
    pub fn is_initialised(&self) -> bool {
        self.shared.initialised && !self.left
    }

    /// Stop accepting connects and release library-global resources.
    ///
    /// Teardown runs now if no connection is open, otherwise when the
    /// last one is dropped. Safe to call more than once.
    pub fn leave(&mut self) {
        if self.left {
            return;
        }
        self.left = true;
        if Arc::strong_count(&self.shared) == 1 {
            self.shared.release();
        } else {
            tracing::debug!(
                connections = Arc::strong_count(&self.shared) - 1,
                "teardown deferred until open connections are gone"
            );
        }
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("initialised", &self.is_initialised())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::memory::MemoryTransport;

    #[test]
    fn test_leave_runs_teardown_once() {
        let transport = Arc::new(MemoryTransport::new());
        let mut rt = Runtime::new(transport.clone());
        assert!(rt.is_initialised());
        rt.leave();
        rt.leave();
        drop(rt);
        assert_eq!(transport.init_calls(), 1);
        assert_eq!(transport.teardown_calls(), 1);
    }

    #[test]
    fn test_teardown_on_drop() {
        let transport = Arc::new(MemoryTransport::new());
        drop(Runtime::new(transport.clone()));
        assert_eq!(transport.teardown_calls(), 1);
    }

    #[test]
    fn test_failed_init_skips_teardown() {
        let transport = Arc::new(MemoryTransport::new().failing_init());
        let rt = Runtime::new(transport.clone());
        assert!(!rt.is_initialised());
        drop(rt);
        assert_eq!(transport.teardown_calls(), 0);
    }

    #[test]
    fn test_leave_waits_for_open_connections() {
        let transport = Arc::new(MemoryTransport::new());
        let mut rt = Runtime::new(transport.clone());
        let held = rt.shared();
        rt.leave();
        assert!(!rt.is_initialised());
        assert_eq!(transport.teardown_calls(), 0);
        drop(rt);
        assert_eq!(transport.teardown_calls(), 0);
        drop(held);
        assert_eq!(transport.teardown_calls(), 1);
    }

    #[test]
    fn test_independent_contexts() {
        let a = Runtime::new(Arc::new(MemoryTransport::new()));
        let b = Runtime::new(Arc::new(MemoryTransport::new().failing_init()));
        assert!(a.is_initialised());
        assert!(!b.is_initialised());
    }
}
