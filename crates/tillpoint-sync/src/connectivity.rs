//! Connectivity monitor — a shared online/offline flag with change
//! notification.
//!
//! Constructed explicitly and injected into the gateway, replayer, and
//! controller, so tests flip it without patching process globals. The flag
//! is written only by platform-signal glue calling [`ConnectivityState::set_online`];
//! everything else just reads it. Platform "online" signals are optimistic
//! and do not guarantee server reachability; the gateway's fallback handles
//! the gap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Listener = Box<dyn Fn(bool) + Send + Sync>;

struct Inner {
    online: AtomicBool,
    listeners: Mutex<Vec<Listener>>,
}

/// Cheaply cloneable handle to the shared connectivity flag.
#[derive(Clone)]
pub struct ConnectivityState {
    inner: Arc<Inner>,
}

impl ConnectivityState {
    pub fn new(online: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                online: AtomicBool::new(online),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Last known state.
    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    /// Record a platform transition. Listeners are notified only on an
    /// actual change, with no payload beyond the new state.
    pub fn set_online(&self, online: bool) {
        let previous = self.inner.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return;
        }
        tracing::info!(
            "connectivity: {}",
            if online { "online" } else { "offline" }
        );
        if let Ok(listeners) = self.inner.listeners.lock() {
            for listener in listeners.iter() {
                listener(online);
            }
        }
    }

    /// Register a change listener.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.push(Box::new(listener));
        }
    }
}

impl Default for ConnectivityState {
    /// Starts online, matching platform behavior on boot.
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityState")
            .field("online", &self.is_online())
            .finish()
    }
}
