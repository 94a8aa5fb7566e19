//! Process-wide mode switches read on every dispatch.

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shutdown flag and global response override.
///
/// Injected into the gateway so independent gateways (and tests) carry
/// independent flags.
#[derive(Debug, Default)]
pub struct GatewayState {
    shutting_down: AtomicBool,
    global_response: ArcSwapOption<String>,
}

impl GatewayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the shutdown flag. Returns true only for the call that flipped it.
    pub fn begin_shutdown(&self) -> bool {
        !self.shutting_down.swap(true, Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Replace the global response override. `None` clears it.
    pub fn set_global_response(&self, body: Option<String>) {
        self.global_response.store(body.map(Arc::new));
    }

    /// Current override body, if any.
    pub fn global_response(&self) -> Option<Arc<String>> {
        self.global_response.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_is_one_way() {
        let state = GatewayState::new();
        assert!(!state.is_shutting_down());
        assert!(state.begin_shutdown());
        assert!(!state.begin_shutdown());
        assert!(state.is_shutting_down());
    }

    #[test]
    fn override_set_and_clear() {
        let state = GatewayState::new();
        assert!(state.global_response().is_none());
        state.set_global_response(Some("Down for maintenance".into()));
        assert_eq!(state.global_response().as_deref().map(String::as_str), Some("Down for maintenance"));
        state.set_global_response(None);
        assert!(state.global_response().is_none());
    }
}
