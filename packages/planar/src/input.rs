//! Input action bindings.

/// Handler invoked when a bound key changes state. The flag is true on press, false on
/// release.
pub type ActionHandler = Box<dyn FnMut(bool) + Send>;

/// Event-driven binding of host input keys to action handlers.
///
/// Generic over the host's key type so it works with whatever event enum the engine emits.
/// The whole map can be disabled, which swallows events without unbinding anything.
pub struct ActionMap<K> {
    enabled: bool,
    bindings: Vec<(K, ActionHandler)>,
}

impl<K: PartialEq> ActionMap<K> {
    pub fn new() -> Self {
        ActionMap { enabled: true, bindings: Vec::new() }
    }

    pub fn bind(&mut self, key: K, handler: ActionHandler) {
        self.bindings.push((key, handler));
    }

    /// Remove all bindings for a key. Returns false if none existed.
    pub fn unbind(&mut self, key: &K) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|(k, _)| k != key);
        self.bindings.len() != before
    }

    /// Dispatch a key event to its handlers. Returns true if any handler ran.
    pub fn handle(&mut self, key: &K, pressed: bool) -> bool {
        if !self.enabled {
            return false;
        }
        let mut handled = false;
        for (k, handler) in &mut self.bindings {
            if k == key {
                handler(pressed);
                handled = true;
            }
        }
        handled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable dispatch. Returns false if already in the requested state, so a
    /// double-disable is a visible soft no-op.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        true
    }
}

impl<K: PartialEq> Default for ActionMap<K> {
    fn default() -> Self {
        ActionMap::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    fn counting_handler(count: &Arc<AtomicU32>) -> ActionHandler {
        let count = count.clone();
        Box::new(move |pressed| {
            if pressed {
                count.fetch_add(1, Ordering::Relaxed);
            }
        })
    }

    #[test]
    fn test_dispatch_runs_bound_handlers() {
        let count = Arc::new(AtomicU32::new(0));
        let mut map = ActionMap::new();
        map.bind("jump", counting_handler(&count));
        assert!(map.handle(&"jump", true));
        assert!(!map.handle(&"left", true));
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_disabled_map_swallows_events() {
        let count = Arc::new(AtomicU32::new(0));
        let mut map = ActionMap::new();
        map.bind("jump", counting_handler(&count));
        assert!(map.set_enabled(false));
        assert!(!map.set_enabled(false));
        assert!(!map.handle(&"jump", true));
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_unbind_is_a_soft_no_op_when_absent() {
        let mut map = ActionMap::<&str>::new();
        assert!(!map.unbind(&"jump"));
        map.bind("jump", Box::new(|_| {}));
        assert!(map.unbind(&"jump"));
        assert!(!map.unbind(&"jump"));
    }
}
