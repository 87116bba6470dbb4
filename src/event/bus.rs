use parking_lot::Mutex;

use super::{EngineEvent, EventHandler};

/// A simple event bus for broadcasting engine events to registered handlers
pub struct EventBus {
    handlers: Mutex<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.lock().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: impl EventHandler + 'static) {
        self.handlers.lock().push(Box::new(handler));
    }

    /// Emit an event to all registered handlers, in subscription order.
    ///
    /// Handlers must not emit on the same bus.
    pub fn emit(&self, event: EngineEvent) {
        for handler in self.handlers.lock().iter_mut() {
            handler.handle_event(&event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}
