mod bus;
mod events;

pub use bus::EventBus;
pub use events::EngineEvent;

/// Receives every event emitted on an [`EventBus`].
///
/// Closures taking `&EngineEvent` are handlers too.
pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &EngineEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&EngineEvent) + Send,
{
    fn handle_event(&mut self, event: &EngineEvent) {
        self(event)
    }
}
