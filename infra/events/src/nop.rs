use crate::dispatch::{AfterFn, FinishFn};
use crate::key::{Event, EventKey};
use crate::manager::EventManager;
use crate::registry::{Handler, Unsubscribe};

/// An [`EventManager`] that does nothing.
///
/// Subscriptions are ignored, firings run no handler, `wait` returns at
/// once, and the manager never reports subscribers. Handy as a default for
/// components that can optionally publish events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopManager;

/// Shared no-op manager instance.
pub static NOP: NopManager = NopManager;

impl EventManager for NopManager {
    fn subscribe_key(&self, _key: EventKey, _priority: i32, _handler: Handler) -> Unsubscribe {
        Unsubscribe::noop()
    }

    fn fire_dyn(&self, _event: &mut dyn Event) {}

    fn fire_async_dyn(&self, _event: Box<dyn Event>, _after: Vec<AfterFn>, _finish: Option<FinishFn>) {}

    fn wait(&self, _keys: &[EventKey]) {}

    fn has_subscriber(&self, _keys: &[EventKey]) -> bool {
        false
    }

    fn unsubscribe_all(&self, _keys: &[EventKey]) -> usize {
        0
    }
}
