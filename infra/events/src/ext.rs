use crate::dispatch::AfterFn;
use crate::key::{Event, EventKey};
use crate::manager::EventManager;
use crate::registry::Unsubscribe;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Typed convenience methods for every [`EventManager`].
///
/// The event type is inferred from the handler or the fired value, so call
/// sites never deal with [`EventKey`] or `dyn Event` directly.
pub trait EventManagerExt: EventManager {
    /// Subscribes `handler` to events of type `E`.
    ///
    /// Only values whose concrete type is exactly `E` reach the handler;
    /// firing a `Box<E>` does not.
    fn subscribe<E, F>(&self, priority: i32, handler: F) -> Unsubscribe
    where
        E: Event,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.subscribe_key(
            EventKey::of::<E>(),
            priority,
            Arc::new(move |event: &mut dyn Event| {
                if let Some(event) = event.downcast_mut::<E>() {
                    handler(event);
                }
            }),
        )
    }

    /// Subscribes `handler` to every fired event, ahead of all type-specific subscribers.
    fn subscribe_any<F>(&self, priority: i32, handler: F) -> Unsubscribe
    where
        F: Fn(&mut dyn Event) + Send + Sync + 'static,
    {
        self.subscribe_key(EventKey::any(), priority, Arc::new(handler))
    }

    /// Fires `event` synchronously. See [`EventManager::fire_dyn`].
    fn fire<E: Event>(&self, event: &mut E) {
        self.fire_dyn(event);
    }

    /// Fires `event` asynchronously. See [`EventManager::fire_async_dyn`].
    fn fire_async<E: Event>(&self, event: E) {
        self.fire_async_dyn(Box::new(event), Vec::new(), None);
    }

    /// Fires `event` asynchronously and runs the `after` callbacks, in
    /// order, on the same unit of work once every handler is done.
    ///
    /// Under panic recovery a failing callback is reported and the ones
    /// after it are skipped. Callbacks of different types can be chained
    /// as boxed closures:
    ///
    /// ```rust
    /// use herald_events::{EventManager, EventManagerExt, Manager};
    ///
    /// struct Upload(Vec<&'static str>);
    ///
    /// let events = Manager::new();
    /// let chain: Vec<Box<dyn FnOnce(&mut Upload) + Send>> = vec![
    ///     Box::new(|u: &mut Upload| u.0.push("indexed")),
    ///     Box::new(|u: &mut Upload| u.0.push("announced")),
    /// ];
    /// events.fire_async_then(Upload(Vec::new()), chain);
    /// events.wait(&[]);
    /// ```
    fn fire_async_then<E, F, I>(&self, event: E, after: I)
    where
        E: Event,
        F: FnOnce(&mut E) + Send + 'static,
        I: IntoIterator<Item = F>,
    {
        let after = after
            .into_iter()
            .map(|callback| -> AfterFn {
                Box::new(move |event: &mut dyn Event| {
                    if let Some(event) = event.downcast_mut::<E>() {
                        callback(event);
                    }
                })
            })
            .collect();
        self.fire_async_dyn(Box::new(event), after, None);
    }

    /// Fires `event` asynchronously and hands it back, with every handler's
    /// mutations applied, through the returned channel.
    ///
    /// The channel closes without a value if the event never completes
    /// (for example on the no-op manager).
    fn fire_async_result<E: Event>(&self, event: E) -> oneshot::Receiver<E> {
        let (tx, rx) = oneshot::channel();
        self.fire_async_dyn(
            Box::new(event),
            Vec::new(),
            Some(Box::new(move |event: Box<dyn Event>| {
                if let Ok(event) = Event::into_any(event).downcast::<E>() {
                    let _ = tx.send(*event);
                }
            })),
        );
        rx
    }
}

impl<M: EventManager + ?Sized> EventManagerExt for M {}
