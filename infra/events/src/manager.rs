use crate::config::ManagerBuilder;
use crate::dispatch::{AfterFn, Dispatcher, FinishFn};
use crate::key::{Event, EventKey};
use crate::registry::{Handler, Registry, Unsubscribe};
use crate::tracker::InFlight;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, warn};

/// Subscribe to, fire, and wait for events.
///
/// This trait is object safe so that the real [`Manager`] and the no-op
/// [`NopManager`](crate::NopManager) can be swapped behind an
/// `Arc<dyn EventManager>`. Typed convenience methods live on
/// [`EventManagerExt`](crate::EventManagerExt).
pub trait EventManager: Send + Sync {
    /// Registers `handler` for events whose key is `key`.
    ///
    /// Higher priorities run first; equal priorities run in registration
    /// order. Handlers should return quickly and hand long-running work
    /// off to their own tasks.
    fn subscribe_key(&self, key: EventKey, priority: i32, handler: Handler) -> Unsubscribe;

    /// Fires `event` on the calling thread and returns after every matching
    /// handler returned. Catch-all subscribers run first, then the
    /// subscribers of the exact key; all of them see the same value, so
    /// mutations made by one are visible to the next.
    fn fire_dyn(&self, event: &mut dyn Event);

    /// Fires `event` on a separate unit of work and returns immediately.
    ///
    /// `after` callbacks run in order once all handlers are done; if one
    /// fails under panic recovery the remaining ones are skipped. `finish`
    /// receives the event only if every callback completed.
    fn fire_async_dyn(&self, event: Box<dyn Event>, after: Vec<AfterFn>, finish: Option<FinishFn>);

    /// Blocks until no firing is running for the given keys, or for any key
    /// if `keys` is empty.
    ///
    /// This is a point-in-time check: new firings may start right after it
    /// returns. Calling it from a handler that it waits for deadlocks.
    fn wait(&self, keys: &[EventKey]);

    /// With no keys, whether any subscription exists. With keys, whether a
    /// catch-all subscriber exists or any of the keys has a subscriber.
    ///
    /// Useful to skip building an expensive event nobody listens to.
    fn has_subscriber(&self, keys: &[EventKey]) -> bool;

    /// Removes every subscriber of the given keys, or of all keys if `keys`
    /// is empty, and returns how many were removed.
    fn unsubscribe_all(&self, keys: &[EventKey]) -> usize;
}

/// Where asynchronous firings run.
#[derive(Debug)]
pub(crate) enum Spawner {
    Runtime { handle: Handle, thread_name: String },
    Thread(String),
}

impl Spawner {
    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        match self {
            Self::Runtime { handle, thread_name } => {
                let unit = Unit { job: Some(Box::new(job)), thread_name: thread_name.clone() };
                drop(handle.spawn_blocking(move || unit.run()));
            },
            Self::Thread(name) => spawn_thread(name, job),
        }
    }
}

fn spawn_thread(name: &str, job: impl FnOnce() + Send + 'static) {
    if let Err(err) = std::thread::Builder::new().name(name.to_owned()).spawn(job) {
        error!(%err, "Failed to spawn event dispatch thread; firing dropped");
    }
}

/// An asynchronous firing handed to a runtime.
///
/// A runtime that is shut down drops blocking tasks without running them.
/// A unit dropped before it ran moves its job to a dedicated thread.
struct Unit {
    job: Option<Box<dyn FnOnce() + Send>>,
    thread_name: String,
}

impl Unit {
    fn run(mut self) {
        if let Some(job) = self.job.take() {
            job();
        }
    }
}

impl Drop for Unit {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            warn!(thread = %self.thread_name, "Runtime unavailable; running event firing on a dedicated thread");
            spawn_thread(&self.thread_name, job);
        }
    }
}

#[derive(Debug)]
struct ManagerInner {
    registry: Arc<Registry>,
    in_flight: Arc<InFlight>,
    dispatcher: Dispatcher,
    spawner: Spawner,
}

impl ManagerInner {
    fn fire(&self, event: &mut dyn Event) -> EventKey {
        let key = EventKey::of_val(&*event);
        let (any, exact) = self.registry.lists_for_dispatch(key);
        self.dispatcher.dispatch(key, event, any.as_ref(), exact.as_ref());
        key
    }
}

/// The event manager.
///
/// Cheap to clone; clones share subscribers and in-flight tracking.
///
/// # Example
///
/// ```rust
/// use herald_events::{EventManagerExt, Manager};
///
/// struct Greeting(String);
///
/// let events = Manager::new();
/// events.subscribe(1, |g: &mut Greeting| g.0.push_str(", hello"));
/// events.subscribe(0, |g: &mut Greeting| g.0.push('!'));
///
/// let mut greeting = Greeting("world".to_owned());
/// events.fire(&mut greeting);
/// assert_eq!(greeting.0, "world, hello!");
/// ```
#[derive(Clone)]
pub struct Manager {
    inner: Arc<ManagerInner>,
}

impl Manager {
    /// Creates a manager with default settings: panic recovery on,
    /// diagnostics discarded.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a manager.
    #[must_use]
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::default()
    }

    pub(crate) fn from_parts(dispatcher: Dispatcher, spawner: Spawner) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                registry: Registry::new(),
                in_flight: InFlight::new(),
                dispatcher,
                spawner,
            }),
        }
    }

    /// Async flavour of [`EventManager::wait`] for callers on a Tokio runtime.
    pub async fn quiesce(&self, keys: &[EventKey]) {
        if keys.is_empty() {
            self.inner.in_flight.wait_async().await;
            return;
        }
        for tracker in self.inner.registry.in_flight_for(keys) {
            tracker.wait_async().await;
        }
    }

    /// Number of firings currently running, synchronous and asynchronous.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.active()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("in_flight", &self.in_flight())
            .field("spawner", &self.inner.spawner)
            .finish_non_exhaustive()
    }
}

impl EventManager for Manager {
    fn subscribe_key(&self, key: EventKey, priority: i32, handler: Handler) -> Unsubscribe {
        self.inner.registry.subscribe(key, priority, handler)
    }

    fn fire_dyn(&self, event: &mut dyn Event) {
        let _in_flight = InFlight::enter(&self.inner.in_flight);
        self.inner.fire(event);
    }

    fn fire_async_dyn(&self, event: Box<dyn Event>, after: Vec<AfterFn>, finish: Option<FinishFn>) {
        let in_flight = InFlight::enter(&self.inner.in_flight);
        let inner = Arc::clone(&self.inner);
        let mut event = event;

        self.inner.spawner.spawn(move || {
            let _in_flight = in_flight;
            let key = inner.fire(&mut *event);
            if inner.dispatcher.run_after(key, &mut *event, after)
                && let Some(finish) = finish
            {
                finish(event);
            }
        });
    }

    fn wait(&self, keys: &[EventKey]) {
        if keys.is_empty() {
            self.inner.in_flight.wait();
            return;
        }
        for tracker in self.inner.registry.in_flight_for(keys) {
            tracker.wait();
        }
    }

    fn has_subscriber(&self, keys: &[EventKey]) -> bool {
        self.inner.registry.has_subscriber(keys)
    }

    fn unsubscribe_all(&self, keys: &[EventKey]) -> usize {
        self.inner.registry.unsubscribe_all(keys)
    }
}
