use crate::key::{Event, EventKey};
use crate::tracker::InFlight;
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Type-erased event handler.
pub type Handler = Arc<dyn Fn(&mut dyn Event) + Send + Sync>;

/// A registered handler. Identity is the allocation, not the contents.
pub(crate) struct Subscriber {
    pub(crate) priority: i32,
    pub(crate) handler: Handler,
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("priority", &self.priority).finish_non_exhaustive()
    }
}

/// Subscribers of one key, sorted by descending priority (stable on ties).
///
/// Cloning is cheap and yields a snapshot: writers copy the subscriber
/// vector on change, so a clone taken at fire time is never affected by
/// later registrations or removals.
#[derive(Debug, Clone)]
pub(crate) struct SubscriberList {
    pub(crate) subscribers: Arc<Vec<Arc<Subscriber>>>,
    pub(crate) in_flight: Arc<InFlight>,
}

impl SubscriberList {
    fn new(first: Arc<Subscriber>) -> Self {
        Self { subscribers: Arc::new(vec![first]), in_flight: InFlight::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    fn insert(&mut self, subscriber: Arc<Subscriber>) {
        let subscribers = Arc::make_mut(&mut self.subscribers);
        subscribers.push(subscriber);
        subscribers.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Removes `subscriber` by identity. Returns `false` if it is not in the list.
    fn remove(&mut self, subscriber: &Arc<Subscriber>) -> bool {
        let Some(index) = self.subscribers.iter().position(|s| Arc::ptr_eq(s, subscriber)) else {
            return false;
        };
        Arc::make_mut(&mut self.subscribers).remove(index);
        true
    }
}

/// Concurrency-safe mapping from event key to its subscribers.
///
/// Reads take the shared lock, structural writes the exclusive one. A key
/// is present only while it has at least one subscriber.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    lists: RwLock<FxHashMap<EventKey, SubscriberList>>,
}

impl Registry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn subscribe(
        self: &Arc<Self>,
        key: EventKey,
        priority: i32,
        handler: Handler,
    ) -> Unsubscribe {
        let subscriber = Arc::new(Subscriber { priority, handler });
        self.lists
            .write()
            .entry(key)
            .and_modify(|list| list.insert(Arc::clone(&subscriber)))
            .or_insert_with(|| SubscriberList::new(Arc::clone(&subscriber)));
        trace!(event = %key, priority, "Subscriber registered");

        Unsubscribe::new(Registration { registry: Arc::downgrade(self), key, subscriber })
    }

    fn unsubscribe(&self, key: EventKey, subscriber: &Arc<Subscriber>) -> bool {
        let removed = {
            let mut lists = self.lists.write();
            let Some(list) = lists.get_mut(&key) else {
                return false;
            };
            let removed = list.remove(subscriber);
            if removed && list.subscribers.is_empty() {
                lists.remove(&key);
            }
            removed
        };
        if removed {
            trace!(event = %key, priority = subscriber.priority, "Subscriber removed");
        }
        removed
    }

    /// Snapshot of the subscribers of `key`.
    pub(crate) fn list_for(&self, key: EventKey) -> Option<SubscriberList> {
        self.lists.read().get(&key).cloned()
    }

    /// Snapshot of the catch-all list and the list of `key`, under one read lock.
    pub(crate) fn lists_for_dispatch(
        &self,
        key: EventKey,
    ) -> (Option<SubscriberList>, Option<SubscriberList>) {
        let lists = self.lists.read();
        let any = lists.get(&EventKey::any()).cloned();
        let exact = if key.is_any() { None } else { lists.get(&key).cloned() };
        (any, exact)
    }

    pub(crate) fn in_flight_for(&self, keys: &[EventKey]) -> Vec<Arc<InFlight>> {
        let lists = self.lists.read();
        keys.iter().filter_map(|key| lists.get(key)).map(|list| Arc::clone(&list.in_flight)).collect()
    }

    pub(crate) fn has_subscriber(&self, keys: &[EventKey]) -> bool {
        let lists = self.lists.read();
        if keys.is_empty() {
            return !lists.is_empty();
        }
        lists.contains_key(&EventKey::any()) || keys.iter().any(|key| lists.contains_key(key))
    }

    pub(crate) fn unsubscribe_all(&self, keys: &[EventKey]) -> usize {
        let mut lists = self.lists.write();
        if keys.is_empty() {
            let count = lists.values().map(SubscriberList::len).sum();
            lists.clear();
            drop(lists);
            trace!(count, "All subscribers removed");
            return count;
        }

        let mut count = 0;
        for key in keys {
            if let Some(list) = lists.remove(key) {
                trace!(event = %key, count = list.len(), "Subscribers removed");
                count += list.len();
            }
        }
        count
    }
}

#[derive(Debug)]
struct Registration {
    registry: Weak<Registry>,
    key: EventKey,
    subscriber: Arc<Subscriber>,
}

/// Removes one subscription.
///
/// Returned by every subscribe operation. Calling [`Unsubscribe::unsubscribe`]
/// removes exactly the registration this token was created for; later calls,
/// also through clones of the token, do nothing. Dropping the token keeps
/// the subscription alive, and the token does not keep the manager alive.
#[derive(Debug, Clone, Default)]
pub struct Unsubscribe {
    registration: Option<Arc<Mutex<Option<Registration>>>>,
}

impl Unsubscribe {
    fn new(registration: Registration) -> Self {
        Self { registration: Some(Arc::new(Mutex::new(Some(registration)))) }
    }

    /// A token that is not bound to any subscription.
    #[must_use]
    pub const fn noop() -> Self {
        Self { registration: None }
    }

    /// Removes the subscription. Returns `true` only for the call that
    /// actually removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(slot) = &self.registration else {
            return false;
        };
        let Some(registration) = slot.lock().take() else {
            return false;
        };
        registration
            .registry
            .upgrade()
            .is_some_and(|registry| registry.unsubscribe(registration.key, &registration.subscriber))
    }

    /// Whether [`Unsubscribe::unsubscribe`] has not been called yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.registration.as_ref().is_some_and(|slot| slot.lock().is_some())
    }
}
