use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for values that can be fired through an
/// [`EventManager`](crate::EventManager).
///
/// Any type that is `Send + 'static` automatically implements this trait.
///
/// Keep in mind that the blanket impl also covers smart pointers: a
/// `Box<dyn Event>` is itself an `Event` with its own key. Resolve keys
/// through [`EventKey::of_val`] on the pointee (`&*boxed`) instead of
/// calling [`Event::event_key`] on the box.
pub trait Event: Any + Send + 'static {
    /// Upcasts to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Upcasts a boxed event to `Box<dyn Any>` for owned downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Key of the concrete runtime type of this value.
    fn event_key(&self) -> EventKey;

    /// Type name of the concrete runtime type, for diagnostics.
    fn event_name(&self) -> &'static str;
}

impl<T: Any + Send + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn event_key(&self) -> EventKey {
        EventKey::of::<T>()
    }

    fn event_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn Event {
    /// Returns `true` if the concrete type of the event is `T`.
    #[must_use]
    pub fn is<T: Event>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrows the event as `T` if that is its concrete type.
    #[must_use]
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrows the event as `T` if that is its concrete type.
    pub fn downcast_mut<T: Event>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Event").field(&self.event_name()).finish()
    }
}

/// Reserved key type for catch-all subscribers.
enum CatchAll {}

/// Identity of an event type, used to bucket subscribers.
///
/// Two keys are equal iff they denote the same concrete Rust type.
/// `T`, `Box<T>` and `&'static T` are all different keys: subscribers
/// only ever see the exact type they registered for.
#[derive(Clone, Copy)]
pub struct EventKey {
    id: TypeId,
    name: &'static str,
}

impl EventKey {
    /// Key for the type `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(), name: std::any::type_name::<T>() }
    }

    /// Key for the runtime type of `event`.
    ///
    /// A value that already is an [`EventKey`] resolves to itself, so keys
    /// and sample values can be used interchangeably.
    #[must_use]
    pub fn of_val(event: &dyn Event) -> Self {
        match event.as_any().downcast_ref::<Self>() {
            Some(key) => *key,
            None => event.event_key(),
        }
    }

    /// The catch-all key. Subscribers registered under it receive every
    /// fired event, before any type-specific subscriber.
    #[must_use]
    pub fn any() -> Self {
        Self { id: TypeId::of::<CatchAll>(), name: "*" }
    }

    /// Whether this is the catch-all key.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.id == TypeId::of::<CatchAll>()
    }

    /// Type name the key was created from.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKey {}

impl Hash for EventKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventKey").field(&self.name).finish()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MyEvent {
        s: String,
    }

    #[test]
    fn test_value_and_pointer_keys_differ() {
        let value = MyEvent { s: String::new() };
        let boxed: Box<MyEvent> = Box::new(MyEvent { s: String::new() });

        assert_eq!(EventKey::of_val(&value), EventKey::of::<MyEvent>());
        assert_eq!(EventKey::of_val(&boxed), EventKey::of::<Box<MyEvent>>());
        assert_ne!(EventKey::of_val(&boxed), EventKey::of::<MyEvent>());
        assert_eq!(value.s, boxed.s);
    }

    #[test]
    fn test_key_value_resolves_verbatim() {
        let key = EventKey::of::<Box<MyEvent>>();
        assert_eq!(EventKey::of_val(&key), key);
        assert_ne!(EventKey::of_val(&EventKey::of::<MyEvent>()), key);
    }

    #[test]
    fn test_boxed_dyn_event_resolves_pointee() {
        let boxed: Box<dyn Event> = Box::new(MyEvent { s: "x".to_owned() });
        assert_eq!(EventKey::of_val(&*boxed), EventKey::of::<MyEvent>());
        assert!(boxed.is::<MyEvent>());
        assert_eq!(boxed.downcast_ref::<MyEvent>().map(|e| e.s.as_str()), Some("x"));
    }

    #[test]
    fn test_any_key() {
        assert!(EventKey::any().is_any());
        assert!(!EventKey::of::<MyEvent>().is_any());
        assert_eq!(EventKey::any().to_string(), "*");
    }
}
