use crate::key::EventKey;
use std::any::Any;
use std::borrow::Cow;
use thiserror::Error;

/// A recovered handler failure.
///
/// Produced only while panic recovery is enabled; it is handed to the
/// configured [`DiagnosticSink`](crate::DiagnosticSink) and never crosses
/// the invocation boundary of the handler that failed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerFailure {
    /// A subscriber panicked while handling an event.
    #[error("recovered from panic from an event subscriber (event: {key}, priority: {priority}): {cause}")]
    Subscriber {
        /// Key of the fired event.
        key: EventKey,
        /// Priority the subscriber was registered with.
        priority: i32,
        /// Panic payload rendered as text.
        cause: Cow<'static, str>,
    },

    /// An after-fire callback panicked; later callbacks of the same firing were skipped.
    #[error("recovered from panic by an after-fire callback (event: {key}, index: {index}): {cause}")]
    AfterCallback {
        /// Key of the fired event.
        key: EventKey,
        /// Position of the callback in the after list.
        index: usize,
        /// Panic payload rendered as text.
        cause: Cow<'static, str>,
    },
}

impl HandlerFailure {
    pub(crate) fn subscriber(key: EventKey, priority: i32, payload: &(dyn Any + Send)) -> Self {
        Self::Subscriber { key, priority, cause: panic_message(payload) }
    }

    pub(crate) fn after_callback(key: EventKey, index: usize, payload: &(dyn Any + Send)) -> Self {
        Self::AfterCallback { key, index, cause: panic_message(payload) }
    }

    /// Key of the event whose dispatch failed.
    #[must_use]
    pub const fn key(&self) -> EventKey {
        match self {
            Self::Subscriber { key, .. } | Self::AfterCallback { key, .. } => *key,
        }
    }

    /// Priority of the failing subscriber, if a subscriber failed.
    #[must_use]
    pub const fn priority(&self) -> Option<i32> {
        match self {
            Self::Subscriber { priority, .. } => Some(*priority),
            Self::AfterCallback { .. } => None,
        }
    }

    /// Index of the failing after-fire callback, if one failed.
    #[must_use]
    pub const fn after_index(&self) -> Option<usize> {
        match self {
            Self::Subscriber { .. } => None,
            Self::AfterCallback { index, .. } => Some(*index),
        }
    }

    /// The panic payload rendered as text.
    #[must_use]
    pub fn cause(&self) -> &str {
        match self {
            Self::Subscriber { cause, .. } | Self::AfterCallback { cause, .. } => cause,
        }
    }

    /// Fixed human-readable summary, without the variable context.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Subscriber { .. } => "recovered from panic from an event subscriber",
            Self::AfterCallback { .. } => "recovered from panic by an after-fire callback",
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use herald_events::{EventKey, HandlerFailure};
    ///
    /// let failure = HandlerFailure::Subscriber {
    ///     key: EventKey::of::<u32>(),
    ///     priority: 0,
    ///     cause: "boom".into(),
    /// };
    /// assert_eq!(failure.as_label(), "subscriber_panicked");
    /// ```
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::Subscriber { .. } => "subscriber_panicked",
            Self::AfterCallback { .. } => "after_callback_panicked",
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Cow<'static, str> {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(*msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        Cow::Owned(msg.clone())
    } else {
        Cow::Borrowed("unknown panic")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let key = EventKey::of::<u8>();

        let failure = HandlerFailure::subscriber(key, 3, &"static message");
        assert_eq!(failure.cause(), "static message");
        assert_eq!(failure.priority(), Some(3));
        assert_eq!(failure.after_index(), None);

        let failure = HandlerFailure::after_callback(key, 1, &String::from("owned"));
        assert_eq!(failure.cause(), "owned");
        assert_eq!(failure.after_index(), Some(1));
        assert_eq!(failure.key(), key);

        let failure = HandlerFailure::subscriber(key, 0, &42_u64);
        assert_eq!(failure.cause(), "unknown panic");
    }

    #[test]
    fn test_display_carries_context() {
        let failure = HandlerFailure::subscriber(EventKey::of::<u8>(), -2, &"boom");
        let text = failure.to_string();
        assert!(text.contains("u8"), "{text}");
        assert!(text.contains("-2"), "{text}");
        assert!(text.contains("boom"), "{text}");
    }
}
