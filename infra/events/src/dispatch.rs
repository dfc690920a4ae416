use crate::diagnostics::Sink;
use crate::error::HandlerFailure;
use crate::key::{Event, EventKey};
use crate::registry::{Subscriber, SubscriberList};
use crate::tracker::InFlight;
use std::panic::{self, AssertUnwindSafe};
use tracing::trace;

/// Callback run after all subscribers of an asynchronous firing.
pub type AfterFn = Box<dyn FnOnce(&mut dyn Event) + Send>;

/// Receives ownership of the event once an asynchronous firing has run
/// all subscribers and all after-fire callbacks.
pub type FinishFn = Box<dyn FnOnce(Box<dyn Event>) + Send>;

/// Invokes subscriber lists in order, isolating failures when configured to.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    recover_panics: bool,
    sink: Sink,
}

impl Dispatcher {
    pub(crate) const fn new(recover_panics: bool, sink: Sink) -> Self {
        Self { recover_panics, sink }
    }

    /// Runs the catch-all list, then the exact list, on the same event value.
    pub(crate) fn dispatch(
        &self,
        key: EventKey,
        event: &mut dyn Event,
        any: Option<&SubscriberList>,
        exact: Option<&SubscriberList>,
    ) {
        let count = any.map_or(0, SubscriberList::len) + exact.map_or(0, SubscriberList::len);
        if count == 0 {
            return;
        }
        trace!(event = %key, subscribers = count, "Event dispatched");

        self.run_list(key, event, any);
        self.run_list(key, event, exact);
    }

    fn run_list(&self, key: EventKey, event: &mut dyn Event, list: Option<&SubscriberList>) {
        let Some(list) = list else {
            return;
        };
        let _in_flight = InFlight::enter(&list.in_flight);

        for subscriber in list.subscribers.iter() {
            self.call(key, subscriber, event);
        }
    }

    fn call(&self, key: EventKey, subscriber: &Subscriber, event: &mut dyn Event) {
        if !self.recover_panics {
            (subscriber.handler)(&mut *event);
            return;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| (subscriber.handler)(&mut *event)));
        if let Err(payload) = result {
            let failure = HandlerFailure::subscriber(key, subscriber.priority, &*payload);
            self.sink.report(&failure, &*payload);
        }
    }

    /// Runs after-fire callbacks in order. A recovered failure stops the
    /// chain; returns `true` only if every callback completed.
    pub(crate) fn run_after(&self, key: EventKey, event: &mut dyn Event, after: Vec<AfterFn>) -> bool {
        if !self.recover_panics {
            for callback in after {
                callback(&mut *event);
            }
            return true;
        }

        let mut index = 0;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            for callback in after {
                callback(&mut *event);
                index += 1;
            }
        }));

        match result {
            Ok(()) => true,
            Err(payload) => {
                let failure = HandlerFailure::after_callback(key, index, &*payload);
                self.sink.report(&failure, &*payload);
                false
            },
        }
    }
}
