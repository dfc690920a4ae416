use crate::error::HandlerFailure;
use std::any::Any;
use std::fmt;
use tracing::error;

/// Receives structured records of recovered handler failures.
///
/// A record carries the failure (event key, subscriber priority or
/// after-callback index, rendered cause) and the raw panic payload.
/// Sinks are called on the thread that ran the failing handler and must
/// not panic themselves.
///
/// Any `Fn(&HandlerFailure, &(dyn Any + Send)) + Send + Sync` closure is a sink:
///
/// ```rust
/// use herald_events::{EventManagerExt, Manager};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = {
///     let seen = seen.clone();
///     move |failure: &herald_events::HandlerFailure, _: &(dyn std::any::Any + Send)| {
///         seen.lock().unwrap().push(failure.as_label());
///     }
/// };
///
/// let events = Manager::builder().diagnostics(sink).build();
/// events.subscribe(0, |_: &mut u32| panic!("boom"));
/// events.fire(&mut 1_u32);
/// assert_eq!(*seen.lock().unwrap(), ["subscriber_panicked"]);
/// ```
pub trait DiagnosticSink: Send + Sync + 'static {
    /// Called once per recovered failure.
    fn handler_failed(&self, failure: &HandlerFailure, payload: &(dyn Any + Send));
}

impl<F> DiagnosticSink for F
where
    F: Fn(&HandlerFailure, &(dyn Any + Send)) + Send + Sync + 'static,
{
    fn handler_failed(&self, failure: &HandlerFailure, payload: &(dyn Any + Send)) {
        self(failure, payload);
    }
}

/// Drops every record. The default sink.
///
/// Only the record is dropped: the process panic hook has already run for
/// the panic, and the default hook prints it to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl DiagnosticSink for DiscardSink {
    fn handler_failed(&self, _failure: &HandlerFailure, _payload: &(dyn Any + Send)) {}
}

/// Logs every record with `tracing::error!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn handler_failed(&self, failure: &HandlerFailure, _payload: &(dyn Any + Send)) {
        match failure {
            HandlerFailure::Subscriber { key, priority, cause } => {
                error!(
                    event = %key,
                    priority = *priority,
                    panic = %cause,
                    label = failure.as_label(),
                    "{}",
                    failure.message()
                );
            },
            HandlerFailure::AfterCallback { key, index, cause } => {
                error!(
                    event = %key,
                    index = *index,
                    panic = %cause,
                    label = failure.as_label(),
                    "{}",
                    failure.message()
                );
            },
        }
    }
}

/// Shared handle to the configured sink.
pub(crate) struct Sink(Box<dyn DiagnosticSink>);

impl Sink {
    pub(crate) fn new(sink: impl DiagnosticSink) -> Self {
        Self(Box::new(sink))
    }

    pub(crate) fn report(&self, failure: &HandlerFailure, payload: &(dyn Any + Send)) {
        self.0.handler_failed(failure, payload);
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}
