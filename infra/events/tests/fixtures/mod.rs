#![allow(dead_code, unreachable_pub)]

use herald_events::HandlerFailure;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

/// Event carrying a string that every handler appends to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail(pub String);

impl Trail {
    pub fn new(start: &str) -> Self {
        Self(start.to_owned())
    }
}

/// Event used to verify that unrelated subscribers stay silent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unrelated(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Counter(pub usize);

/// Shared, ordered log written by handlers.
#[derive(Debug, Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Diagnostic sink that keeps every reported failure.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<HandlerFailure>>>);

impl RecordingSink {
    pub fn failures(&self) -> Vec<HandlerFailure> {
        self.0.lock().clone()
    }
}

impl herald_events::DiagnosticSink for RecordingSink {
    fn handler_failed(&self, failure: &HandlerFailure, _payload: &(dyn Any + Send)) {
        self.0.lock().push(failure.clone());
    }
}
