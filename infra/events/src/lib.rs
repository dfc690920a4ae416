//! # Herald Events
//!
//! An in-process, typed publish/subscribe event manager.
//!
//! ## Overview
//!
//! Components subscribe handlers to event types; firing a value runs every
//! matching handler, highest priority first, on that same value. Handlers
//! can therefore mutate the event and later handlers (or the caller) see
//! the result.
//!
//! ## Features
//!
//! * **Type-Safe**: Events are keyed by their concrete Rust type.
//! * **Priorities**: Higher priority runs first; ties keep registration order.
//! * **Catch-All**: Subscribers of [`EventKey::any`] see every event, first.
//! * **Sync and Async Firing**: Fire on the calling thread, or hand the event
//!   off to a Tokio blocking task (or a thread when no runtime is around).
//! * **Failure Isolation**: A panicking handler is reported to a
//!   [`DiagnosticSink`] and the remaining handlers still run.
//! * **Quiescence**: Wait until no firing is running for some or all keys.
//! * **High Performance**: `FxHashMap` + `parking_lot::RwLock`, copy-on-write
//!   subscriber lists.
//!
//! # Example
//!
//! ```rust
//! use herald_events::{EventManager, EventManagerExt, Manager};
//!
//! #[derive(Debug, Default)]
//! struct OrderPlaced {
//!     total: u64,
//!     audit: Vec<&'static str>,
//! }
//!
//! let events = Manager::new();
//! events.subscribe(10, |e: &mut OrderPlaced| {
//!     e.total += 5;
//!     e.audit.push("shipping");
//! });
//! events.subscribe(0, |e: &mut OrderPlaced| e.audit.push("notify"));
//!
//! let mut order = OrderPlaced { total: 100, ..Default::default() };
//! events.fire(&mut order);
//!
//! assert_eq!(order.total, 105);
//! assert_eq!(order.audit, ["shipping", "notify"]);
//! assert!(events.has_subscriber(&[]));
//! ```

mod config;
mod diagnostics;
mod dispatch;
mod error;
mod ext;
mod key;
mod manager;
mod nop;
mod registry;
mod tracker;

pub use config::{ManagerBuilder, ManagerConfig};
pub use diagnostics::{DiagnosticSink, DiscardSink, TracingSink};
pub use dispatch::{AfterFn, FinishFn};
pub use error::HandlerFailure;
pub use ext::EventManagerExt;
pub use key::{Event, EventKey};
pub use manager::{EventManager, Manager};
pub use nop::{NOP, NopManager};
pub use registry::{Handler, Unsubscribe};
