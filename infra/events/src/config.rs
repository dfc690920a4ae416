use crate::diagnostics::{DiagnosticSink, DiscardSink, Sink, TracingSink};
use crate::dispatch::Dispatcher;
use crate::manager::{Manager, Spawner};
use serde::Deserialize;
use std::fmt;
use tokio::runtime::Handle;

const DEFAULT_THREAD_NAME: &str = "herald-dispatch";

/// Serializable manager settings.
///
/// Can be embedded in an application's configuration file; every field
/// falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Catch handler panics, report them, and keep dispatching. Default `true`.
    pub recover_panics: bool,
    /// Route recovered failures to `tracing` when no explicit sink is set.
    /// Default `false` (failures are discarded).
    pub log_failures: bool,
    /// Name of the threads that run asynchronous firings when no Tokio
    /// runtime is available.
    pub thread_name: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self { recover_panics: true, log_failures: false, thread_name: DEFAULT_THREAD_NAME.to_owned() }
    }
}

/// Builder for [`Manager`]. Settings are fixed once [`ManagerBuilder::build`] is called.
#[derive(Default)]
pub struct ManagerBuilder {
    config: ManagerConfig,
    sink: Option<Sink>,
    runtime: Option<Handle>,
}

impl ManagerBuilder {
    /// Replaces all serializable settings at once.
    #[must_use = "The builder must be consumed by `build` to create a manager."]
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables or disables panic recovery for handlers and after-fire callbacks.
    ///
    /// When disabled, a panicking handler aborts the rest of its firing and
    /// the panic reaches the caller of `fire` (or ends the asynchronous unit).
    ///
    /// Recovery happens after the process panic hook ran, so the default
    /// hook still prints each recovered panic to stderr whatever sink is
    /// configured. Install a hook with [`std::panic::set_hook`] to silence it.
    #[must_use = "The builder must be consumed by `build` to create a manager."]
    pub const fn recover_panics(mut self, enabled: bool) -> Self {
        self.config.recover_panics = enabled;
        self
    }

    /// Sets the sink that receives recovered failures.
    #[must_use = "The builder must be consumed by `build` to create a manager."]
    pub fn diagnostics(mut self, sink: impl DiagnosticSink) -> Self {
        self.sink = Some(Sink::new(sink));
        self
    }

    /// Runs asynchronous firings on the blocking pool of this runtime.
    ///
    /// Without it, the runtime current at [`ManagerBuilder::build`] is used,
    /// and if there is none each asynchronous firing gets its own thread.
    /// Firings requested after the runtime shut down also get their own
    /// thread.
    #[must_use = "The builder must be consumed by `build` to create a manager."]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Consumes the builder and creates the manager.
    #[must_use]
    pub fn build(self) -> Manager {
        let sink = self.sink.unwrap_or_else(|| {
            if self.config.log_failures { Sink::new(TracingSink) } else { Sink::new(DiscardSink) }
        });
        let spawner = match self.runtime.or_else(|| Handle::try_current().ok()) {
            Some(handle) => Spawner::Runtime { handle, thread_name: self.config.thread_name },
            None => Spawner::Thread(self.config.thread_name),
        };

        Manager::from_parts(Dispatcher::new(self.config.recover_panics, sink), spawner)
    }
}

impl fmt::Debug for ManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerBuilder")
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}
