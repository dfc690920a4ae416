pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use herald_events::*;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ManagerConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, ManagerConfig::default());
        assert!(config.recover_panics);
        assert!(!config.log_failures);
        assert_eq!(config.thread_name, "herald-dispatch");
    }

    #[test]
    fn test_partial_config_overrides_only_given_fields() {
        let config: ManagerConfig =
            serde_json::from_str(r#"{ "recover_panics": false, "thread_name": "audit-events" }"#).unwrap();

        assert!(!config.recover_panics);
        assert!(!config.log_failures);
        assert_eq!(config.thread_name, "audit-events");
    }

    #[test]
    fn test_config_rejects_wrong_types() {
        let result = serde_json::from_str::<ManagerConfig>(r#"{ "recover_panics": "yes" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_disables_recovery() {
        let config: ManagerConfig = serde_json::from_str(r#"{ "recover_panics": false }"#).unwrap();
        let events = Manager::builder().config(config).build();
        events.subscribe(0, |_: &mut Trail| panic!("boom"));

        let result = panic::catch_unwind(AssertUnwindSafe(|| events.fire(&mut Trail::default())));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_sink_wins_over_log_failures() {
        let sink = RecordingSink::default();
        let config = ManagerConfig { log_failures: true, ..ManagerConfig::default() };
        let events = Manager::builder().config(config).diagnostics(sink.clone()).build();
        events.subscribe(0, |_: &mut Trail| panic!("boom"));

        events.fire(&mut Trail::default());
        assert_eq!(sink.failures().len(), 1);
    }

    #[test]
    fn test_async_firing_uses_named_thread_without_runtime() {
        let config = ManagerConfig { thread_name: "custom-dispatch".to_owned(), ..ManagerConfig::default() };
        let events = Manager::builder().config(config).build();
        events.subscribe(0, |t: &mut Trail| {
            t.0 = std::thread::current().name().unwrap_or_default().to_owned();
        });

        let trail = events.fire_async_result(Trail::default()).blocking_recv().unwrap();
        assert_eq!(trail.0, "custom-dispatch");
    }

    #[test]
    fn test_explicit_runtime_handle_is_used() {
        let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(1).build().unwrap();
        let events = Manager::builder().runtime(runtime.handle().clone()).build();
        events.subscribe(0, |t: &mut Trail| t.0.push('r'));

        let trail = events.fire_async_result(Trail::new("_")).blocking_recv().unwrap();
        assert_eq!(trail.0, "_r");
        assert!(format!("{events:?}").contains("Runtime"));
    }
}
