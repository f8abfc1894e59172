use std::sync::Arc;

use parking_lot::Mutex;

use super::*;

type Log = CallLog<String, String>;

fn tier(
    name: &str,
    lookup: MockLookupSource<String, String>,
    log: &Log,
    with_sink: bool,
) -> DataSource<String, String> {
    let source = if with_sink {
        DataSource::with_refresh(lookup, MockRefreshSink::new(name, log))
    } else {
        DataSource::new(lookup)
    };
    source.named(name)
}

fn key(s: &str) -> String {
    s.to_string()
}

#[test]
fn test_all_tiers_absent_returns_none_without_refresh() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("t0", MockLookupSource::empty("t0", &log), &log, true),
        tier("t1", MockLookupSource::empty("t1", &log), &log, true),
        tier("t2", MockLookupSource::empty("t2", &log), &log, true),
    ])
    .expect("chain");

    let result = chain.execute(&key("X")).expect("lookup should succeed");

    assert!(result.is_none());
    assert_eq!(log.lookup_order(), vec!["t0", "t1", "t2"]);
    assert!(log.refresh_order().is_empty());
}

#[test]
fn test_hit_in_second_tier_without_refresh_sinks() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("t0", MockLookupSource::empty("t0", &log), &log, false),
        tier("t1", MockLookupSource::returning("t1", key("Y"), &log), &log, false),
        tier("t2", MockLookupSource::empty("t2", &log), &log, false),
    ])
    .expect("chain");

    let result = chain.lookup(&key("X")).expect("lookup should succeed");

    assert_eq!(result.value(), Some(&key("Y")));
    assert_eq!(result.tier(), Some(1));
    assert_eq!(result.refreshed(), 0);
    assert_eq!(log.lookup_order(), vec!["t0", "t1"]);
    assert_eq!(log.count("t2", CallKind::Lookup), 0);
    assert!(log.refresh_order().is_empty());
}

#[test]
fn test_hit_in_first_tier_short_circuits() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("t0", MockLookupSource::returning("t0", key("Z"), &log), &log, true),
        tier("t1", MockLookupSource::returning("t1", key("other"), &log), &log, true),
        tier("t2", MockLookupSource::returning("t2", key("other"), &log), &log, true),
    ])
    .expect("chain");

    let result = chain.lookup(&key("X")).expect("lookup should succeed");

    assert!(result.is_hit());
    assert_eq!(result.tier(), Some(0));
    assert_eq!(result.into_value(), Some(key("Z")));
    assert_eq!(log.lookup_order(), vec!["t0"]);
    assert_eq!(log.count("t1", CallKind::Lookup), 0);
    assert_eq!(log.count("t2", CallKind::Lookup), 0);
    assert!(log.refresh_order().is_empty());
}

#[test]
fn test_hit_in_last_tier_refreshes_nearest_first() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("t0", MockLookupSource::empty("t0", &log), &log, true),
        tier("t1", MockLookupSource::empty("t1", &log), &log, true),
        tier("t2", MockLookupSource::returning("t2", key("Y"), &log), &log, true),
    ])
    .expect("chain");

    let result = chain.lookup(&key("X")).expect("lookup should succeed");

    assert_eq!(result.value(), Some(&key("Y")));
    assert_eq!(result.refreshed(), 2);
    assert_eq!(result.refresh_failures(), 0);
    assert_eq!(log.refresh_order(), vec!["t1", "t0"]);
    assert_eq!(log.count("t2", CallKind::Refresh), 0);

    for record in log.refreshes() {
        assert_eq!(record.request, key("X"));
        assert_eq!(record.value, Some(key("Y")));
    }
}

#[test]
fn test_tier_without_sink_is_skipped() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("t0", MockLookupSource::empty("t0", &log), &log, false),
        tier("t1", MockLookupSource::empty("t1", &log), &log, true),
        tier("t2", MockLookupSource::returning("t2", key("Y"), &log), &log, true),
    ])
    .expect("chain");

    let result = chain.execute(&key("X")).expect("lookup should succeed");

    assert_eq!(result, Some(key("Y")));
    let refreshes = log.refreshes();
    assert_eq!(refreshes.len(), 1);
    assert_eq!(refreshes[0].tier, "t1");
    assert_eq!(refreshes[0].request, key("X"));
    assert_eq!(refreshes[0].value, Some(key("Y")));
}

#[test]
fn test_single_tier_is_passthrough() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![tier(
        "only",
        MockLookupSource::empty("only", &log).with_entry(key("a"), key("1")),
        &log,
        true,
    )])
    .expect("chain");

    assert_eq!(chain.len(), 1);
    assert_eq!(chain.execute(&key("a")).expect("hit"), Some(key("1")));
    assert_eq!(chain.execute(&key("b")).expect("miss"), None);
    assert!(log.refresh_order().is_empty());
}

#[test]
fn test_repeated_lookup_is_idempotent() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("t0", MockLookupSource::empty("t0", &log), &log, true),
        tier("t1", MockLookupSource::returning("t1", key("Y"), &log), &log, false),
    ])
    .expect("chain");

    let first = chain.execute(&key("X")).expect("first");
    let second = chain.execute(&key("X")).expect("second");

    assert_eq!(first, second);
    assert_eq!(log.count("t0", CallKind::Refresh), 2);
}

#[test]
fn test_per_request_entries_take_precedence() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier(
            "cache",
            MockLookupSource::empty("cache", &log).with_entry(key("a"), key("cached")),
            &log,
            true,
        ),
        tier("db", MockLookupSource::returning("db", key("db"), &log), &log, false),
    ])
    .expect("chain");

    assert_eq!(chain.execute(&key("a")).expect("a"), Some(key("cached")));
    assert_eq!(chain.execute(&key("b")).expect("b"), Some(key("db")));
    assert_eq!(log.refresh_order(), vec!["cache"]);
}

#[test]
fn test_lookup_error_is_fail_fast() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("t0", MockLookupSource::empty("t0", &log), &log, true),
        tier("t1", MockLookupSource::failing("t1", "connection refused", &log), &log, true),
        tier("t2", MockLookupSource::returning("t2", key("Y"), &log), &log, true),
    ])
    .expect("chain");

    let err = chain.execute(&key("X")).expect_err("lookup should fail");

    assert_eq!(err.tier(), Some(1));
    match err {
        ChainError::Lookup { tier, name, source } => {
            assert_eq!(tier, 1);
            assert_eq!(name, "t1");
            assert!(matches!(source, TierError::Unavailable { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(log.lookup_order(), vec!["t0", "t1"]);
    assert!(log.refresh_order().is_empty());
}

#[test]
fn test_refresh_failure_is_isolated_by_default() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("t0", MockLookupSource::empty("t0", &log), &log, true),
        DataSource::with_refresh(
            MockLookupSource::empty("t1", &log),
            MockRefreshSink::failing("t1", "cache down", &log),
        )
        .named("t1"),
        tier("t2", MockLookupSource::returning("t2", key("Y"), &log), &log, false),
    ])
    .expect("chain");

    assert_eq!(chain.refresh_policy(), RefreshPolicy::Isolate);

    let result = chain.lookup(&key("X")).expect("refresh failure must not fail the lookup");

    assert_eq!(result.value(), Some(&key("Y")));
    assert_eq!(result.refreshed(), 1);
    assert_eq!(result.refresh_failures(), 1);
    assert_eq!(log.refresh_order(), vec!["t1", "t0"]);
}

#[test]
fn test_refresh_failure_propagates_when_configured() {
    let log = Log::new();
    let chain = ChainedLookup::builder()
        .data_source(tier("t0", MockLookupSource::empty("t0", &log), &log, true))
        .data_source(
            DataSource::with_refresh(
                MockLookupSource::empty("t1", &log),
                MockRefreshSink::failing("t1", "cache down", &log),
            )
            .named("t1"),
        )
        .data_source(tier("t2", MockLookupSource::returning("t2", key("Y"), &log), &log, false))
        .refresh_policy(RefreshPolicy::Propagate)
        .build()
        .expect("chain");

    let err = chain.execute(&key("X")).expect_err("refresh failure should propagate");

    assert!(matches!(err, ChainError::Refresh { tier: 1, .. }));
    assert_eq!(log.refresh_order(), vec!["t1"]);
}

#[test]
fn test_empty_chain_is_rejected() {
    let err = ChainedLookup::<String, String>::new(Vec::new()).expect_err("empty chain");
    assert!(matches!(err, ChainError::EmptyChain));
    assert_eq!(err.tier(), None);

    let err = ChainedLookup::<String, String>::builder()
        .build()
        .expect_err("empty builder");
    assert!(matches!(err, ChainError::EmptyChain));
}

#[test]
fn test_falsy_values_are_hits() {
    let chain: ChainedLookup<u32, u64> = ChainedLookup::builder()
        .tier(|_: &u32| -> TierResult<Option<u64>> { Ok(None) })
        .tier(|_: &u32| -> TierResult<Option<u64>> { Ok(Some(0)) })
        .build()
        .expect("chain");

    let result = chain.lookup(&7).expect("lookup");
    assert!(result.is_hit());
    assert_eq!(result.tier(), Some(1));
    assert_eq!(result.into_value(), Some(0));

    let chain: ChainedLookup<u32, String> = ChainedLookup::builder()
        .tier(|_: &u32| -> TierResult<Option<String>> { Ok(Some(String::new())) })
        .build()
        .expect("chain");

    assert_eq!(chain.execute(&1).expect("lookup"), Some(String::new()));
}

#[test]
fn test_closure_tiers_backfill() {
    let written: Arc<Mutex<Vec<(u32, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&written);

    let chain: ChainedLookup<u32, String> = ChainedLookup::builder()
        .tier_with_refresh(
            |_: &u32| -> TierResult<Option<String>> { Ok(None) },
            move |id: &u32, value: &String| -> TierResult<()> {
                sink.lock().push((*id, value.clone()));
                Ok(())
            },
        )
        .tier(|id: &u32| -> TierResult<Option<String>> { Ok(Some(format!("person-{id}"))) })
        .build()
        .expect("chain");

    assert_eq!(chain.execute(&42).expect("lookup"), Some("person-42".to_string()));
    assert_eq!(*written.lock(), vec![(42, "person-42".to_string())]);
}

#[test]
fn test_data_source_setters_swap_collaborators() {
    let log = Log::new();
    let mut source = DataSource::new(MockLookupSource::empty("first", &log)).named("swap");
    assert!(!source.has_refresh());

    source.set_lookup(Arc::new(MockLookupSource::returning("second", key("V"), &log)));
    source.set_refresh(Some(Arc::new(MockRefreshSink::new("swap", &log))));
    assert!(source.has_refresh());
    assert_eq!(source.name(), "swap");

    let found = source.lookup().lookup(&key("X")).expect("lookup");
    assert_eq!(found, Some(key("V")));
    assert_eq!(log.lookup_order(), vec!["second"]);

    source.set_refresh(None);
    assert!(source.refresh().is_none());
}

#[test]
fn test_shared_tier_uses_same_object_for_lookup_and_refresh() {
    let log = Log::new();
    let shared = Arc::new(MockLookupSource::empty("cache", &log));

    struct Backfilled(Arc<MockLookupSource<String, String>>);

    impl LookupSource<String, String> for Backfilled {
        fn lookup(&self, request: &String) -> TierResult<Option<String>> {
            LookupSource::lookup(self.0.as_ref(), request)
        }
    }

    impl RefreshSink<String, String> for Backfilled {
        fn refresh(&self, request: &String, value: &String) -> TierResult<()> {
            self.0.insert(request.clone(), value.clone());
            Ok(())
        }
    }

    let chain: ChainedLookup<String, String> = ChainedLookup::builder()
        .shared_tier("cache", Arc::new(Backfilled(Arc::clone(&shared))))
        .tier(MockLookupSource::returning("db", key("Y"), &log))
        .build()
        .expect("chain");

    let first = chain.lookup(&key("X")).expect("first");
    assert_eq!(first.tier(), Some(1));

    let second = chain.lookup(&key("X")).expect("second");
    assert_eq!(second.tier(), Some(0));
    assert_eq!(log.count("db", CallKind::Lookup), 1);
}

#[test]
fn test_refresh_policy_parse_and_display() {
    assert_eq!("isolate".parse::<RefreshPolicy>(), Ok(RefreshPolicy::Isolate));
    assert_eq!(" Propagate ".parse::<RefreshPolicy>(), Ok(RefreshPolicy::Propagate));
    assert!("retry".parse::<RefreshPolicy>().is_err());
    assert_eq!(RefreshPolicy::Propagate.to_string(), "propagate");
    assert_eq!(RefreshPolicy::default(), RefreshPolicy::Isolate);
}

#[test]
fn test_miss_result_accessors() {
    let result: ChainLookupResult<String> = ChainLookupResult::Miss;

    assert!(result.is_miss());
    assert!(!result.is_hit());
    assert_eq!(result.tier(), None);
    assert_eq!(result.value(), None);
    assert_eq!(result.refreshed(), 0);
    assert_eq!(result.refresh_failures(), 0);
}

#[test]
fn test_chain_debug_lists_tier_names() {
    let log = Log::new();
    let chain = ChainedLookup::new(vec![
        tier("memory", MockLookupSource::empty("memory", &log), &log, true),
        tier("disk", MockLookupSource::empty("disk", &log), &log, false),
    ])
    .expect("chain");

    let debug = format!("{chain:?}");
    assert!(debug.contains("memory"));
    assert!(debug.contains("disk"));
    assert!(debug.contains("Isolate"));
}
