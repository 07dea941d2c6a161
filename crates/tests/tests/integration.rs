//! Integration tests for end-to-end cascade execution.
//!
//! These tests verify the full pipeline:
//! Seed -> Register -> Plan -> Run -> Verify -> Export

use cascade_engine::{outputs, Engine, Error, FnUnit, RunOptions, UnitError, UnitOutcome};
use cascade_registry::{ParamPath, ParameterStore, Value};
use cascade_snapshot::Snapshot;
use cascade_tests::TestHarness;

use cascade_certify::{Certificate, CheckStatus, GateCheck};

fn constant(id: &str, path: &'static str, value: f64) -> FnUnit {
    FnUnit::new(id, "1.0")
        .writes(&[path])
        .compute(move |_| Ok(outputs([(path, Value::Scalar(value))])))
}

fn doubler(id: &str, input: &'static str, output: &'static str) -> FnUnit {
    FnUnit::new(id, "1.0")
        .reads(&[input])
        .writes(&[output])
        .compute(move |store| {
            let x = store.scalar(&input.into())?;
            Ok(outputs([(output, Value::Scalar(x * 2.0))]))
        })
}

/// Units run in dependency order regardless of registration order, and
/// provenance records the producing unit.
#[test]
fn test_topological_execution_with_provenance() {
    let mut harness = TestHarness::new();
    harness.unit(doubler("u2", "a.x", "a.y"));
    harness.unit(constant("u1", "a.x", 3.0));

    let report = harness.run().unwrap();
    assert_eq!(report.executed_order(), vec!["u1", "u2"]);

    assert_eq!(harness.scalar("a.x"), Some(3.0));
    assert_eq!(harness.scalar("a.y"), Some(6.0));
    assert_eq!(harness.source("a.y"), Some("u2"));
}

/// Two runs over the same unit set and seed produce byte-identical
/// export snapshots.
#[test]
fn test_deterministic_snapshots() {
    let build = || {
        let mut harness = TestHarness::new();
        harness.seed("seed.base", Value::Scalar(10.0));
        harness.unit(doubler("d1", "seed.base", "derived.one"));
        harness.unit(doubler("d2", "derived.one", "derived.two"));
        harness.unit(constant("free-a", "free.a", 1.0));
        harness.unit(constant("free-b", "free.b", 2.0));
        harness.certificate(Certificate::at_least("floor", "derived.two", 0.0));
        harness.run().unwrap();
        harness.export().to_json().unwrap()
    };

    assert_eq!(build(), build());
}

/// Overlapping output declarations are rejected at registration,
/// before any run.
#[test]
fn test_output_disjointness_enforced() {
    let mut harness = TestHarness::new();
    harness.unit(constant("v1", "gauge.m_gut", 2.0e16));

    let err = harness
        .engine_mut()
        .register(constant("v2", "gauge.m_gut", 6.6e15))
        .unwrap_err();
    assert!(matches!(err, Error::OutputCollision { .. }));
}

/// Two units each requiring the other's sole output abort the run
/// with zero units executed and the store untouched.
#[test]
fn test_cycle_runs_zero_units() {
    let mut engine = Engine::new();
    engine
        .register(
            FnUnit::new("chicken", "1.0")
                .reads(&["p.egg"])
                .writes(&["p.chicken"])
                .compute(|_| Ok(outputs([("p.chicken", Value::Scalar(1.0))]))),
        )
        .unwrap();
    engine
        .register(
            FnUnit::new("egg", "1.0")
                .reads(&["p.chicken"])
                .writes(&["p.egg"])
                .compute(|_| Ok(outputs([("p.egg", Value::Scalar(1.0))]))),
        )
        .unwrap();

    let mut store = ParameterStore::new();
    let err = engine.run(&mut store).unwrap_err();

    match err {
        Error::CycleDetected { units } => {
            assert_eq!(units.len(), 2);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
    assert!(store.is_empty());
    assert!(store.audit_log().is_empty());
}

/// A required input that no unit produces and no loader seeded is a
/// pre-flight error, distinct from run-time blocking.
#[test]
fn test_missing_producer_preflight() {
    let mut harness = TestHarness::new();
    harness.unit(doubler("orphan", "never.defined", "p.out"));

    let err = harness.run().unwrap_err();
    match err {
        Error::UnresolvedProducer { path, required_by } => {
            assert_eq!(path, ParamPath::from("never.defined"));
            assert_eq!(required_by, "orphan");
        }
        other => panic!("expected unresolved producer, got {other:?}"),
    }

    // The same unit set passes once the path is pre-populated
    harness.seed("never.defined", Value::Scalar(5.0));
    let report = harness.run().unwrap();
    assert_eq!(report.outcome("orphan"), Some(UnitOutcome::Success));
    assert_eq!(harness.scalar("p.out"), Some(10.0));
}

/// A unit whose run fails is marked FAILED while independent units
/// still execute and succeed.
#[test]
fn test_failure_isolation() {
    let mut harness = TestHarness::new();
    harness.unit(
        FnUnit::new("unstable", "1.0")
            .writes(&["p.unstable"])
            .compute(|_| Err(UnitError::new("matrix inversion diverged"))),
    );
    harness.unit(constant("stable", "p.stable", 7.0));

    let report = harness.run().unwrap();
    assert_eq!(report.outcome("unstable"), Some(UnitOutcome::Failed));
    assert_eq!(report.outcome("stable"), Some(UnitOutcome::Success));

    let failed = report.unit("unstable").unwrap();
    assert!(failed.reason.as_deref().unwrap().contains("diverged"));

    assert_eq!(harness.scalar("p.stable"), Some(7.0));
    assert!(!harness.store().has(&"p.unstable".into()));
}

/// A unit that omits one declared output is PARTIAL; dependents of the
/// missing path are blocked while dependents of the produced path run.
#[test]
fn test_cascading_block_with_unaffected_sibling() {
    let mut harness = TestHarness::new();
    harness.unit(
        FnUnit::new("base", "1.0")
            .writes(&["p.a", "p.b"])
            .compute(|_| Ok(outputs([("p.b", Value::Scalar(2.0))]))),
    );
    harness.unit(doubler("wants-a", "p.a", "q.a"));
    harness.unit(doubler("wants-b", "p.b", "q.b"));
    harness.unit(doubler("wants-qa", "q.a", "r.a"));

    let report = harness.run().unwrap();
    assert_eq!(report.outcome("base"), Some(UnitOutcome::Partial));
    assert_eq!(report.outcome("wants-a"), Some(UnitOutcome::Blocked));
    assert_eq!(report.outcome("wants-b"), Some(UnitOutcome::Success));
    // The block cascades down the chain without crashing the run
    assert_eq!(report.outcome("wants-qa"), Some(UnitOutcome::Blocked));

    let blocked = report.unit("wants-a").unwrap();
    assert_eq!(blocked.missing_inputs, vec![ParamPath::from("p.a")]);
    assert!(blocked.reason.as_deref().unwrap().contains("base"));

    assert_eq!(harness.scalar("q.b"), Some(4.0));
}

/// Skipping a unit blocks only its dependents.
#[test]
fn test_skip_blocks_only_dependents() {
    let mut harness = TestHarness::new();
    harness.unit(constant("flagged", "p.x", 1.0));
    harness.unit(doubler("dependent", "p.x", "p.y"));
    harness.unit(constant("other", "p.z", 9.0));

    let options = RunOptions {
        skip: ["flagged".to_string()].into_iter().collect(),
        time_budget: None,
    };
    let report = harness.run_with_options(options).unwrap();

    assert_eq!(report.outcome("flagged"), Some(UnitOutcome::Skipped));
    assert_eq!(report.outcome("dependent"), Some(UnitOutcome::Blocked));
    assert_eq!(report.outcome("other"), Some(UnitOutcome::Success));
}

/// A certificate referencing an undefined parameter fails with a
/// diagnostic naming the path; nothing raises.
#[test]
fn test_certificate_missing_path_fails_cleanly() {
    let mut harness = TestHarness::new();
    harness.seed("present.value", Value::Scalar(1.0));
    harness.certificate(Certificate::at_least("present", "present.value", 0.0));
    harness.certificate(Certificate::at_least("absent", "absent.value", 0.0));

    let report = harness.verify();
    assert!(!report.verified);
    assert_eq!(report.check("present").unwrap().status, CheckStatus::Pass);

    let absent = report.check("absent").unwrap();
    assert_eq!(absent.status, CheckStatus::Fail);
    assert!(absent.message.contains("absent.value"));
}

/// Partial unit failures propagate into certificate failures for the
/// outputs that never materialized.
#[test]
fn test_failed_unit_fails_dependent_certificates() {
    let mut harness = TestHarness::new();
    harness.unit(
        FnUnit::new("broken", "1.0")
            .writes(&["p.broken"])
            .compute(|_| Err(UnitError::new("oscillating fixpoint"))),
    );
    harness.certificate(Certificate::at_least("needs-broken", "p.broken", 0.0));

    harness.run().unwrap();
    let report = harness.verify();
    assert!(!report.verified);
    assert_eq!(
        report.check("needs-broken").unwrap().status,
        CheckStatus::Fail
    );
}

/// Gate checks share the certificate evaluation contract.
#[test]
fn test_gate_checks() {
    let mut harness = TestHarness::new();
    harness.seed("scale.low", Value::Scalar(1.0e3));
    harness.seed("scale.high", Value::Scalar(1.0e16));
    harness.gate(GateCheck::new(
        "hierarchy",
        "ordering",
        "low scale sits below high scale",
        |ctx| Ok(ctx.scalar(&"scale.low".into())? < ctx.scalar(&"scale.high".into())?),
    ));

    let report = harness.verify();
    assert!(report.verified);
    assert_eq!(report.gates[0].gate, "hierarchy");
    assert_eq!(report.gates[0].status, CheckStatus::Pass);
}

/// Export -> reload reproduces the store exactly for every supported
/// value type, and a second export of the reloaded store is identical.
#[test]
fn test_snapshot_round_trip() {
    let mut harness = TestHarness::new();
    harness.seed("k.scalar", Value::Scalar(6.6e15));
    harness.seed("k.bool", Value::Bool(true));
    harness.seed("k.text", Value::Text("su5".into()));
    harness.seed("k.tuple", Value::Tuple(vec![0.0169, 0.0338, 0.118]));
    harness.unit(doubler("d", "k.scalar", "k.derived"));
    harness.certificate(Certificate::at_least("floor", "k.derived", 0.0));

    harness.run().unwrap();
    let snapshot = harness.export();

    let json = snapshot.to_json().unwrap();
    let restored = Snapshot::from_json(&json).unwrap();
    assert_eq!(restored, snapshot);

    let reloaded = restored.reload();
    assert_eq!(reloaded.len(), harness.store().len());
    for (path, entry) in harness.store().iter() {
        let reloaded_entry = reloaded.entry(path).unwrap();
        assert_eq!(reloaded_entry.value, entry.value);
        assert_eq!(reloaded_entry.source, entry.source);
        assert_eq!(reloaded_entry.status, entry.status);
    }

    // Re-exporting the reloaded store with the same report changes nothing
    let re_export = Snapshot::export(&reloaded, &snapshot.report);
    assert_eq!(re_export.to_json().unwrap(), json);
}

/// A run with failures still exports a valid, partial snapshot.
#[test]
fn test_partial_run_still_exports() {
    let mut harness = TestHarness::new();
    harness.unit(constant("good", "p.good", 1.0));
    harness.unit(
        FnUnit::new("bad", "1.0")
            .writes(&["p.bad"])
            .compute(|_| Err(UnitError::new("no convergence"))),
    );
    harness.certificate(Certificate::at_least("wants-bad", "p.bad", 0.0));

    let report = harness.run().unwrap();
    assert_eq!(report.count(UnitOutcome::Failed), 1);

    let snapshot = harness.export();
    assert!(snapshot.params.contains_key(&ParamPath::from("p.good")));
    assert!(!snapshot.params.contains_key(&ParamPath::from("p.bad")));
    assert!(!snapshot.report.verified);

    // Round-trips like any complete snapshot
    let json = snapshot.to_json().unwrap();
    assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
}

/// Overwrites are allowed, logged, and auditable; the export carries
/// the last writer.
#[test]
fn test_overwrite_provenance_in_export() {
    let mut harness = TestHarness::new();
    harness.seed("gauge.m_gut", Value::Scalar(2.0e16));
    harness.unit(
        FnUnit::new("refit", "2.0")
            .reads(&["gauge.m_gut"])
            .writes(&["gauge.m_gut_refit"])
            .compute(|store| {
                let old = store.scalar(&"gauge.m_gut".into())?;
                Ok(outputs([
                    ("gauge.m_gut_refit", Value::Scalar(old * 0.33)),
                    // Deliberate overwrite of the seeded value
                    ("gauge.m_gut", Value::Scalar(old * 0.33)),
                ]))
            }),
    );

    harness.run().unwrap();

    let history = harness.store().history(&"gauge.m_gut".into());
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].previous, Some(Value::Scalar(2.0e16)));

    assert_eq!(harness.source("gauge.m_gut"), Some("refit"));
    let snapshot = harness.export();
    assert_eq!(
        snapshot.params[&ParamPath::from("gauge.m_gut")].source,
        "refit"
    );
}
