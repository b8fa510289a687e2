//! End-to-end pipeline behaviour: ordering, scenarios, sinks.

use chrono::NaiveDate;
use pulsemetrics_core::{
    config::{OutputFormat, PipelineConfig},
    error::DatagenError,
    event::PipelineEvent,
    pipeline::Pipeline,
    rng::GeneratorSlot,
    sink::{SqliteSink, DATABASE_FILE},
    step::{Dataset, EventsStep, SessionsStep, Step, UsersStep},
    types::TableKind,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config_in(dir: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::default_test();
    config.output_dir = dir.to_path_buf();
    config
}

fn csv_rows(dir: &std::path::Path, table: TableKind) -> usize {
    let path = dir.join(format!("{}.csv", table.name()));
    csv::Reader::from_path(path).unwrap().records().count()
}

/// A step that needs subscriptions but claims to produce payments.
struct EarlyPayments;

impl Step for EarlyPayments {
    fn name(&self) -> &'static str { "early_payments" }
    fn produces(&self) -> TableKind { TableKind::Payments }
    fn requires(&self) -> &'static [TableKind] { &[TableKind::Subscriptions] }
    fn slot(&self) -> GeneratorSlot { GeneratorSlot::Payments }

    fn execute(
        &self,
        _dataset: &mut Dataset,
        _config: &PipelineConfig,
        _rng: &mut pulsemetrics_core::rng::StreamRng,
    ) -> pulsemetrics_core::error::DatagenResult<usize> {
        Ok(0)
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn zero_rates_year_of_100_users_yields_no_paid_subscriptions() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.users.count = 100;
    config.start_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    config.end_date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    config.subscriptions.trial_conversion_rate = 0.0;
    config.subscriptions.monthly_churn_rate = 0.0;
    config.subscriptions.upgrade_probability = 0.0;
    config.payments.failure_rate = 0.0;

    let summary = Pipeline::build(config).unwrap().run().unwrap();

    assert_eq!(summary.rows(TableKind::Users), 100);
    assert_eq!(summary.rows(TableKind::Subscriptions), 100);
    assert_eq!(summary.rows(TableKind::Payments), 0);
    assert_eq!(csv_rows(dir.path(), TableKind::Users), 100);
    assert_eq!(csv_rows(dir.path(), TableKind::Payments), 0);

    let mut reader = csv::Reader::from_path(dir.path().join("subscriptions.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    let status_idx = headers.iter().position(|h| h == "status").unwrap();
    for record in reader.records() {
        assert_eq!(&record.unwrap()[status_idx], "trial");
    }
}

#[test]
fn single_user_without_sessions_yields_empty_session_and_event_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.users.count = 1;
    config.sessions.per_active_user_mean = 0.0;
    config.sessions.per_active_user_std = 0.0;

    let summary = Pipeline::build(config).unwrap().run().unwrap();

    assert_eq!(summary.rows(TableKind::Users), 1);
    assert_eq!(summary.rows(TableKind::Sessions), 0);
    assert_eq!(summary.rows(TableKind::Events), 0);
    assert_eq!(csv_rows(dir.path(), TableKind::Sessions), 0);
    assert_eq!(csv_rows(dir.path(), TableKind::Events), 0);

    // Empty tables still carry their header.
    let mut reader = csv::Reader::from_path(dir.path().join("events.csv")).unwrap();
    assert_eq!(reader.headers().unwrap().get(0), Some("event_id"));
}

// ── Orchestration ────────────────────────────────────────────────────────────

#[test]
fn steps_run_in_dependency_order_and_report_progress() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::build(config_in(dir.path())).unwrap();
    assert_eq!(
        pipeline.step_names(),
        vec!["users", "sessions", "events", "subscriptions", "payments"]
    );

    let mut started = Vec::new();
    let mut completed = Vec::new();
    let mut released = Vec::new();
    let summary = pipeline
        .run_with(|event| match event {
            PipelineEvent::StepStarted { index, total, table } => {
                assert_eq!(*total, 5);
                started.push((*index, *table));
            }
            PipelineEvent::StepCompleted { table, .. } => completed.push(*table),
            PipelineEvent::TableReleased { table } => released.push(*table),
            _ => {}
        })
        .unwrap();

    assert_eq!(
        started,
        TableKind::ALL.iter().enumerate().map(|(i, t)| (i + 1, *t)).collect::<Vec<_>>()
    );
    assert_eq!(completed, TableKind::ALL.to_vec());
    assert_eq!(
        released,
        vec![
            TableKind::Sessions,
            TableKind::Events,
            TableKind::Users,
            TableKind::Subscriptions,
            TableKind::Payments,
        ],
        "tables must be dropped as soon as no later step needs them"
    );
    assert_eq!(summary.tables.len(), 5);
    assert_eq!(
        summary.total_rows(),
        TableKind::ALL.iter().map(|t| summary.rows(*t)).sum::<usize>()
    );
    assert_eq!(summary.seed, 42);
}

#[test]
fn out_of_order_registration_is_rejected() {
    let mut pipeline = Pipeline::new(PipelineConfig::default_test());
    pipeline.register(Box::new(UsersStep));
    pipeline.register(Box::new(EventsStep));
    pipeline.register(Box::new(SessionsStep));

    match pipeline.validate_order() {
        Err(DatagenError::StepOutOfOrder { step, missing }) => {
            assert_eq!(step, "events");
            assert_eq!(missing, TableKind::Sessions);
        }
        other => panic!("expected StepOutOfOrder, got {other:?}"),
    }

    let mut pipeline = Pipeline::new(PipelineConfig::default_test());
    pipeline.register(Box::new(UsersStep));
    pipeline.register(Box::new(EarlyPayments));
    assert!(matches!(
        pipeline.validate_order(),
        Err(DatagenError::StepOutOfOrder { missing: TableKind::Subscriptions, .. })
    ));
}

#[test]
fn output_directory_is_created_and_reused() {
    let root = tempfile::tempdir().unwrap();
    let nested = root.path().join("warehouse").join("raw");
    let config = config_in(&nested);

    Pipeline::build(config.clone()).unwrap().run().unwrap();
    assert!(nested.is_dir());
    // Second run into the existing directory must not fail.
    Pipeline::build(config).unwrap().run().unwrap();
    for table in TableKind::ALL {
        assert!(nested.join(format!("{}.csv", table.name())).is_file());
    }
}

#[test]
fn invalid_config_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut config = config_in(&out);
    config.subscriptions.monthly_churn_rate = 1.5;

    let err = Pipeline::build(config).err().expect("build must fail");
    assert!(matches!(err, DatagenError::InvalidConfig { .. }), "got {err:?}");
    assert!(!out.exists(), "nothing should be written for an invalid config");
}

#[test]
fn sqlite_sink_holds_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.output_format = OutputFormat::Sqlite;

    let summary = Pipeline::build(config.clone()).unwrap().run().unwrap();
    assert!(dir.path().join(DATABASE_FILE).is_file());

    let conn = rusqlite::Connection::open(dir.path().join(DATABASE_FILE)).unwrap();
    for table in TableKind::ALL {
        let n: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |r| r.get(0))
            .unwrap();
        assert_eq!(n as usize, summary.rows(table), "{table} row count");
    }
    drop(conn);

    // Rerun with fewer users replaces the tables.
    config.users.count = 10;
    Pipeline::build(config).unwrap().run().unwrap();
    let conn = rusqlite::Connection::open(dir.path().join(DATABASE_FILE)).unwrap();
    let users: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
        .unwrap();
    assert_eq!(users, 10);
}

#[test]
fn in_memory_sqlite_sink_via_run_into() {
    let pipeline = Pipeline::build(PipelineConfig::default_test()).unwrap();
    let mut sink = SqliteSink::in_memory().unwrap();
    let summary = pipeline.run_into(&mut sink, |_| {}).unwrap();

    assert_eq!(sink.row_count("users").unwrap() as usize, summary.rows(TableKind::Users));
    assert_eq!(sink.row_count("payments").unwrap() as usize, summary.rows(TableKind::Payments));
}
