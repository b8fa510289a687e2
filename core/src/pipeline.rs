//! The generation pipeline.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Users
//!   2. Sessions       (reads users)
//!   3. Events         (reads sessions)
//!   4. Subscriptions  (reads users)
//!   5. Payments       (reads subscriptions)
//!
//! RULES:
//!   - Steps execute in registration order; each table is fully
//!     materialized before the next step starts.
//!   - Each table is persisted immediately after it is generated.
//!   - A table is dropped from memory once no later step requires it.
//!   - All randomness flows through the RngBank, one stream per step.
//!   - Any failure aborts the run. Tables already written stay on disk.

use crate::{
    config::{OutputFormat, PipelineConfig},
    error::{DatagenError, DatagenResult},
    event::PipelineEvent,
    rng::RngBank,
    sink::{CsvSink, SqliteSink, TableSink, WriteReport},
    step::{Dataset, EventsStep, PaymentsStep, SessionsStep, Step, SubscriptionsStep, UsersStep},
    types::TableKind,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed:       u64,
    pub tables:     Vec<WriteReport>,
    pub elapsed:    Duration,
    pub output_dir: PathBuf,
}

impl RunSummary {
    /// Rows written for `table`, zero if the table was not produced.
    pub fn rows(&self, table: TableKind) -> usize {
        self.tables
            .iter()
            .find(|r| r.table == table)
            .map(|r| r.rows)
            .unwrap_or(0)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|r| r.rows).sum()
    }
}

pub struct Pipeline {
    pub config: PipelineConfig,
    rng_bank:   RngBank,
    steps:      Vec<Box<dyn Step>>,
}

impl Pipeline {
    /// An empty pipeline. The seed is fixed here: the configured one, or
    /// one derived from the wall clock.
    pub fn new(config: PipelineConfig) -> Self {
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = seed_from_clock();
                log::info!("no seed configured; using {seed} (pass it back to reproduce this run)");
                seed
            }
        };
        Self {
            config,
            rng_bank: RngBank::new(seed),
            steps: Vec::new(),
        }
    }

    /// Build a fully wired pipeline with all steps registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(config: PipelineConfig) -> DatagenResult<Self> {
        config.validate()?;
        let mut pipeline = Pipeline::new(config);

        // Execution order is fixed; validate_order() enforces it.
        pipeline.register(Box::new(UsersStep));
        pipeline.register(Box::new(SessionsStep));
        pipeline.register(Box::new(EventsStep));
        pipeline.register(Box::new(SubscriptionsStep));
        pipeline.register(Box::new(PaymentsStep));

        pipeline.validate_order()?;
        Ok(pipeline)
    }

    /// Register a step. Call in the documented execution order.
    pub fn register(&mut self, step: Box<dyn Step>) {
        self.steps.push(step);
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Every table a step requires must be produced by an earlier step.
    pub fn validate_order(&self) -> DatagenResult<()> {
        let mut produced: HashSet<TableKind> = HashSet::new();
        for step in &self.steps {
            if let Some(missing) = step.requires().iter().find(|t| !produced.contains(*t)) {
                return Err(DatagenError::StepOutOfOrder {
                    step: step.name(),
                    missing: *missing,
                });
            }
            produced.insert(step.produces());
        }
        Ok(())
    }

    /// For each step index, the tables that can be dropped once it is done.
    fn release_schedule(&self) -> Vec<Vec<TableKind>> {
        let mut last_use: Vec<(TableKind, usize)> = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            for table in step.requires().iter().copied().chain([step.produces()]) {
                match last_use.iter_mut().find(|(t, _)| *t == table) {
                    Some(entry) => entry.1 = i,
                    None => last_use.push((table, i)),
                }
            }
        }
        let mut schedule = vec![Vec::new(); self.steps.len()];
        for (table, i) in last_use {
            schedule[i].push(table);
        }
        schedule
    }

    /// Run into the sink selected by `config.output_format`.
    pub fn run(&self) -> DatagenResult<RunSummary> {
        self.run_with(|_| {})
    }

    /// As run(), reporting progress to `observer`.
    pub fn run_with(&self, observer: impl FnMut(&PipelineEvent)) -> DatagenResult<RunSummary> {
        match self.config.output_format {
            OutputFormat::Csv => {
                let mut sink = CsvSink::create(&self.config.output_dir)?;
                self.run_into(&mut sink, observer)
            }
            OutputFormat::Sqlite => {
                let mut sink = SqliteSink::create(&self.config.output_dir)?;
                self.run_into(&mut sink, observer)
            }
        }
    }

    /// Execute every step in order, persisting each table into `sink`.
    pub fn run_into<S: TableSink>(
        &self,
        sink: &mut S,
        mut observer: impl FnMut(&PipelineEvent),
    ) -> DatagenResult<RunSummary> {
        self.validate_order()?;

        let started = Instant::now();
        let total = self.steps.len();
        let schedule = self.release_schedule();
        let mut dataset = Dataset::default();
        let mut tables = Vec::with_capacity(total);

        emit(&mut observer, PipelineEvent::RunStarted {
            seed: self.seed(),
            steps: total,
            output_dir: self.config.output_dir.clone(),
        })?;

        for (i, step) in self.steps.iter().enumerate() {
            let index = i + 1;
            let table = step.produces();
            emit(&mut observer, PipelineEvent::StepStarted { index, total, table })?;

            let step_started = Instant::now();
            let mut rng = self.rng_bank.for_slot(step.slot());
            step.execute(&mut dataset, &self.config, &mut rng)?;
            let report = dataset.persist(table, sink)?;

            emit(&mut observer, PipelineEvent::StepCompleted {
                index,
                total,
                table,
                rows: report.rows,
                path: report.path.clone(),
                elapsed_ms: millis(step_started.elapsed()),
            })?;
            tables.push(report);

            for released in &schedule[i] {
                dataset.release(*released);
                emit(&mut observer, PipelineEvent::TableReleased { table: *released })?;
            }
        }

        let elapsed = started.elapsed();
        emit(&mut observer, PipelineEvent::RunCompleted {
            elapsed_ms: millis(elapsed),
        })?;

        Ok(RunSummary {
            seed: self.seed(),
            tables,
            elapsed,
            output_dir: self.config.output_dir.clone(),
        })
    }
}

fn emit(observer: &mut impl FnMut(&PipelineEvent), event: PipelineEvent) -> DatagenResult<()> {
    log::debug!("{}: {}", event.kind(), serde_json::to_string(&event)?);
    observer(&event);
    Ok(())
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn seed_from_clock() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
