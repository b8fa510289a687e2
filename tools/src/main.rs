//! pulse-datagen: one-shot synthetic dataset generator for PulseMetrics.
//!
//! Usage:
//!   pulse-datagen
//!   pulse-datagen --config data/pipeline.json --seed 12345 --output-dir out --format sqlite

use anyhow::{Context, Result};
use pulsemetrics_core::{
    config::{OutputFormat, PipelineConfig},
    event::PipelineEvent,
    pipeline::{Pipeline, RunSummary},
    types::TableKind,
};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG: &str = "./data/pipeline.json";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = string_arg(&args, "--config").unwrap_or(DEFAULT_CONFIG);

    let mut config = if Path::new(config_path).exists() {
        PipelineConfig::load(config_path)?
    } else if string_arg(&args, "--config").is_some() {
        anyhow::bail!("config file {config_path} does not exist");
    } else {
        log::warn!("{config_path} not found; using built-in defaults");
        PipelineConfig::default()
    };

    if let Some(seed) = parse_arg::<u64>(&args, "--seed")? {
        config.seed = Some(seed);
    }
    if let Some(dir) = string_arg(&args, "--output-dir") {
        config.output_dir = dir.into();
    }
    if let Some(format) = parse_arg::<OutputFormat>(&args, "--format")? {
        config.output_format = format;
    }
    log::debug!("resolved config: {}", serde_json::to_string(&config)?);

    println!();
    println!("{}", "=".repeat(60));
    println!("  PulseMetrics – Synthetic Data Generation");
    println!("{}", "=".repeat(60));
    println!("  started:    {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("  users:      {}", config.users.count);
    println!("  date range: {} .. {}", config.start_date, config.end_date);
    println!();

    let pipeline = Pipeline::build(config).context("invalid pipeline configuration")?;
    let summary = pipeline
        .run_with(print_progress)
        .context("data generation failed")?;

    print_summary(&summary);
    Ok(())
}

fn print_progress(event: &PipelineEvent) {
    match event {
        PipelineEvent::StepStarted { index, total, table } => {
            println!("[{index}/{total}] Generating {table}...");
        }
        PipelineEvent::StepCompleted { rows, path, .. } => {
            println!("      {rows} rows -> {}", path.display());
        }
        _ => {}
    }
}

fn print_summary(summary: &RunSummary) {
    let output_dir = std::fs::canonicalize(&summary.output_dir)
        .unwrap_or_else(|_| summary.output_dir.clone());

    println!();
    println!("{}", "=".repeat(60));
    println!("  Summary");
    println!("{}", "=".repeat(60));
    for table in TableKind::ALL {
        println!("  {:<15} {}", format!("{}:", capitalize(table.name())), summary.rows(table));
    }
    println!("  {:<15} {}", "Total:", summary.total_rows());
    println!();
    println!("  Seed:           {}", summary.seed);
    println!("  Time elapsed:   {:.2} seconds", summary.elapsed.as_secs_f64());
    println!("  Output dir:     {}", output_dir.display());
    println!("{}", "=".repeat(60));
    println!();
    println!("Data generation complete.");
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    string_arg(args, flag)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid value '{raw}' for {flag}: {e}"))
        })
        .transpose()
}
