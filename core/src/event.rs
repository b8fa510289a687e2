//! Pipeline progress events.
//!
//! RULE: The pipeline reports progress ONLY through these events.
//! Presentation (console lines, summaries) belongs to the caller.

use crate::types::TableKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunStarted {
        seed: u64,
        steps: usize,
        output_dir: PathBuf,
    },
    StepStarted {
        /// 1-based position of the step.
        index: usize,
        total: usize,
        table: TableKind,
    },
    StepCompleted {
        index: usize,
        total: usize,
        table: TableKind,
        rows: usize,
        path: PathBuf,
        elapsed_ms: u64,
    },
    TableReleased {
        table: TableKind,
    },
    RunCompleted {
        elapsed_ms: u64,
    },
}

impl PipelineEvent {
    /// Stable name of the variant, used as the log prefix.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::RunStarted { .. }    => "run_started",
            PipelineEvent::StepStarted { .. }   => "step_started",
            PipelineEvent::StepCompleted { .. } => "step_completed",
            PipelineEvent::TableReleased { .. } => "table_released",
            PipelineEvent::RunCompleted { .. }  => "run_completed",
        }
    }
}
