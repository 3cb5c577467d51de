//! Backfill request (transient input, one per call).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DefinitionCode, TaskCode};

/// SERIAL: one command over the whole window. PARALLEL: partitioned commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    Serial,
    Parallel,
}

/// How far the backfill cascades into workflows that depend on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependentMode {
    Off,
    SelfLevel,
    AllLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Highest,
    High,
    Medium,
    Low,
    Lowest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureStrategy {
    /// Keep running independent branches after a task fails.
    Continue,
    End,
}

/// Which tasks around `start_node_codes` the runtime should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskDependType {
    TaskOnly,
    TaskPre,
    TaskPost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningType {
    None,
    Success,
    Failure,
    All,
}

/// The historical window to backfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillWindow {
    /// Inclusive range `[start, end]`; `start < end` is required.
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Explicit list of schedule instants (order and duplicates do not matter).
    DateList(Vec<DateTime<Utc>>),
}

impl BackfillWindow {
    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::Range { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillRequest {
    pub definition_code: DefinitionCode,
    pub window: BackfillWindow,
    pub run_mode: RunMode,

    /// Upper bound on PARALLEL commands. `None` means one command per unit;
    /// non-positive values are clamped to 1.
    pub expected_parallelism: Option<i32>,

    /// Partial rerun: only these nodes (validated against the task-relation graph).
    pub start_node_codes: Option<Vec<TaskCode>>,
    pub task_depend_type: TaskDependType,

    pub dependent_mode: DependentMode,
    pub priority: Priority,
    pub failure_strategy: FailureStrategy,
    pub warning_type: WarningType,
    pub warning_group_id: Option<i64>,

    /// Empty means "use the configured default group".
    pub worker_group: String,
    pub environment_code: Option<i64>,

    /// Explicit tenant; when absent the definition owner's tenant is used.
    pub tenant_code: Option<String>,
    pub executor_id: i64,

    /// Global parameter overrides for the root workflow.
    pub start_params: BTreeMap<String, String>,

    pub dry_run: bool,
    pub test_flag: bool,
}

impl BackfillRequest {
    /// A PARALLEL request with no cascade and conservative defaults.
    pub fn new(definition_code: DefinitionCode, window: BackfillWindow, executor_id: i64) -> Self {
        Self {
            definition_code,
            window,
            run_mode: RunMode::Parallel,
            expected_parallelism: None,
            start_node_codes: None,
            task_depend_type: TaskDependType::TaskPost,
            dependent_mode: DependentMode::Off,
            priority: Priority::Medium,
            failure_strategy: FailureStrategy::Continue,
            warning_type: WarningType::None,
            warning_group_id: None,
            worker_group: String::new(),
            environment_code: None,
            tenant_code: None,
            executor_id,
            start_params: BTreeMap::new(),
            dry_run: false,
            test_flag: false,
        }
    }

    /// Start nodes, if a non-empty subset was requested.
    pub fn start_nodes(&self) -> Option<&[TaskCode]> {
        self.start_node_codes
            .as_deref()
            .filter(|codes| !codes.is_empty())
    }
}
