//! Catalog snapshots read from the outside world.
//!
//! These are read-only inputs: published workflow definitions, their task-relation
//! edges, cross-workflow dependency edges and cron schedules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DefinitionCode, TaskCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseState {
    Online,
    Offline,
}

/// How concurrent instances of one definition are arranged by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    Parallel,
    SerialWait,
    SerialDiscard,
    SerialPriority,
}

/// Immutable published snapshot of a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinitionRef {
    pub code: DefinitionCode,
    pub version: i32,
    pub project_code: i64,
    pub release_state: ReleaseState,
    pub execution_type: ExecutionType,
    /// User that owns the definition; its tenant is the fallback tenant.
    pub owner_id: i64,
}

impl WorkflowDefinitionRef {
    pub fn is_online(&self) -> bool {
        self.release_state == ReleaseState::Online
    }
}

/// Directed precedence edge inside one definition version.
///
/// `pre_task_code == TaskCode::ROOT` marks an edge from the synthetic root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRelationEdge {
    pub pre_task_code: TaskCode,
    pub pre_task_version: i32,
    pub post_task_code: TaskCode,
    pub post_task_version: i32,
    pub definition_code: DefinitionCode,
    pub definition_version: i32,
}

impl TaskRelationEdge {
    /// Edge `pre -> post` at version 1 of both tasks.
    pub fn new(definition_code: DefinitionCode, definition_version: i32, pre: TaskCode, post: TaskCode) -> Self {
        Self {
            pre_task_code: pre,
            pre_task_version: 1,
            post_task_code: post,
            post_task_version: 1,
            definition_code,
            definition_version,
        }
    }
}

/// Cross-workflow dependency, looked up in reverse: "who depends on `host`?".
///
/// The edge is stored on the upstream side: `host_task_code` lives in the
/// definition being backfilled, `dependent_task_code` is the DEPENDENT-type task of
/// `dependent_definition_code` that waits on it. A `host_task_code` of
/// `TaskCode::ROOT` means the dependency is on the whole upstream workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentEdge {
    pub host_task_code: TaskCode,
    pub dependent_definition_code: DefinitionCode,
    pub dependent_definition_version: i32,
    pub dependent_task_code: TaskCode,
    pub worker_group: Option<String>,
}

/// A cron schedule attached to a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub definition_code: DefinitionCode,
    pub crontab: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub release_state: ReleaseState,
}

impl Schedule {
    pub fn is_active(&self) -> bool {
        self.release_state == ReleaseState::Online
    }
}
