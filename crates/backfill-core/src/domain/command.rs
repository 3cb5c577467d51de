//! Command: the persisted unit of backfilled work.
//!
//! A command is built once per partition (and per cascade target), admitted at most
//! once per [`CommandSignature`], and then belongs to the execution runtime.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DefinitionCode, TaskCode};
use super::request::{FailureStrategy, Priority, TaskDependType, WarningType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    /// Re-run a definition over a historical window.
    ComplementData,
}

impl CommandType {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandType::ComplementData => "COMPLEMENT_DATA",
        }
    }
}

/// Metadata attached to commands produced by the dependency cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeOrigin {
    /// Definition the user asked to backfill.
    pub root_definition_code: DefinitionCode,
    /// Definition whose backfill pulled this one in.
    pub upstream_definition_code: DefinitionCode,
    pub host_task_code: TaskCode,
    pub dependent_task_code: TaskCode,
    /// 1 for direct dependents, 2 for their dependents, ...
    pub level: u32,
}

/// Payload stored in `Command::command_param` (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandParam {
    pub complement_start_date: String,
    pub complement_end_date: String,

    /// Comma-separated explicit instants, for date-list windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement_schedule_date_list: Option<String>,

    /// Comma-separated task codes for partial reruns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_list: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement_dependent: Option<CascadeOrigin>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub start_params: BTreeMap<String, String>,
}

/// Identity used for admission de-duplication.
///
/// Two commands with equal signatures are "the same backfill": the second one is
/// skipped at admission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandSignature {
    pub definition_code: DefinitionCode,
    pub definition_version: i32,
    pub command_type: CommandType,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Root definition of the cascade, `None` for directly requested commands.
    pub cascade_target: Option<DefinitionCode>,
    /// Explicit instants of a date-list chunk; empty for range windows.
    pub schedule_dates: Vec<DateTime<Utc>>,
}

impl fmt::Display for CommandSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.definition_code,
            self.definition_version,
            self.command_type.as_str(),
            self.window_start.timestamp(),
            self.window_end.timestamp(),
        )?;
        match self.cascade_target {
            Some(root) => write!(f, ":{root}")?,
            None => write!(f, ":-")?,
        }
        for (i, date) in self.schedule_dates.iter().enumerate() {
            let sep = if i == 0 { ':' } else { ',' };
            write!(f, "{sep}{}", date.timestamp())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub definition_code: DefinitionCode,
    pub definition_version: i32,
    pub command_type: CommandType,
    /// JSON-encoded [`CommandParam`].
    pub command_param: String,

    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub cascade_target: Option<DefinitionCode>,
    /// Explicit instants covered by a date-list chunk; empty for range windows.
    pub schedule_dates: Vec<DateTime<Utc>>,

    pub worker_group: String,
    pub tenant_code: String,
    pub environment_code: Option<i64>,
    pub warning_type: WarningType,
    pub warning_group_id: Option<i64>,
    pub failure_strategy: FailureStrategy,
    pub task_depend_type: TaskDependType,
    pub executor_id: i64,
    pub priority: Priority,
    pub dry_run: bool,
    pub test_flag: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Command {
    pub fn signature(&self) -> CommandSignature {
        CommandSignature {
            definition_code: self.definition_code,
            definition_version: self.definition_version,
            command_type: self.command_type,
            window_start: self.window_start,
            window_end: self.window_end,
            cascade_target: self.cascade_target,
            schedule_dates: self.schedule_dates.clone(),
        }
    }

    /// Decode the JSON payload.
    pub fn param(&self) -> Result<CommandParam, serde_json::Error> {
        serde_json::from_str(&self.command_param)
    }
}
