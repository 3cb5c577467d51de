//! AdmissionGate - コマンドの受け入れ（永続化）
//!
//! # Fail-fast 設計
//! - 前提条件（master の存在、start node の妥当性）は insert の前に一度だけ検査する
//! - 前提条件が一つでも満たされなければ、一件も永続化しない
//!
//! # 重複排除
//! - CommandStore::insert_all がバッチ全体を原子的に check-and-insert する
//! - ストアの障害時は一件も永続化されない
//! - `Conflict` は「既に存在する」としてスキップ（エラーにしない）
//! - 部分的な成功が起きるのはこの場合だけ

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::{BackfillError, BackfillRequest, Command, CommandId, WorkflowDefinitionRef};
use crate::planning::StartNodeValidator;
use crate::ports::{ClusterRegistry, CommandStore, InsertOutcome, NodeRole};

/// Result of one `admit` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdmissionReport {
    /// Newly persisted commands.
    pub admitted: usize,
    /// Commands whose signature was already live.
    pub skipped: usize,
    /// Dry run only: commands that would have been admitted.
    pub previewed: usize,
    pub dry_run: bool,
    pub command_ids: Vec<CommandId>,
}

pub struct AdmissionGate {
    cluster: Arc<dyn ClusterRegistry>,
    commands: Arc<dyn CommandStore>,
    start_nodes: StartNodeValidator,
}

impl AdmissionGate {
    pub fn new(
        cluster: Arc<dyn ClusterRegistry>,
        commands: Arc<dyn CommandStore>,
        start_nodes: StartNodeValidator,
    ) -> Self {
        Self {
            cluster,
            commands,
            start_nodes,
        }
    }

    /// At least one master must be registered to consume commands.
    pub fn check_master(&self) -> Result<(), BackfillError> {
        if self.cluster.list_active_nodes(NodeRole::Master)?.is_empty() {
            return Err(BackfillError::NoMasterAvailable);
        }
        Ok(())
    }

    /// Requested start nodes must all belong to the root graph.
    pub fn check_start_nodes(
        &self,
        request: &BackfillRequest,
        root: &WorkflowDefinitionRef,
    ) -> Result<(), BackfillError> {
        match request.start_nodes() {
            Some(codes) => self.start_nodes.validate(root.code, root.version, codes),
            None => Ok(()),
        }
    }

    /// Persist `commands`, skipping those already live.
    pub fn admit(
        &self,
        commands: Vec<Command>,
        request: &BackfillRequest,
        root: &WorkflowDefinitionRef,
    ) -> Result<AdmissionReport, BackfillError> {
        self.check_master()?;
        self.check_start_nodes(request, root)?;

        let mut report = AdmissionReport {
            dry_run: request.dry_run,
            ..AdmissionReport::default()
        };

        if request.dry_run {
            for command in &commands {
                if self.commands.exists_equivalent(&command.signature())? {
                    report.skipped += 1;
                } else {
                    report.previewed += 1;
                }
            }
            return Ok(report);
        }

        let signatures: Vec<_> = commands.iter().map(Command::signature).collect();
        let outcomes = self.commands.insert_all(commands)?;
        for (signature, outcome) in signatures.iter().zip(outcomes) {
            match outcome {
                InsertOutcome::Inserted(id) => {
                    report.admitted += 1;
                    report.command_ids.push(id);
                }
                InsertOutcome::Conflict => {
                    debug!(signature = %signature, "equivalent command already live, skipping");
                    report.skipped += 1;
                }
            }
        }
        Ok(report)
    }
}
