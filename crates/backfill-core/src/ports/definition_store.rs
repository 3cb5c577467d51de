//! DefinitionStore port - 公開済みワークフロー定義と task-relation graph

use crate::domain::errors::StoreError;
use crate::domain::{DefinitionCode, TaskRelationEdge, WorkflowDefinitionRef};

pub trait DefinitionStore: Send + Sync {
    /// Definition by code; `version = None` returns the current version.
    fn get_definition(
        &self,
        code: DefinitionCode,
        version: Option<i32>,
    ) -> Result<Option<WorkflowDefinitionRef>, StoreError>;

    /// All task-relation edges of one definition version.
    fn get_task_relations(
        &self,
        code: DefinitionCode,
        version: i32,
    ) -> Result<Vec<TaskRelationEdge>, StoreError>;
}
