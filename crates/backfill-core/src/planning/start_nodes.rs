//! Start node validation for partial reruns.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::{BackfillError, DefinitionCode, TaskCode, TaskRelationEdge};
use crate::ports::DefinitionStore;

/// Every task code that appears in the edge set, minus the synthetic root.
pub fn graph_nodes(edges: &[TaskRelationEdge]) -> BTreeSet<TaskCode> {
    edges
        .iter()
        .flat_map(|edge| [edge.pre_task_code, edge.post_task_code])
        .filter(|code| !code.is_root())
        .collect()
}

pub struct StartNodeValidator {
    definitions: Arc<dyn DefinitionStore>,
}

impl StartNodeValidator {
    pub fn new(definitions: Arc<dyn DefinitionStore>) -> Self {
        Self { definitions }
    }

    /// All-or-nothing: a single unknown candidate rejects the whole set.
    pub fn validate(
        &self,
        definition_code: DefinitionCode,
        version: i32,
        candidates: &[TaskCode],
    ) -> Result<(), BackfillError> {
        let edges = self.definitions.get_task_relations(definition_code, version)?;
        let nodes = graph_nodes(&edges);

        let missing: Vec<TaskCode> = candidates
            .iter()
            .filter(|code| !nodes.contains(code))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(BackfillError::StartNodeNotInGraph {
                definition_code,
                version,
                missing,
            });
        }
        Ok(())
    }
}
