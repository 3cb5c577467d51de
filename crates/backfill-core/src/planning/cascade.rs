//! Dependency cascade: which other workflows must be backfilled too.
//!
//! Design:
//! - Edges are read in reverse ("who depends on me?") from the dependency store.
//! - Breadth-first over definitions, with a visited set keyed by definition code.
//! - Invariant: every definition is emitted at most once, and the root never is.
//!   This makes traversal terminate on cyclic graphs and collapses diamonds.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{
    BackfillError, CascadeOrigin, DefinitionCode, DependentEdge, DependentMode, TaskCode,
    WorkflowDefinitionRef,
};
use crate::ports::{DefinitionStore, DependencyStore};

/// A dependent definition discovered by the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeTarget {
    pub definition: WorkflowDefinitionRef,
    /// Definition whose dependents list contained this one.
    pub upstream: DefinitionCode,
    pub host_task_code: TaskCode,
    pub dependent_task_code: TaskCode,
    /// Worker group declared on the dependent edge, if any.
    pub worker_group: Option<String>,
    /// Hops from the root (1 = direct dependent).
    pub level: u32,
}

impl CascadeTarget {
    pub fn code(&self) -> DefinitionCode {
        self.definition.code
    }

    pub fn origin(&self, root: DefinitionCode) -> CascadeOrigin {
        CascadeOrigin {
            root_definition_code: root,
            upstream_definition_code: self.upstream,
            host_task_code: self.host_task_code,
            dependent_task_code: self.dependent_task_code,
            level: self.level,
        }
    }
}

pub struct CascadeResolver {
    dependencies: Arc<dyn DependencyStore>,
    definitions: Arc<dyn DefinitionStore>,
}

impl CascadeResolver {
    pub fn new(dependencies: Arc<dyn DependencyStore>, definitions: Arc<dyn DefinitionStore>) -> Self {
        Self {
            dependencies,
            definitions,
        }
    }

    /// Dependents of `root` in discovery (BFS) order.
    ///
    /// An empty result is a normal outcome.
    pub fn resolve(
        &self,
        root: DefinitionCode,
        mode: DependentMode,
    ) -> Result<Vec<CascadeTarget>, BackfillError> {
        let max_level = match mode {
            DependentMode::Off => return Ok(Vec::new()),
            DependentMode::SelfLevel => 1,
            DependentMode::AllLevel => u32::MAX,
        };

        let mut visited: HashSet<DefinitionCode> = HashSet::from([root]);
        let mut frontier: VecDeque<(DefinitionCode, u32)> = VecDeque::from([(root, 0)]);
        let mut targets = Vec::new();

        while let Some((code, level)) = frontier.pop_front() {
            if level >= max_level {
                continue;
            }
            let mut edges = self.dependencies.get_dependent_edges_referencing(code)?;
            // Deterministic order regardless of store iteration order.
            edges.sort_by_key(|e| (e.dependent_definition_code, e.dependent_task_code));

            let before = targets.len();
            for edge in edges {
                if !visited.insert(edge.dependent_definition_code) {
                    continue;
                }
                let Some(definition) = self.load(&edge)? else {
                    continue;
                };
                let next_level = level + 1;
                frontier.push_back((definition.code, next_level));
                targets.push(CascadeTarget {
                    definition,
                    upstream: code,
                    host_task_code: edge.host_task_code,
                    dependent_task_code: edge.dependent_task_code,
                    worker_group: edge.worker_group.filter(|g| !g.is_empty()),
                    level: next_level,
                });
            }
            debug!(
                definition_code = %code,
                level,
                discovered = targets.len() - before,
                "expanded dependents"
            );
        }

        Ok(targets)
    }

    /// Online definition behind `edge`; `None` (skipped) when it is offline.
    fn load(&self, edge: &DependentEdge) -> Result<Option<WorkflowDefinitionRef>, BackfillError> {
        let code = edge.dependent_definition_code;
        let version = edge.dependent_definition_version;
        let definition = self
            .definitions
            .get_definition(code, Some(version))?
            .ok_or(BackfillError::DependentDefinitionNotFound { code, version })?;
        if !definition.is_online() {
            warn!(
                definition_code = %code,
                version,
                "dependent definition is offline, not cascading into it"
            );
            return Ok(None);
        }
        Ok(Some(definition))
    }
}
