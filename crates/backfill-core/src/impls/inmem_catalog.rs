//! In-memory catalog: definitions, task relations, dependent edges, schedules.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{
    DefinitionCode, DependentEdge, Schedule, TaskRelationEdge, WorkflowDefinitionRef,
};
use crate::ports::{DefinitionStore, DependencyStore, ScheduleStore, StoreError};

#[derive(Default)]
struct CatalogState {
    /// code -> version -> definition
    definitions: HashMap<DefinitionCode, BTreeMap<i32, WorkflowDefinitionRef>>,
    relations: HashMap<(DefinitionCode, i32), Vec<TaskRelationEdge>>,
    /// Reverse index: upstream definition -> edges of tasks depending on it.
    dependents: HashMap<DefinitionCode, Vec<DependentEdge>>,
    schedules: HashMap<DefinitionCode, Vec<Schedule>>,
}

#[derive(Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn setup(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> Result<MutexGuard<'_, CatalogState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned("catalog"))
    }

    pub fn add_definition(&self, definition: WorkflowDefinitionRef) {
        self.setup()
            .definitions
            .entry(definition.code)
            .or_default()
            .insert(definition.version, definition);
    }

    /// Edges are grouped by the (definition, version) they carry.
    pub fn add_task_relations(&self, edges: Vec<TaskRelationEdge>) {
        let mut state = self.setup();
        for edge in edges {
            state
                .relations
                .entry((edge.definition_code, edge.definition_version))
                .or_default()
                .push(edge);
        }
    }

    /// Record that `edge.dependent_definition_code` depends on `upstream`.
    pub fn add_dependent_edge(&self, upstream: DefinitionCode, edge: DependentEdge) {
        self.setup().dependents.entry(upstream).or_default().push(edge);
    }

    pub fn add_schedule(&self, schedule: Schedule) {
        self.setup()
            .schedules
            .entry(schedule.definition_code)
            .or_default()
            .push(schedule);
    }
}

impl DefinitionStore for InMemoryCatalog {
    fn get_definition(
        &self,
        code: DefinitionCode,
        version: Option<i32>,
    ) -> Result<Option<WorkflowDefinitionRef>, StoreError> {
        let state = self.read()?;
        let Some(versions) = state.definitions.get(&code) else {
            return Ok(None);
        };
        let found = match version {
            Some(v) => versions.get(&v),
            None => versions.values().next_back(),
        };
        Ok(found.cloned())
    }

    fn get_task_relations(
        &self,
        code: DefinitionCode,
        version: i32,
    ) -> Result<Vec<TaskRelationEdge>, StoreError> {
        Ok(self
            .read()?
            .relations
            .get(&(code, version))
            .cloned()
            .unwrap_or_default())
    }
}

impl DependencyStore for InMemoryCatalog {
    fn get_dependent_edges_referencing(
        &self,
        code: DefinitionCode,
    ) -> Result<Vec<DependentEdge>, StoreError> {
        Ok(self.read()?.dependents.get(&code).cloned().unwrap_or_default())
    }
}

impl ScheduleStore for InMemoryCatalog {
    fn get_active_schedules(&self, code: DefinitionCode) -> Result<Vec<Schedule>, StoreError> {
        Ok(self
            .read()?
            .schedules
            .get(&code)
            .map(|all| all.iter().filter(|s| s.is_active()).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionType, ReleaseState, TaskCode};
    use chrono::{TimeZone, Utc};

    fn definition(version: i32) -> WorkflowDefinitionRef {
        WorkflowDefinitionRef {
            code: DefinitionCode(1),
            version,
            project_code: 1,
            release_state: ReleaseState::Online,
            execution_type: ExecutionType::Parallel,
            owner_id: 1,
        }
    }

    #[test]
    fn latest_version_without_explicit_version() {
        let catalog = InMemoryCatalog::new();
        catalog.add_definition(definition(1));
        catalog.add_definition(definition(3));

        let latest = catalog.get_definition(DefinitionCode(1), None).unwrap().unwrap();
        assert_eq!(latest.version, 3);
        let pinned = catalog.get_definition(DefinitionCode(1), Some(1)).unwrap().unwrap();
        assert_eq!(pinned.version, 1);
        assert!(catalog.get_definition(DefinitionCode(2), None).unwrap().is_none());
    }

    #[test]
    fn relations_are_keyed_by_version() {
        let catalog = InMemoryCatalog::new();
        catalog.add_task_relations(vec![
            TaskRelationEdge::new(DefinitionCode(1), 1, TaskCode::ROOT, TaskCode(1)),
            TaskRelationEdge::new(DefinitionCode(1), 2, TaskCode::ROOT, TaskCode(2)),
        ]);
        assert_eq!(catalog.get_task_relations(DefinitionCode(1), 1).unwrap().len(), 1);
        assert!(catalog.get_task_relations(DefinitionCode(1), 9).unwrap().is_empty());
    }

    #[test]
    fn only_online_schedules_are_active() {
        let catalog = InMemoryCatalog::new();
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        for state in [ReleaseState::Online, ReleaseState::Offline] {
            catalog.add_schedule(Schedule {
                definition_code: DefinitionCode(1),
                crontab: "0 0 0 * * *".into(),
                start_time: at,
                end_time: at,
                release_state: state,
            });
        }
        assert_eq!(catalog.get_active_schedules(DefinitionCode(1)).unwrap().len(), 1);
    }
}
