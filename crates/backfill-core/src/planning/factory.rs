//! CommandFactory - パーティションから Command を組み立てる
//!
//! 副作用なし（テナントの参照のみ）。永続化は AdmissionGate の責務。
//! 出力は window_start の昇順（再実行時も同じ順序になる）。

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::BackfillConfig;
use crate::domain::{
    BackfillError, BackfillRequest, Command, CommandParam, CommandType, DefinitionCode,
    WorkflowDefinitionRef,
};
use crate::planning::cascade::CascadeTarget;
use crate::planning::partition::DatePartition;
use crate::planning::triggers::SeriesSource;
use crate::ports::{Clock, TenantStore};

/// What a batch of commands is built for.
#[derive(Debug, Clone, Copy)]
pub enum BuildTarget<'a> {
    /// The definition named in the request.
    Root(&'a WorkflowDefinitionRef),
    /// A definition reached through the dependency cascade of `root`.
    Dependent {
        root: DefinitionCode,
        target: &'a CascadeTarget,
    },
}

impl<'a> BuildTarget<'a> {
    pub fn definition(&self) -> &'a WorkflowDefinitionRef {
        match *self {
            BuildTarget::Root(definition) => definition,
            BuildTarget::Dependent { target, .. } => &target.definition,
        }
    }
}

pub struct CommandFactory {
    tenants: Arc<dyn TenantStore>,
    clock: Arc<dyn Clock>,
    date_format: String,
    default_worker_group: String,
}

impl CommandFactory {
    pub fn new(tenants: Arc<dyn TenantStore>, clock: Arc<dyn Clock>, config: &BackfillConfig) -> Self {
        Self {
            tenants,
            clock,
            date_format: config.date_format.clone(),
            default_worker_group: config.default_worker_group.clone(),
        }
    }

    /// Explicit tenant if it exists, otherwise the definition owner's tenant.
    pub fn resolve_tenant(
        &self,
        request: &BackfillRequest,
        definition: &WorkflowDefinitionRef,
    ) -> Result<String, BackfillError> {
        let requested = request.tenant_code.as_deref().filter(|t| !t.is_empty());
        self.tenants
            .resolve_tenant(requested, definition.owner_id)?
            .ok_or_else(|| {
                BackfillError::TenantNotFound(match requested {
                    Some(code) => code.to_string(),
                    None => format!("<owner {}>", definition.owner_id),
                })
            })
    }

    /// One command per partition, ordered by window start.
    pub fn build(
        &self,
        request: &BackfillRequest,
        target: BuildTarget<'_>,
        tenant_code: &str,
        source: SeriesSource,
        partitions: &[DatePartition<DateTime<Utc>>],
    ) -> Result<Vec<Command>, BackfillError> {
        let definition = target.definition();
        let worker_group = self.worker_group(request, target);
        let submitted_at = self.clock.now();

        let mut commands = partitions
            .iter()
            .map(|partition| -> Result<Command, BackfillError> {
                let param = self.param(request, target, source, partition);
                Ok(Command {
                    definition_code: definition.code,
                    definition_version: definition.version,
                    command_type: CommandType::ComplementData,
                    command_param: serde_json::to_string(&param)?,
                    window_start: partition.start_boundary,
                    window_end: partition.end_boundary,
                    cascade_target: match target {
                        BuildTarget::Root(_) => None,
                        BuildTarget::Dependent { root, .. } => Some(root),
                    },
                    schedule_dates: match source {
                        SeriesSource::DateList => partition.members.clone(),
                        _ => Vec::new(),
                    },
                    worker_group: worker_group.clone(),
                    tenant_code: tenant_code.to_string(),
                    environment_code: request.environment_code,
                    warning_type: request.warning_type,
                    warning_group_id: request.warning_group_id,
                    failure_strategy: request.failure_strategy,
                    task_depend_type: request.task_depend_type,
                    executor_id: request.executor_id,
                    priority: request.priority,
                    dry_run: request.dry_run,
                    test_flag: request.test_flag,
                    submitted_at,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        commands.sort_by_key(|c| c.window_start);
        Ok(commands)
    }

    fn worker_group(&self, request: &BackfillRequest, target: BuildTarget<'_>) -> String {
        let edge_group = match target {
            BuildTarget::Root(_) => None,
            BuildTarget::Dependent { target, .. } => target.worker_group.as_deref(),
        };
        edge_group
            .or(Some(request.worker_group.as_str()).filter(|g| !g.is_empty()))
            .unwrap_or(&self.default_worker_group)
            .to_string()
    }

    fn param(
        &self,
        request: &BackfillRequest,
        target: BuildTarget<'_>,
        source: SeriesSource,
        partition: &DatePartition<DateTime<Utc>>,
    ) -> CommandParam {
        let format = |t: &DateTime<Utc>| t.format(&self.date_format).to_string();

        let complement_schedule_date_list = (source == SeriesSource::DateList).then(|| {
            partition
                .members
                .iter()
                .map(format)
                .collect::<Vec<_>>()
                .join(",")
        });

        let (start_node_list, start_params, complement_dependent) = match target {
            BuildTarget::Root(_) => (
                request.start_nodes().map(|codes| {
                    codes
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                }),
                request.start_params.clone(),
                None,
            ),
            // Start nodes and parameter overrides only apply to the root graph.
            BuildTarget::Dependent { root, target } => {
                (None, Default::default(), Some(target.origin(root)))
            }
        };

        CommandParam {
            complement_start_date: format(&partition.start_boundary),
            complement_end_date: format(&partition.end_boundary),
            complement_schedule_date_list,
            start_node_list,
            complement_dependent,
            start_params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BackfillWindow, ExecutionType, ReleaseState, RunMode, TaskCode};
    use crate::impls::InMemoryTenants;
    use crate::planning::partition::partition;
    use crate::ports::FixedClock;
    use chrono::{Duration, TimeZone};

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap()
    }

    fn definition(code: i64) -> WorkflowDefinitionRef {
        WorkflowDefinitionRef {
            code: DefinitionCode(code),
            version: 4,
            project_code: 1,
            release_state: ReleaseState::Online,
            execution_type: ExecutionType::Parallel,
            owner_id: 7,
        }
    }

    fn factory() -> CommandFactory {
        let tenants = InMemoryTenants::new();
        tenants.add_tenant("analytics");
        tenants.assign_user(7, "owner-tenant");
        CommandFactory::new(
            Arc::new(tenants),
            Arc::new(FixedClock::new(at(20))),
            &BackfillConfig::default(),
        )
    }

    fn request() -> BackfillRequest {
        BackfillRequest::new(DefinitionCode(1), BackfillWindow::range(at(1), at(5)), 7)
    }

    fn days(n: u32) -> Vec<DateTime<Utc>> {
        (0..n).map(|i| at(1) + Duration::days(i64::from(i))).collect()
    }

    #[test]
    fn one_command_per_partition_in_start_order() {
        let def = definition(1);
        let parts = partition(&days(5), 3);
        let commands = factory()
            .build(&request(), BuildTarget::Root(&def), "t", SeriesSource::CalendarDays, &parts)
            .unwrap();

        assert_eq!(commands.len(), 3);
        assert!(commands.windows(2).all(|w| w[0].window_start < w[1].window_start));
        assert_eq!(commands[0].definition_version, 4);
        assert_eq!(commands[0].cascade_target, None);
        assert_eq!(commands[0].submitted_at, at(20));

        let param = commands[2].param().unwrap();
        assert_eq!(param.complement_start_date, "2020-01-05 00:00:00");
        assert_eq!(param.complement_end_date, "2020-01-05 00:00:00");
        assert_eq!(param.complement_schedule_date_list, None);
    }

    #[test]
    fn root_param_carries_start_nodes_and_params() {
        let def = definition(1);
        let mut req = request();
        req.start_node_codes = Some(vec![TaskCode(3), TaskCode(5)]);
        req.start_params.insert("bizdate".into(), "${system.biz.date}".into());
        let parts = partition(&days(2), 1);
        let commands = factory()
            .build(&req, BuildTarget::Root(&def), "t", SeriesSource::CalendarDays, &parts)
            .unwrap();
        let param = commands[0].param().unwrap();
        assert_eq!(param.start_node_list.as_deref(), Some("3,5"));
        assert_eq!(param.start_params["bizdate"], "${system.biz.date}");
        assert!(param.complement_dependent.is_none());
    }

    #[test]
    fn dependent_commands_drop_root_only_fields() {
        let mut req = request();
        req.start_node_codes = Some(vec![TaskCode(3)]);
        req.start_params.insert("k".into(), "v".into());
        req.worker_group = "root-group".into();
        let target = CascadeTarget {
            definition: definition(2),
            upstream: DefinitionCode(1),
            host_task_code: TaskCode::ROOT,
            dependent_task_code: TaskCode(20),
            worker_group: Some("edge-group".into()),
            level: 1,
        };
        let parts = partition(&days(2), 2);
        let commands = factory()
            .build(
                &req,
                BuildTarget::Dependent { root: DefinitionCode(1), target: &target },
                "t",
                SeriesSource::CronFireTimes,
                &parts,
            )
            .unwrap();

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].definition_code, DefinitionCode(2));
        assert_eq!(commands[0].worker_group, "edge-group");
        assert_eq!(commands[0].cascade_target, Some(DefinitionCode(1)));
        let param = commands[0].param().unwrap();
        assert!(param.start_node_list.is_none());
        assert!(param.start_params.is_empty());
        let origin = param.complement_dependent.unwrap();
        assert_eq!(origin.root_definition_code, DefinitionCode(1));
        assert_eq!(origin.dependent_task_code, TaskCode(20));
    }

    #[test]
    fn worker_group_falls_back_to_request_then_default() {
        let f = factory();
        let def = definition(1);
        let mut req = request();
        assert_eq!(f.worker_group(&req, BuildTarget::Root(&def)), "default");
        req.worker_group = "gpu".into();
        assert_eq!(f.worker_group(&req, BuildTarget::Root(&def)), "gpu");

        let target = CascadeTarget {
            definition: definition(2),
            upstream: DefinitionCode(1),
            host_task_code: TaskCode::ROOT,
            dependent_task_code: TaskCode(20),
            worker_group: None,
            level: 1,
        };
        let dependent = BuildTarget::Dependent { root: DefinitionCode(1), target: &target };
        assert_eq!(f.worker_group(&req, dependent), "gpu");
    }

    #[test]
    fn date_list_chunks_are_listed_in_param() {
        let def = definition(1);
        let parts = partition(&[at(1), at(3), at(9)], 2);
        let commands = factory()
            .build(&request(), BuildTarget::Root(&def), "t", SeriesSource::DateList, &parts)
            .unwrap();
        let first = commands[0].param().unwrap();
        assert_eq!(
            first.complement_schedule_date_list.as_deref(),
            Some("2020-01-01 00:00:00,2020-01-03 00:00:00")
        );
        assert_eq!(commands[0].schedule_dates, vec![at(1), at(3)]);
        assert_eq!(commands[1].signature().schedule_dates, vec![at(9)]);
    }

    #[test]
    fn dry_run_and_test_flag_are_copied() {
        let def = definition(1);
        let mut req = request();
        req.dry_run = true;
        req.test_flag = true;
        req.run_mode = RunMode::Serial;
        let parts = partition(&[at(1), at(5)], 1);
        let commands = factory()
            .build(&req, BuildTarget::Root(&def), "t", SeriesSource::WholeWindow, &parts)
            .unwrap();
        assert!(commands[0].dry_run);
        assert!(commands[0].test_flag);
    }

    #[test]
    fn tenant_resolution() {
        let f = factory();
        let def = definition(1);
        let mut req = request();
        assert_eq!(f.resolve_tenant(&req, &def).unwrap(), "owner-tenant");

        req.tenant_code = Some("analytics".into());
        assert_eq!(f.resolve_tenant(&req, &def).unwrap(), "analytics");

        req.tenant_code = Some("ghost".into());
        assert!(matches!(
            f.resolve_tenant(&req, &def),
            Err(BackfillError::TenantNotFound(code)) if code == "ghost"
        ));
    }
}
