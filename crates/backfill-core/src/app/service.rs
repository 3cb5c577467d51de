//! BackfillService - バックフィル要求の処理全体
//!
//! Received → [StartNodeValidated] → WindowEnumerated → [DependentsResolved]
//! → CommandsBuilt → Admitted | Rejected
//!
//! 同期的・呼び出し間で状態を持たない。自動リトライはしない
//! （安全な再送は AdmissionGate の重複排除に任せる）。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::BackfillConfig;
use crate::domain::{
    BackfillError, BackfillPhase, BackfillRequest, Command, DefinitionCode, DependentMode,
    WorkflowDefinitionRef,
};
use crate::planning::{
    BuildTarget, CascadeResolver, CommandFactory, DatePartition, TriggerEnumerator, TriggerSeries,
    partition,
};
use crate::ports::{DefinitionStore, ScheduleStore};

use super::admission::{AdmissionGate, AdmissionReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackfillOutcome {
    pub report: AdmissionReport,
    /// Commands built across the root and every cascade target.
    pub commands_built: usize,
    /// Dependent definitions that were cascaded into, in discovery order.
    pub cascade_targets: Vec<DefinitionCode>,
    pub phase: BackfillPhase,
}

impl BackfillOutcome {
    pub fn admitted(&self) -> usize {
        self.report.admitted
    }
}

pub struct BackfillService {
    definitions: Arc<dyn DefinitionStore>,
    schedules: Arc<dyn ScheduleStore>,
    triggers: TriggerEnumerator,
    cascade: CascadeResolver,
    factory: CommandFactory,
    gate: AdmissionGate,
}

impl BackfillService {
    pub(crate) fn new(
        config: &BackfillConfig,
        definitions: Arc<dyn DefinitionStore>,
        schedules: Arc<dyn ScheduleStore>,
        cascade: CascadeResolver,
        factory: CommandFactory,
        gate: AdmissionGate,
    ) -> Self {
        Self {
            definitions,
            schedules,
            triggers: TriggerEnumerator::new(config),
            cascade,
            factory,
            gate,
        }
    }

    /// Plan and admit a backfill. Either every precondition holds and the admitted
    /// count is returned, or exactly one error is returned and nothing is persisted.
    pub fn execute(&self, request: &BackfillRequest) -> Result<BackfillOutcome, BackfillError> {
        let span = info_span!(
            "backfill",
            definition_code = %request.definition_code,
            run_mode = ?request.run_mode,
            dependent_mode = ?request.dependent_mode,
        );
        let _guard = span.enter();

        let mut phase = BackfillPhase::Received;
        match self.run(request, &mut phase) {
            Ok(outcome) => {
                info!(
                    admitted = outcome.report.admitted,
                    skipped = outcome.report.skipped,
                    previewed = outcome.report.previewed,
                    dependents = outcome.cascade_targets.len(),
                    dry_run = request.dry_run,
                    "backfill admitted"
                );
                Ok(outcome)
            }
            Err(err) => {
                reject(&mut phase, &err);
                Err(err)
            }
        }
    }

    fn run(
        &self,
        request: &BackfillRequest,
        phase: &mut BackfillPhase,
    ) -> Result<BackfillOutcome, BackfillError> {
        self.triggers.validate_window(&request.window)?;

        let root = self.load_root(request.definition_code)?;
        let tenant = self.factory.resolve_tenant(request, &root)?;

        if request.start_nodes().is_some() {
            self.gate.check_start_nodes(request, &root)?;
            advance(phase, BackfillPhase::StartNodeValidated);
        }

        let root_series = self.series_for(root.code, request)?;
        advance(phase, BackfillPhase::WindowEnumerated);

        let targets = self.cascade.resolve(root.code, request.dependent_mode)?;
        if request.dependent_mode != DependentMode::Off {
            advance(phase, BackfillPhase::DependentsResolved);
        }

        let mut commands = self.build(request, BuildTarget::Root(&root), &tenant, &root_series)?;
        for target in &targets {
            let series = self.series_for(target.code(), request)?;
            let target = BuildTarget::Dependent {
                root: root.code,
                target,
            };
            commands.extend(self.build(request, target, &tenant, &series)?);
        }
        let commands_built = commands.len();
        advance(phase, BackfillPhase::CommandsBuilt);

        let report = self.gate.admit(commands, request, &root)?;
        advance(phase, BackfillPhase::Admitted);

        Ok(BackfillOutcome {
            report,
            commands_built,
            cascade_targets: targets.iter().map(|t| t.code()).collect(),
            phase: *phase,
        })
    }

    fn load_root(&self, code: DefinitionCode) -> Result<WorkflowDefinitionRef, BackfillError> {
        let definition = self
            .definitions
            .get_definition(code, None)?
            .ok_or(BackfillError::DefinitionNotFound(code))?;
        if !definition.is_online() {
            return Err(BackfillError::DefinitionNotOnline(code));
        }
        Ok(definition)
    }

    fn series_for(
        &self,
        code: DefinitionCode,
        request: &BackfillRequest,
    ) -> Result<TriggerSeries, BackfillError> {
        let schedules = self.schedules.get_active_schedules(code)?;
        self.triggers
            .enumerate(code, &request.window, request.run_mode, &schedules)
    }

    fn build(
        &self,
        request: &BackfillRequest,
        target: BuildTarget<'_>,
        tenant: &str,
        series: &TriggerSeries,
    ) -> Result<Vec<Command>, BackfillError> {
        let code = target.definition().code;
        if series.is_empty() {
            warn!(definition_code = %code, "no fire instants inside the window, nothing to build");
            return Ok(Vec::new());
        }
        let partitions: Vec<DatePartition<DateTime<Utc>>> =
            partition(&series.units, series.parallelism(request.expected_parallelism));
        debug!(
            definition_code = %code,
            units = series.units.len(),
            partitions = partitions.len(),
            "partitioned window"
        );
        self.factory
            .build(request, target, tenant, series.source, &partitions)
    }
}

fn advance(phase: &mut BackfillPhase, next: BackfillPhase) {
    debug!(from = phase.as_str(), to = next.as_str(), "backfill phase");
    *phase = next;
}

/// Move to `Rejected`; returns the phase the call failed in.
fn reject(phase: &mut BackfillPhase, err: &BackfillError) -> BackfillPhase {
    let failed_in = *phase;
    if !failed_in.is_terminal() {
        advance(phase, BackfillPhase::Rejected);
    }
    warn!(
        failed_in = failed_in.as_str(),
        phase = phase.as_str(),
        kind = ?err.kind(),
        error = %err,
        "backfill rejected"
    );
    failed_in
}
