use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backfill_core::domain::{
    BackfillRequest, BackfillWindow, DefinitionCode, DependentEdge, DependentMode, ExecutionType,
    ReleaseState, Schedule, TaskCode, TaskRelationEdge, WorkflowDefinitionRef,
};
use backfill_core::impls::{InMemoryCatalog, InMemoryCluster, InMemoryCommandStore, InMemoryTenants};
use backfill_core::ports::{SystemClock, UlidGenerator};
use backfill_core::{BackfillConfig, ServiceBuilder};

const ORDERS: DefinitionCode = DefinitionCode(1001);
const REVENUE: DefinitionCode = DefinitionCode(1002);
const REPORT: DefinitionCode = DefinitionCode(1003);

fn ymd(y: i32, m: u32, d: u32) -> Result<DateTime<Utc>, String> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .ok_or_else(|| format!("invalid date {y}-{m}-{d}"))
}

fn definition(code: DefinitionCode) -> WorkflowDefinitionRef {
    WorkflowDefinitionRef {
        code,
        version: 1,
        project_code: 1,
        release_state: ReleaseState::Online,
        execution_type: ExecutionType::Parallel,
        owner_id: 1,
    }
}

/// orders <- revenue <- report, each on its own schedule.
fn seed_catalog() -> Result<InMemoryCatalog, String> {
    let catalog = InMemoryCatalog::new();
    let (from, until) = (ymd(2020, 1, 1)?, ymd(2030, 1, 1)?);

    for (code, crontab) in [
        (ORDERS, "0 0 * * *"),
        (REVENUE, "0 0 12 * * *"),
        (REPORT, "0 0 6 * * Mon"),
    ] {
        catalog.add_definition(definition(code));
        catalog.add_task_relations(vec![TaskRelationEdge::new(
            code,
            1,
            TaskCode::ROOT,
            TaskCode(code.0 * 10),
        )]);
        catalog.add_schedule(Schedule {
            definition_code: code,
            crontab: crontab.into(),
            start_time: from,
            end_time: until,
            release_state: ReleaseState::Online,
        });
    }

    for (upstream, dependent) in [(ORDERS, REVENUE), (REVENUE, REPORT)] {
        catalog.add_dependent_edge(
            upstream,
            DependentEdge {
                host_task_code: TaskCode::ROOT,
                dependent_definition_code: dependent,
                dependent_definition_version: 1,
                dependent_task_code: TaskCode(dependent.0 * 10),
                worker_group: None,
            },
        );
    }
    Ok(catalog)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backfill_core=debug,backfill_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 引数があれば JSON の設定ファイルとして読む
    let config = match std::env::args().nth(1) {
        Some(path) => BackfillConfig::from_json(&std::fs::read_to_string(&path)?)?,
        None => BackfillConfig::default(),
    };
    tracing::info!(?config, "backfill-cli starting");

    let tenants = InMemoryTenants::new();
    tenants.assign_user(1, "analytics");

    let store = Arc::new(InMemoryCommandStore::new(UlidGenerator::new(SystemClock)));
    let service = ServiceBuilder::new()
        .config(config)
        .catalog(Arc::new(seed_catalog()?))
        .cluster(Arc::new(InMemoryCluster::with_master("127.0.0.1:5678")))
        .commands(store.clone())
        .tenants(Arc::new(tenants))
        .build()?;

    let mut request = BackfillRequest::new(
        ORDERS,
        BackfillWindow::range(ymd(2020, 1, 1)?, ymd(2020, 1, 10)?),
        1,
    );
    request.expected_parallelism = Some(4);
    request.dependent_mode = DependentMode::AllLevel;

    let outcome = service.execute(&request)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    // 同じ要求の再送は何も追加しない
    let again = service.execute(&request)?;
    tracing::info!(
        admitted = again.admitted(),
        skipped = again.report.skipped,
        stored = store.len()?,
        "resubmitted identical request"
    );

    for (id, command) in store.commands()? {
        println!("{id} {}", command.signature());
    }
    Ok(())
}
