//! ServiceBuilder - BackfillService の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - 必須の port が一つでも未設定なら build() が BuildError を返す
//! - 不足している port はまとめて報告する
//! - Clock と BackfillConfig は省略可能（SystemClock / デフォルト値）

use std::sync::Arc;

use crate::config::BackfillConfig;
use crate::planning::{CascadeResolver, CommandFactory, StartNodeValidator};
use crate::ports::{
    Clock, ClusterRegistry, CommandStore, DefinitionStore, DependencyStore, ScheduleStore,
    SystemClock, TenantStore,
};

use super::admission::AdmissionGate;
use super::service::BackfillService;

/// # 使用例
/// ```ignore
/// let service = ServiceBuilder::new()
///     .catalog(catalog)
///     .cluster(cluster)
///     .commands(store)
///     .tenants(tenants)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ServiceBuilder {
    config: BackfillConfig,
    clock: Option<Arc<dyn Clock>>,
    cluster: Option<Arc<dyn ClusterRegistry>>,
    definitions: Option<Arc<dyn DefinitionStore>>,
    dependencies: Option<Arc<dyn DependencyStore>>,
    schedules: Option<Arc<dyn ScheduleStore>>,
    commands: Option<Arc<dyn CommandStore>>,
    tenants: Option<Arc<dyn TenantStore>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These must be set before build().")]
    MissingPorts(Vec<&'static str>),
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: BackfillConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn cluster(mut self, cluster: Arc<dyn ClusterRegistry>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn definitions(mut self, definitions: Arc<dyn DefinitionStore>) -> Self {
        self.definitions = Some(definitions);
        self
    }

    pub fn dependencies(mut self, dependencies: Arc<dyn DependencyStore>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn schedules(mut self, schedules: Arc<dyn ScheduleStore>) -> Self {
        self.schedules = Some(schedules);
        self
    }

    pub fn commands(mut self, commands: Arc<dyn CommandStore>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn tenants(mut self, tenants: Arc<dyn TenantStore>) -> Self {
        self.tenants = Some(tenants);
        self
    }

    /// One store serving definitions, dependent edges and schedules.
    pub fn catalog<C>(self, catalog: Arc<C>) -> Self
    where
        C: DefinitionStore + DependencyStore + ScheduleStore + 'static,
    {
        self.definitions(catalog.clone())
            .dependencies(catalog.clone())
            .schedules(catalog)
    }

    pub fn build(self) -> Result<BackfillService, BuildError> {
        let missing: Vec<&'static str> = [
            ("cluster", self.cluster.is_none()),
            ("definitions", self.definitions.is_none()),
            ("dependencies", self.dependencies.is_none()),
            ("schedules", self.schedules.is_none()),
            ("commands", self.commands.is_none()),
            ("tenants", self.tenants.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (
            Some(cluster),
            Some(definitions),
            Some(dependencies),
            Some(schedules),
            Some(commands),
            Some(tenants),
        ) = (
            self.cluster,
            self.definitions,
            self.dependencies,
            self.schedules,
            self.commands,
            self.tenants,
        )
        else {
            return Err(BuildError::MissingPorts(missing));
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let gate = AdmissionGate::new(
            cluster,
            commands,
            StartNodeValidator::new(definitions.clone()),
        );
        Ok(BackfillService::new(
            &self.config,
            definitions.clone(),
            schedules,
            CascadeResolver::new(dependencies, definitions),
            CommandFactory::new(tenants, clock, &self.config),
            gate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryCatalog, InMemoryCluster, InMemoryCommandStore, InMemoryTenants};
    use crate::ports::UlidGenerator;

    fn complete() -> ServiceBuilder {
        ServiceBuilder::new()
            .catalog(Arc::new(InMemoryCatalog::new()))
            .cluster(Arc::new(InMemoryCluster::new()))
            .commands(Arc::new(InMemoryCommandStore::new(UlidGenerator::new(SystemClock))))
            .tenants(Arc::new(InMemoryTenants::new()))
    }

    #[test]
    fn test_build_success() {
        assert!(complete().build().is_ok());
    }

    #[test]
    fn test_build_with_config() {
        let config = BackfillConfig {
            default_worker_group: "etl".into(),
            ..BackfillConfig::default()
        };
        assert!(complete().config(config).build().is_ok());
    }

    #[test]
    fn test_build_missing_ports() {
        let result = ServiceBuilder::new()
            .definitions(Arc::new(InMemoryCatalog::new()))
            .tenants(Arc::new(InMemoryTenants::new()))
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingPorts(missing))
                if missing == vec!["cluster", "dependencies", "schedules", "commands"]
        ));
    }
}
