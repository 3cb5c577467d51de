//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryCluster**: ClusterRegistry
//! - **InMemoryCatalog**: DefinitionStore + DependencyStore + ScheduleStore
//! - **InMemoryCommandStore**: CommandStore（signature 単位の原子的 insert）
//! - **InMemoryTenants**: TenantStore
//!
//! 本番用の実装（RDB など）は別クレートに置く想定。

pub mod inmem_catalog;
pub mod inmem_cluster;
pub mod inmem_commands;
pub mod inmem_tenants;

pub use self::inmem_catalog::InMemoryCatalog;
pub use self::inmem_cluster::InMemoryCluster;
pub use self::inmem_commands::InMemoryCommandStore;
pub use self::inmem_tenants::InMemoryTenants;
