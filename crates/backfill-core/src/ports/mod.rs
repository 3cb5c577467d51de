//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。コアが呼び出す外部協調者
//! （クラスタレジストリ、定義・依存・スケジュール・コマンド・テナントの各ストア）を
//! trait として定義し、実装の詳細を隠蔽する。
//!
//! # 設計原則
//! - コアは同期的で、呼び出しスレッド上で完結する
//! - 重複排除の権威は CommandStore::insert（原子的な check-and-insert）にある
//! - すべての trait は `Send + Sync`（複数の呼び出しから共有される）

pub mod clock;
pub mod cluster_registry;
pub mod command_store;
pub mod definition_store;
pub mod dependency_store;
pub mod id_generator;
pub mod schedule_store;
pub mod tenant_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::cluster_registry::{ClusterRegistry, NodeRole};
pub use self::command_store::{CommandStore, InsertOutcome};
pub use self::definition_store::DefinitionStore;
pub use self::dependency_store::DependencyStore;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::schedule_store::ScheduleStore;
pub use self::tenant_store::TenantStore;
pub use crate::domain::errors::StoreError;
