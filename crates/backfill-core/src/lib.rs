//! backfill-core
//!
//! Turns a backfill request (a workflow definition plus a historical time window) into
//! complement-data commands, optionally cascading into downstream definitions.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, definition, request, command, state, errors）
//! - **ports**: 抽象化レイヤー（ClusterRegistry, DefinitionStore, CommandStore, など）
//! - **planning**: 計画の純粋な部品（partition, triggers, start_nodes, cascade, factory）
//! - **app**: アプリケーションロジック（builder, service, admission）
//! - **impls**: 実装（InMemoryCatalog など開発用）
//! - **config**: 上限値とデフォルト値

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod planning;
pub mod ports;

pub use app::{BackfillOutcome, BackfillService, BuildError, ServiceBuilder};
pub use config::BackfillConfig;
pub use domain::{BackfillError, BackfillRequest};
