//! App - アプリケーション層
//!
//! planning の部品と ports を組み合わせて、バックフィル要求を処理します。
//!
//! # 主要コンポーネント
//! - **ServiceBuilder**: port のワイヤリングと起動時検証
//! - **BackfillService**: 要求の検証 → 計画 → 受け入れ
//! - **AdmissionGate**: 前提条件の検査と重複排除付きの永続化

pub mod admission;
pub mod builder;
pub mod service;

pub use self::admission::{AdmissionGate, AdmissionReport};
pub use self::builder::{BuildError, ServiceBuilder};
pub use self::service::{BackfillOutcome, BackfillService};
