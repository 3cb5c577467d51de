//! Planning - バックフィル計画の純粋な部品
//!
//! リクエスト → (start node 検証) → トリガー列挙 → パーティション分割
//! → (依存カスケード) → Command 構築。
//! 永続化はここでは行わない（app::admission の責務）。

pub mod cascade;
pub mod factory;
pub mod partition;
pub mod start_nodes;
pub mod triggers;

pub use self::cascade::{CascadeResolver, CascadeTarget};
pub use self::factory::{BuildTarget, CommandFactory};
pub use self::partition::{DatePartition, partition};
pub use self::start_nodes::StartNodeValidator;
pub use self::triggers::{SeriesSource, TriggerEnumerator, TriggerSeries};
