//! CommandStore port - コマンドの永続化
//!
//! # 並行性
//! - `insert` は原子的な check-and-insert（ユニーク制約や serializable トランザクション）
//! - 同じ signature の並行 insert はちょうど一つだけ `Inserted` になり、残りは `Conflict`
//! - `Conflict` はエラーではない（既存としてスキップ）
//! - `insert_all` はバッチ全体を一つのトランザクションとして扱う
//!   （`Err` のときは一件も永続化されていない）

use crate::domain::errors::StoreError;
use crate::domain::{Command, CommandId, CommandSignature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(CommandId),
    /// An equivalent live command already exists.
    Conflict,
}

pub trait CommandStore: Send + Sync {
    /// Is there a live command with this signature?
    ///
    /// Advisory only (used for dry-run previews); admission relies on `insert`.
    fn exists_equivalent(&self, signature: &CommandSignature) -> Result<bool, StoreError>;

    fn insert(&self, command: Command) -> Result<InsertOutcome, StoreError>;

    /// All-or-nothing batch insert: one outcome per command, in input order.
    ///
    /// A signature repeated inside the batch conflicts with its first occurrence.
    fn insert_all(&self, commands: Vec<Command>) -> Result<Vec<InsertOutcome>, StoreError>;
}
