//! Domain identifiers (strongly-typed IDs).
//!
//! # 二種類の識別子
//! - **Code 系**（`DefinitionCode`, `TaskCode`）: 外部のカタログが採番する i64。
//!   ワークフロー定義やタスクを版をまたいで指す。
//! - **ULID 系**（`CommandId`）: このクレートが採番する ID。時刻でソート可能。
//!
//! ## Phantom Type パターン
//! `Id<T>` の `T` は PhantomData のマーカー型で、実行時のコストはゼロ。
//! 将来 ID の種類が増えても共通実装を使い回せる。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Code of a workflow definition (stable across versions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionCode(pub i64);

impl fmt::Display for DefinitionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Code of a task inside a workflow definition.
///
/// `TaskCode::ROOT`（0）は task-relation graph の合成ルートで、実在のタスクではない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCode(pub i64);

impl TaskCode {
    pub const ROOT: TaskCode = TaskCode(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for TaskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "cmd-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Command のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cmd {}

impl IdMarker for Cmd {
    fn prefix() -> &'static str {
        "cmd-"
    }
}

/// Identifier assigned to a command when it is admitted.
pub type CommandId = Id<Cmd>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_id_display_has_prefix() {
        let ulid = Ulid::new();
        let id = CommandId::from_ulid(ulid);
        assert_eq!(id.as_ulid(), ulid);
        assert!(id.to_string().starts_with("cmd-"));
    }

    #[test]
    fn command_id_is_ulid_sized() {
        assert_eq!(std::mem::size_of::<CommandId>(), std::mem::size_of::<Ulid>());
    }

    #[test]
    fn root_task_code_is_zero() {
        assert!(TaskCode(0).is_root());
        assert!(!TaskCode(7).is_root());
    }

    #[test]
    fn codes_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&DefinitionCode(42)).unwrap();
        assert_eq!(json, "42");
        let code: TaskCode = serde_json::from_str("9").unwrap();
        assert_eq!(code, TaskCode(9));
    }
}
