//! Errors - エラー型と分類
//!
//! 呼び出し側が受け取るのは「成功件数」か「ちょうど一つの型付きエラー」のどちらか。
//! 既存コマンドとの衝突（ConflictSkip）はエラーではなく、件数が減るだけ。

use thiserror::Error;

use super::ids::{DefinitionCode, TaskCode};

/// ErrorKind はエラーの運用分類
///
/// - Validation: 入力が不正（構築前に中断）
/// - ResourceUnavailable: master が居ない（副作用ゼロで中断）
/// - Referential: 参照先が存在しない（リクエスト全体を拒否）
/// - Infrastructure: 外部ストアの障害
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ResourceUnavailable,
    Referential,
    Infrastructure,
}

/// Failure reported by a collaborator (store, registry).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("invalid window: start {start} must be before end {end}")]
    InvalidWindow { start: String, end: String },

    #[error("schedule date list is empty")]
    EmptyDateList,

    #[error("schedule date list has {len} entries, limit is {limit}")]
    DateListTooLong { len: usize, limit: usize },

    #[error("window for definition {definition_code} yields more than {limit} units")]
    WindowTooLarge {
        definition_code: DefinitionCode,
        limit: usize,
    },

    #[error("cannot parse crontab '{crontab}': {reason}")]
    CronParse { crontab: String, reason: String },

    #[error("no master node is registered")]
    NoMasterAvailable,

    #[error("workflow definition {0} not found")]
    DefinitionNotFound(DefinitionCode),

    #[error("workflow definition {0} is not online")]
    DefinitionNotOnline(DefinitionCode),

    #[error("start nodes {missing:?} are not in the graph of definition {definition_code} v{version}")]
    StartNodeNotInGraph {
        definition_code: DefinitionCode,
        version: i32,
        missing: Vec<TaskCode>,
    },

    #[error("dependent workflow definition {code} v{version} not found")]
    DependentDefinitionNotFound { code: DefinitionCode, version: i32 },

    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    #[error("cannot encode command param: {0}")]
    ParamEncoding(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BackfillError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackfillError::InvalidWindow { .. }
            | BackfillError::EmptyDateList
            | BackfillError::DateListTooLong { .. }
            | BackfillError::WindowTooLarge { .. }
            | BackfillError::CronParse { .. } => ErrorKind::Validation,
            BackfillError::NoMasterAvailable => ErrorKind::ResourceUnavailable,
            BackfillError::DefinitionNotFound(_)
            | BackfillError::DefinitionNotOnline(_)
            | BackfillError::StartNodeNotInGraph { .. }
            | BackfillError::DependentDefinitionNotFound { .. }
            | BackfillError::TenantNotFound(_) => ErrorKind::Referential,
            BackfillError::ParamEncoding(_) | BackfillError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::window(BackfillError::EmptyDateList, ErrorKind::Validation)]
    #[case::cron(
        BackfillError::CronParse { crontab: "x".into(), reason: "bad".into() },
        ErrorKind::Validation
    )]
    #[case::master(BackfillError::NoMasterAvailable, ErrorKind::ResourceUnavailable)]
    #[case::tenant(BackfillError::TenantNotFound("t".into()), ErrorKind::Referential)]
    #[case::store(
        BackfillError::Store(StoreError::Unavailable("down".into())),
        ErrorKind::Infrastructure
    )]
    fn errors_are_classified(#[case] err: BackfillError, #[case] kind: ErrorKind) {
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn start_node_error_lists_missing_codes() {
        let err = BackfillError::StartNodeNotInGraph {
            definition_code: DefinitionCode(5),
            version: 2,
            missing: vec![TaskCode(99)],
        };
        assert_eq!(
            err.to_string(),
            "start nodes [TaskCode(99)] are not in the graph of definition 5 v2"
        );
    }
}
