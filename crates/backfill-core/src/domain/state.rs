//! Backfill phase state machine.

use serde::{Deserialize, Serialize};

/// Phase of one backfill call.
///
/// State transitions:
/// - Received -> StartNodeValidated -> WindowEnumerated -> ...
/// - ... -> DependentsResolved -> CommandsBuilt -> Admitted
/// - any non-terminal phase -> Rejected
///
/// `StartNodeValidated` and `DependentsResolved` are skipped when the request has no
/// start nodes or no cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillPhase {
    Received,
    StartNodeValidated,
    WindowEnumerated,
    DependentsResolved,
    CommandsBuilt,
    Admitted,
    Rejected,
}

impl BackfillPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BackfillPhase::Admitted | BackfillPhase::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackfillPhase::Received => "received",
            BackfillPhase::StartNodeValidated => "start_node_validated",
            BackfillPhase::WindowEnumerated => "window_enumerated",
            BackfillPhase::DependentsResolved => "dependents_resolved",
            BackfillPhase::CommandsBuilt => "commands_built",
            BackfillPhase::Admitted => "admitted",
            BackfillPhase::Rejected => "rejected",
        }
    }
}
