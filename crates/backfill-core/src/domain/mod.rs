//! Domain model (IDs, catalog snapshots, requests, commands, errors).

pub mod command;
pub mod definition;
pub mod errors;
pub mod ids;
pub mod request;
pub mod state;

pub use command::{CascadeOrigin, Command, CommandParam, CommandSignature, CommandType};
pub use definition::{
    DependentEdge, ExecutionType, ReleaseState, Schedule, TaskRelationEdge, WorkflowDefinitionRef,
};
pub use errors::{BackfillError, ErrorKind, StoreError};
pub use ids::{CommandId, DefinitionCode, TaskCode};
pub use request::{
    BackfillRequest, BackfillWindow, DependentMode, FailureStrategy, Priority, RunMode,
    TaskDependType, WarningType,
};
pub use state::BackfillPhase;
