//! Migration state machine
//!
//! A migration only ever moves forward:
//! `Started -> Renamed -> Recreated -> Rebound(0..=n) -> RestagePending -> Completed`,
//! and any non-terminal state may drop into `Failed`.

use crate::error::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side-effecting step of a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationStep {
    /// Rename the existing instance out of the way
    Rename,
    /// Wait for the asynchronous rename to finish
    AwaitRename,
    /// Create the replacement instance under the original name
    Create,
    /// Bind an app to the replacement instance
    Bind,
    /// Delete the app's binding to the old instance
    Unbind,
    /// Restage the app so it picks up new credentials
    Restage,
    /// Delete the old instance
    DeleteOld,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rename => "rename",
            Self::AwaitRename => "await rename",
            Self::Create => "create",
            Self::Bind => "bind",
            Self::Unbind => "unbind",
            Self::Restage => "restage",
            Self::DeleteOld => "delete old instance",
        })
    }
}

/// Where a migration currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationState {
    Started,
    Renamed,
    Recreated,
    /// `migrated` of `total` bindings moved to the new instance
    Rebound { migrated: usize, total: usize },
    RestagePending,
    Completed,
    Failed { step: MigrationStep },
}

impl MigrationState {
    /// No further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// Validates a state transition.
///
/// # Errors
/// `StateMachineError::IllegalTransition` when `to` cannot follow `from`.
pub fn validate_transition(from: MigrationState, to: MigrationState) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

fn allowed(from: MigrationState, to: MigrationState) -> bool {
    use MigrationState::{Completed, Failed, Rebound, Recreated, Renamed, RestagePending, Started};
    match (from, to) {
        (Completed | Failed { .. }, _) => false,
        (_, Failed { .. }) => true,
        (Started, Renamed) | (Renamed, Recreated) | (RestagePending, Completed) => true,
        (Recreated, Rebound { migrated, .. }) => migrated == 0,
        (
            Rebound { migrated, total },
            Rebound {
                migrated: next,
                total: next_total,
            },
        ) => total == next_total && migrated < total && next == migrated + 1,
        (Rebound { migrated, total }, RestagePending) => migrated == total,
        _ => false,
    }
}
