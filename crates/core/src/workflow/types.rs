//! Workflow domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::UserId;

use crate::ledger::EntryStatus;

/// An accepted journal entry state transition, with its audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkflowAction {
    /// Draft -> Posted.
    Post {
        /// Resulting status.
        new_status: EntryStatus,
        /// Acting user.
        posted_by: UserId,
        /// Transition time.
        posted_at: DateTime<Utc>,
    },
    /// Posted -> Void.
    Void {
        /// Resulting status.
        new_status: EntryStatus,
        /// Acting user.
        voided_by: UserId,
        /// Transition time.
        voided_at: DateTime<Utc>,
        /// Reason given.
        reason: Option<String>,
    },
}

impl WorkflowAction {
    /// Status after the transition.
    #[must_use]
    pub fn new_status(&self) -> EntryStatus {
        match self {
            Self::Post { new_status, .. } | Self::Void { new_status, .. } => *new_status,
        }
    }

    /// Time of the transition.
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Post { posted_at, .. } => *posted_at,
            Self::Void { voided_at, .. } => *voided_at,
        }
    }
}
