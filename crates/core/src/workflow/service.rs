//! Workflow service for journal entry state transitions.
//!
//! Draft -> Posted -> Void. Posted and Void entries are never edited; a
//! void is recorded as a new mirrored entry plus this status flag.

use chrono::Utc;
use tally_shared::types::UserId;

use crate::ledger::{EntryStatus, LedgerError};
use crate::workflow::types::WorkflowAction;

const ENTITY: &str = "journal entry";

/// Stateless service for managing journal entry transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Promote a draft entry to posted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if not in Draft status.
    pub fn post_draft(current_status: EntryStatus, posted_by: UserId) -> Result<WorkflowAction, LedgerError> {
        match current_status {
            EntryStatus::Draft => Ok(WorkflowAction::Post {
                new_status: EntryStatus::Posted,
                posted_by,
                posted_at: Utc::now(),
            }),
            _ => Err(LedgerError::invalid_transition(ENTITY, current_status, "post")),
        }
    }

    /// Void a posted entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if not in Posted status.
    pub fn void(
        current_status: EntryStatus,
        voided_by: UserId,
        reason: Option<String>,
    ) -> Result<WorkflowAction, LedgerError> {
        match current_status {
            EntryStatus::Posted => Ok(WorkflowAction::Void {
                new_status: EntryStatus::Void,
                voided_by,
                voided_at: Utc::now(),
                reason,
            }),
            _ => Err(LedgerError::invalid_transition(ENTITY, current_status, "void")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_draft() {
        let user = UserId::new();
        let action = WorkflowService::post_draft(EntryStatus::Draft, user).unwrap();
        assert_eq!(action.new_status(), EntryStatus::Posted);
        assert!(matches!(action, WorkflowAction::Post { posted_by, .. } if posted_by == user));
    }

    #[test]
    fn test_post_draft_rejects_posted() {
        let err = WorkflowService::post_draft(EntryStatus::Posted, UserId::new()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot post journal entry in status posted");
    }

    #[test]
    fn test_void_posted() {
        let action = WorkflowService::void(EntryStatus::Posted, UserId::new(), Some("dup".to_string())).unwrap();
        assert_eq!(action.new_status(), EntryStatus::Void);
    }

    #[test]
    fn test_void_draft_or_void_rejected() {
        for status in [EntryStatus::Draft, EntryStatus::Void] {
            assert!(matches!(
                WorkflowService::void(status, UserId::new(), None),
                Err(LedgerError::InvalidTransition { .. })
            ));
        }
    }
}
