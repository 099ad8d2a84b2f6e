//! Property-based tests for WorkflowService.
//!
//! - Property 5: Only Posted Entries Can Be Voided
//! - Property 6: Only Draft Entries Can Be Posted

use proptest::prelude::*;
use tally_shared::types::UserId;

use crate::ledger::EntryStatus;
use crate::workflow::service::WorkflowService;

fn status() -> impl Strategy<Value = EntryStatus> {
    prop::sample::select(EntryStatus::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 5: Only Posted Entries Can Be Voided**
    #[test]
    fn prop_void_only_from_posted(current in status()) {
        let result = WorkflowService::void(current, UserId::new(), None);
        prop_assert_eq!(result.is_ok(), current == EntryStatus::Posted);
    }

    /// **Property 6: Only Draft Entries Can Be Posted**
    #[test]
    fn prop_post_only_from_draft(current in status()) {
        let result = WorkflowService::post_draft(current, UserId::new());
        prop_assert_eq!(result.is_ok(), current == EntryStatus::Draft);
    }
}
