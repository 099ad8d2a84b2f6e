//! Post-commit ledger events.
//!
//! Repositories publish an event only after their database transaction has
//! committed. Handlers (e-mail, PDF rendering, document-module callbacks)
//! run on a separate task; their failures are logged and never reach the
//! posting that triggered them.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CompanyId, JournalEntryId, PeriodId};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::fiscal::{PeriodAction, PeriodStatus};
use crate::ledger::{EntryStatus, PostingWarning, SourceDocument};

/// Something that happened in the ledger and has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// An entry was created (Posted or Draft) or a draft was posted.
    EntryPosted {
        /// Tenant.
        company_id: CompanyId,
        /// Entry.
        entry_id: JournalEntryId,
        /// Entry number.
        entry_number: String,
        /// Status after the operation.
        status: EntryStatus,
        /// Originating document.
        source_document: Option<SourceDocument>,
        /// Warnings raised.
        warnings: Vec<PostingWarning>,
    },
    /// An entry was voided by a mirrored reversal.
    EntryVoided {
        /// Tenant.
        company_id: CompanyId,
        /// The voided entry.
        entry_id: JournalEntryId,
        /// The reversal.
        reversal_entry_id: JournalEntryId,
        /// Originating document of the voided entry.
        source_document: Option<SourceDocument>,
    },
    /// A period changed status or was deleted.
    PeriodTransitioned {
        /// Tenant.
        company_id: CompanyId,
        /// Period.
        period_id: PeriodId,
        /// Action applied.
        action: PeriodAction,
        /// Status afterwards; `None` once deleted.
        status: Option<PeriodStatus>,
    },
    /// Reconciliation overwrote a drifted cached balance.
    BalanceCorrected {
        /// Tenant.
        company_id: CompanyId,
        /// Account.
        account_id: AccountId,
        /// Cached balance before correction.
        stored_balance: Decimal,
        /// Ledger-derived balance written.
        ledger_balance: Decimal,
    },
}

impl LedgerEvent {
    /// Short name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EntryPosted { .. } => "entry_posted",
            Self::EntryVoided { .. } => "entry_voided",
            Self::PeriodTransitioned { .. } => "period_transitioned",
            Self::BalanceCorrected { .. } => "balance_corrected",
        }
    }

    /// Tenant the event belongs to.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        match self {
            Self::EntryPosted { company_id, .. }
            | Self::EntryVoided { company_id, .. }
            | Self::PeriodTransitioned { company_id, .. }
            | Self::BalanceCorrected { company_id, .. } => *company_id,
        }
    }
}

/// Error returned by a handler.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

/// Consumer of committed ledger events.
#[async_trait]
pub trait LedgerEventHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Handles one event.
    async fn handle(&self, event: &LedgerEvent) -> Result<(), HandlerError>;
}

/// Sending half of the event channel. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct EventPublisher {
    tx: Option<mpsc::UnboundedSender<LedgerEvent>>,
}

/// Receiving half of the event channel.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<LedgerEvent>,
}

impl EventPublisher {
    /// Creates a connected publisher and stream.
    #[must_use]
    pub fn channel() -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, EventStream { rx })
    }

    /// A publisher that drops every event.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Publishes an event. Never fails; a closed channel is logged.
    pub fn publish(&self, event: LedgerEvent) {
        let Some(tx) = &self.tx else {
            debug!(event = event.kind(), "event publishing disabled");
            return;
        };
        if let Err(mpsc::error::SendError(event)) = tx.send(event) {
            warn!(event = event.kind(), "ledger event dropped: no dispatcher");
        }
    }
}

impl EventStream {
    /// Receives the next event; `None` once every publisher is dropped.
    pub async fn recv(&mut self) -> Option<LedgerEvent> {
        self.rx.recv().await
    }
}

/// Spawns a task delivering every event to every handler, in order.
///
/// The task ends when all publishers are dropped.
pub fn spawn_dispatcher(
    mut stream: EventStream,
    handlers: Vec<Arc<dyn LedgerEventHandler>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = stream.recv().await {
            for handler in &handlers {
                if let Err(e) = handler.handle(&event).await {
                    error!(
                        handler = handler.name(),
                        event = event.kind(),
                        company_id = %event.company_id(),
                        error = %e,
                        "ledger event handler failed"
                    );
                }
            }
        }
        debug!("ledger event dispatcher stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl LedgerEventHandler for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn handle(&self, event: &LedgerEvent) -> Result<(), HandlerError> {
            self.seen.lock().await.push(event.kind());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl LedgerEventHandler for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn handle(&self, _event: &LedgerEvent) -> Result<(), HandlerError> {
            Err(HandlerError("smtp unavailable".to_string()))
        }
    }

    fn posted() -> LedgerEvent {
        LedgerEvent::EntryPosted {
            company_id: CompanyId::new(),
            entry_id: JournalEntryId::new(),
            entry_number: "JE-2026-0001".to_string(),
            status: EntryStatus::Posted,
            source_document: None,
            warnings: vec![],
        }
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_in_order_despite_failures() {
        let (publisher, stream) = EventPublisher::channel();
        let recorder = Arc::new(Recorder::default());
        let handlers: Vec<Arc<dyn LedgerEventHandler>> = vec![Arc::new(Failing), recorder.clone()];
        let task = spawn_dispatcher(stream, handlers);

        publisher.publish(posted());
        publisher.publish(LedgerEvent::PeriodTransitioned {
            company_id: CompanyId::new(),
            period_id: PeriodId::new(),
            action: PeriodAction::Close,
            status: Some(PeriodStatus::Closed),
        });
        drop(publisher);
        task.await.unwrap();

        assert_eq!(*recorder.seen.lock().await, vec!["entry_posted", "period_transitioned"]);
    }

    #[tokio::test]
    async fn test_publish_without_dispatcher_does_not_panic() {
        let (publisher, stream) = EventPublisher::channel();
        drop(stream);
        publisher.publish(posted());
        EventPublisher::disabled().publish(posted());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(posted()).unwrap();
        assert_eq!(json["event"], "entry_posted");
        assert_eq!(json["status"], "posted");
    }
}
