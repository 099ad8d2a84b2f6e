//! Conversions between stored rows and domain types.
//!
//! Enum columns hold the lowercase tags produced by the domain enums'
//! `as_str`; a tag that no longer parses is reported as a storage failure.

use std::fmt::Display;

use chrono::Utc;
use sea_orm::{DbErr, SqlErr};
use tally_core::fiscal::AccountingPeriod;
use tally_core::ledger::{
    Account, JournalEntry, JournalLine, LedgerError, LedgerRow, SourceDocument,
};
use tally_shared::types::{
    AccountId, CompanyId, DocumentId, JournalEntryId, LedgerRowId, PeriodId, UserId,
};
use tracing::error;

use crate::entities::{accounting_periods, accounts, journal_entries, journal_lines, ledger_rows};

/// Maps a storage error raised inside an atomic operation.
///
/// Callers treat `PostingFailed` as "nothing happened".
pub fn storage_error(err: DbErr) -> LedgerError {
    error!(error = %err, "ledger storage operation failed");
    LedgerError::PostingFailed(err.to_string())
}

/// Returns true if `err` is a unique constraint violation.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn corrupt(column: &str, err: impl Display) -> LedgerError {
    LedgerError::PostingFailed(format!("Unreadable {column} column: {err}"))
}

fn parse_tag<T>(column: &str, value: &str) -> Result<T, LedgerError>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e| corrupt(column, e))
}

fn parse_optional_tag<T>(column: &str, value: Option<&str>) -> Result<Option<T>, LedgerError>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    value.map(|v| parse_tag(column, v)).transpose()
}

impl TryFrom<accounts::Model> for Account {
    type Error = LedgerError;

    fn try_from(model: accounts::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AccountId::from_uuid(model.id),
            company_id: CompanyId::from_uuid(model.company_id),
            account_type: parse_tag("account_type", &model.account_type)?,
            normal_balance: parse_tag("normal_balance", &model.normal_balance)?,
            subtype: parse_optional_tag("subtype", model.subtype.as_deref())?,
            cash_flow_category: parse_optional_tag(
                "cash_flow_category",
                model.cash_flow_category.as_deref(),
            )?,
            code: model.code,
            name: model.name,
            balance: model.balance,
            is_active: model.is_active,
        })
    }
}

impl TryFrom<accounting_periods::Model> for AccountingPeriod {
    type Error = LedgerError;

    fn try_from(model: accounting_periods::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PeriodId::from_uuid(model.id),
            company_id: CompanyId::from_uuid(model.company_id),
            period_type: parse_tag("period_type", &model.period_type)?,
            status: parse_tag("status", &model.status)?,
            name: model.name,
            fiscal_year: model.fiscal_year,
            start_date: model.start_date,
            end_date: model.end_date,
        })
    }
}

impl From<ledger_rows::Model> for LedgerRow {
    fn from(model: ledger_rows::Model) -> Self {
        Self {
            id: LedgerRowId::from_uuid(model.id),
            company_id: CompanyId::from_uuid(model.company_id),
            account_id: AccountId::from_uuid(model.account_id),
            journal_entry_id: JournalEntryId::from_uuid(model.journal_entry_id),
            line_number: model.line_number,
            account_version: model.account_version,
            entry_date: model.entry_date,
            debit: model.debit,
            credit: model.credit,
            running_balance: model.running_balance,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<journal_lines::Model> for JournalLine {
    fn from(model: journal_lines::Model) -> Self {
        Self {
            line_number: model.line_number,
            account_id: AccountId::from_uuid(model.account_id),
            debit: model.debit,
            credit: model.credit,
            description: model.description,
        }
    }
}

/// Reads the optional source-document pair of an entry row.
pub fn source_document(model: &journal_entries::Model) -> Result<Option<SourceDocument>, LedgerError> {
    match (&model.source_document_type, model.source_document_id) {
        (Some(doc_type), Some(id)) => Ok(Some(SourceDocument::new(
            parse_tag("source_document_type", doc_type)?,
            DocumentId::from_uuid(id),
        ))),
        _ => Ok(None),
    }
}

/// Assembles a journal entry from its row and lines (any order).
pub fn journal_entry(
    model: journal_entries::Model,
    lines: Vec<journal_lines::Model>,
) -> Result<JournalEntry, LedgerError> {
    let mut lines: Vec<JournalLine> = lines.into_iter().map(JournalLine::from).collect();
    lines.sort_by_key(|l| l.line_number);

    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        status: parse_tag("status", &model.status)?,
        source_document: source_document(&model)?,
        entry_number: model.entry_number,
        entry_date: model.entry_date,
        reference_number: model.reference_number,
        description: model.description,
        lines,
        reverses_entry_id: model.reverses_entry_id.map(JournalEntryId::from_uuid),
        reversed_by_entry_id: model.reversed_by_entry_id.map(JournalEntryId::from_uuid),
        closing_period_id: model.closing_period_id.map(PeriodId::from_uuid),
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at.with_timezone(&Utc),
        posted_at: model.posted_at.map(|t| t.with_timezone(&Utc)),
        voided_at: model.voided_at.map(|t| t.with_timezone(&Utc)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use rust_decimal_macros::dec;
    use tally_core::ledger::{AccountSubtype, AccountType, EntryStatus, NormalBalance, SourceDocumentType};
    use uuid::Uuid;

    fn now() -> sea_orm::prelude::DateTimeWithTimeZone {
        Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap())
    }

    fn account_model() -> accounts::Model {
        accounts::Model {
            id: Uuid::now_v7(),
            company_id: Uuid::now_v7(),
            code: "1000".to_string(),
            name: "Cash".to_string(),
            account_type: "asset".to_string(),
            normal_balance: "debit".to_string(),
            subtype: Some("cash".to_string()),
            cash_flow_category: None,
            balance: dec!(125.50),
            is_active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_account_from_model() {
        let account = Account::try_from(account_model()).unwrap();
        assert_eq!(account.account_type, AccountType::Asset);
        assert_eq!(account.normal_balance, NormalBalance::Debit);
        assert_eq!(account.subtype, Some(AccountSubtype::Cash));
        assert_eq!(account.balance, dec!(125.50));
        assert!(account.is_cash());
    }

    #[test]
    fn test_unknown_tag_is_storage_failure() {
        let mut model = account_model();
        model.account_type = "goodwill".to_string();
        assert!(matches!(
            Account::try_from(model),
            Err(LedgerError::PostingFailed(msg)) if msg.contains("account_type")
        ));
    }

    #[test]
    fn test_journal_entry_orders_lines() {
        let entry_id = Uuid::now_v7();
        let cash = Uuid::now_v7();
        let sales = Uuid::now_v7();
        let doc = Uuid::now_v7();
        let model = journal_entries::Model {
            id: entry_id,
            company_id: Uuid::now_v7(),
            entry_number: "JE-2026-0001".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            reference_number: None,
            description: Some("Invoice".to_string()),
            status: "posted".to_string(),
            source_document_type: Some("invoice".to_string()),
            source_document_id: Some(doc),
            reverses_entry_id: None,
            reversed_by_entry_id: None,
            closing_period_id: None,
            created_by: Uuid::now_v7(),
            posted_by: None,
            voided_by: None,
            void_reason: None,
            created_at: now(),
            posted_at: Some(now()),
            voided_at: None,
            updated_at: now(),
        };
        let line = |n: i32, account_id: Uuid, debit, credit| journal_lines::Model {
            id: Uuid::now_v7(),
            journal_entry_id: entry_id,
            line_number: n,
            account_id,
            debit,
            credit,
            description: None,
        };

        let entry = journal_entry(
            model,
            vec![line(2, sales, dec!(0), dec!(80)), line(1, cash, dec!(80), dec!(0))],
        )
        .unwrap();

        assert_eq!(entry.status, EntryStatus::Posted);
        assert_eq!(entry.lines[0].account_id, AccountId::from_uuid(cash));
        assert_eq!(entry.lines[1].line_number, 2);
        assert_eq!(
            entry.source_document,
            Some(SourceDocument::new(SourceDocumentType::Invoice, DocumentId::from_uuid(doc)))
        );
        assert!(entry.totals().is_balanced());
    }
}
