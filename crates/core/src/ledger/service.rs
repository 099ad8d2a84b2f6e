//! Ledger service for entry validation and ledger-row planning.
//!
//! This module provides the core business logic for validating journal
//! entries and computing the rows and balance deltas a posting produces,
//! before anything is persisted to the database.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CompanyId};

use super::account::Account;
use super::balance::RunningBalance;
use super::entry::JournalLine;
use super::error::LedgerError;
use super::types::{EntryTotals, PostingLine, PostingRequest};
use super::validation::validate_lines;

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntry {
    /// Normalized lines in request order.
    pub lines: Vec<JournalLine>,
    /// Entry totals.
    pub totals: EntryTotals,
}

/// A ledger row about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRow {
    /// Source line number.
    pub line_number: i32,
    /// Account.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Version and running balance for this row.
    pub running: RunningBalance,
    /// Line memo.
    pub description: Option<String>,
}

/// Rows and cached-balance deltas produced by posting one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPlan {
    /// Rows in line order.
    pub rows: Vec<PlannedRow>,
    /// Net signed change per account, ordered by account ID.
    pub deltas: BTreeMap<AccountId, Decimal>,
}

/// Ledger service for entry validation.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validates a posting request against the accounts it references.
    ///
    /// 1. Validates line count (at least 2)
    /// 2. Normalizes each line (positive, single side, money precision)
    /// 3. Validates balance (debits = credits within tolerance)
    /// 4. Validates accounts (resolve within the company, active)
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if validation fails.
    pub fn validate(
        request: &PostingRequest,
        accounts: &HashMap<AccountId, Account>,
    ) -> Result<ValidatedEntry, LedgerError> {
        let (lines, totals) = validate_lines(&request.lines)?;
        Self::validate_accounts(request.company_id, &lines, accounts)?;
        Ok(ValidatedEntry { lines, totals })
    }

    /// Checks every line account resolves to an active account of `company_id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` or `InactiveAccount`.
    pub fn validate_accounts(
        company_id: CompanyId,
        lines: &[JournalLine],
        accounts: &HashMap<AccountId, Account>,
    ) -> Result<(), LedgerError> {
        for line in lines {
            let account = accounts
                .get(&line.account_id)
                .filter(|a| a.company_id == company_id)
                .ok_or(LedgerError::UnknownAccount(line.account_id))?;
            if !account.is_active {
                return Err(LedgerError::InactiveAccount(account.id));
            }
        }
        Ok(())
    }

    /// Distinct account IDs referenced by `lines`, sorted.
    ///
    /// Locks are always taken in this order so concurrent postings touching
    /// the same accounts cannot deadlock.
    #[must_use]
    pub fn account_ids(lines: &[PostingLine]) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = lines.iter().map(|l| l.account_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Plans the ledger rows for validated lines.
    ///
    /// `latest` holds each account's most recent row (highest version), read
    /// inside the same transaction that will append the plan. An account
    /// appearing on several lines chains its rows in line order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` if a line account is missing from `accounts`.
    pub fn plan_rows(
        lines: &[JournalLine],
        accounts: &HashMap<AccountId, Account>,
        latest: &HashMap<AccountId, RunningBalance>,
    ) -> Result<RowPlan, LedgerError> {
        let mut current: HashMap<AccountId, RunningBalance> = latest.clone();
        let mut deltas: BTreeMap<AccountId, Decimal> = BTreeMap::new();
        let mut rows = Vec::with_capacity(lines.len());

        for line in lines {
            let account = accounts
                .get(&line.account_id)
                .ok_or(LedgerError::UnknownAccount(line.account_id))?;
            let change = account.signed_delta(line.debit, line.credit);
            let running = RunningBalance::extend(current.get(&line.account_id), change);
            current.insert(line.account_id, running);
            *deltas.entry(line.account_id).or_insert(Decimal::ZERO) += change;

            rows.push(PlannedRow {
                line_number: line.line_number,
                account_id: line.account_id,
                debit: line.debit,
                credit: line.credit,
                running,
                description: line.description.clone(),
            });
        }

        Ok(RowPlan { rows, deltas })
    }
}
