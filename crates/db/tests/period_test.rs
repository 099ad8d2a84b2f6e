//! Accounting period integration tests: gating, transitions and closing.

#![allow(clippy::uninlined_format_args)]

mod common;

use common::{TestCompany, connect, date};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tally_core::fiscal::{AccountingPeriod, NewPeriod, PeriodAction, PeriodClassification, PeriodStatus, PeriodType};
use tally_core::ledger::{EntryStatus, LedgerError, PostingPolicy, PostingWarning};
use tally_core::reports::DateRange;
use tally_db::{AccountRepository, JournalRepository, LedgerRepository, PeriodRepository, ReportRepository};

fn january(company: &TestCompany) -> NewPeriod {
    NewPeriod {
        company_id: company.company_id,
        name: "January 2026".to_string(),
        fiscal_year: 2026,
        period_type: PeriodType::Monthly,
        start_date: date(2026, 1, 1),
        end_date: date(2026, 1, 31),
    }
}

/// January with revenue 500 and rent 200, all in cash.
async fn trading_month(db: &DatabaseConnection, company: &TestCompany, periods: &PeriodRepository) -> AccountingPeriod {
    let period = periods.create(january(company)).await.unwrap();
    let journal = JournalRepository::new(db.clone());
    journal
        .post(company.transfer(date(2026, 1, 10), &company.cash, &company.revenue, dec!(500)))
        .await
        .unwrap();
    journal
        .post(company.transfer(date(2026, 1, 20), &company.expense, &company.cash, dec!(200)))
        .await
        .unwrap();
    period
}

#[tokio::test]
async fn test_create_rejects_overlap_of_same_type() {
    let Some(db) = connect().await else { return };
    let company = TestCompany::create(&db).await;
    let periods = PeriodRepository::new(db.clone());

    let created = periods.create(january(&company)).await.unwrap();
    assert_eq!(created.status, PeriodStatus::Open);

    let mut overlapping = january(&company);
    overlapping.name = "Mid January".to_string();
    overlapping.start_date = date(2026, 1, 15);
    overlapping.end_date = date(2026, 2, 14);
    assert!(matches!(
        periods.create(overlapping).await,
        Err(LedgerError::OverlappingPeriod(_))
    ));

    let quarter = NewPeriod {
        name: "Q1 2026".to_string(),
        period_type: PeriodType::Quarterly,
        end_date: date(2026, 3, 31),
        ..january(&company)
    };
    periods.create(quarter).await.unwrap();

    let mut backwards = january(&company);
    backwards.start_date = date(2026, 2, 28);
    backwards.end_date = date(2026, 2, 1);
    assert!(matches!(
        periods.create(backwards).await,
        Err(LedgerError::InvalidPeriodRange { .. })
    ));

    assert_eq!(periods.list(company.company_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_close_moves_income_into_retained_earnings() {
    let Some(db) = connect().await else { return };
    let company = TestCompany::create(&db).await;
    let periods = PeriodRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let period = trading_month(&db, &company, &periods).await;

    let closed = periods
        .close(company.company_id, period.id, company.user_id)
        .await
        .unwrap();
    assert_eq!(closed.status, PeriodStatus::Closed);

    for (account, expected) in [
        (&company.revenue, Decimal::ZERO),
        (&company.expense, Decimal::ZERO),
        (&company.retained, dec!(300)),
        (&company.cash, dec!(300)),
    ] {
        assert_eq!(
            ledger.balance(company.company_id, account.id).await.unwrap(),
            expected,
            "balance of {}",
            account.code
        );
    }

    // The closing entry is dated on the period end.
    let retained_rows = ledger
        .rows_for_account(company.company_id, company.retained.id, None)
        .await
        .unwrap();
    assert_eq!(retained_rows.len(), 1);
    assert_eq!(retained_rows[0].entry_date, date(2026, 1, 31));

    // The income statement still shows the month's result.
    let reports = ReportRepository::new(db.clone());
    let range = DateRange::new(date(2026, 1, 1), date(2026, 1, 31)).unwrap();
    let statement = reports.income_statement(company.company_id, range).await.unwrap();
    assert_eq!(statement.revenue.total, dec!(500));
    assert_eq!(statement.expenses.total, dec!(200));
    assert_eq!(statement.net_income, dec!(300));

    let sheet = reports.balance_sheet(company.company_id, date(2026, 1, 31)).await.unwrap();
    assert!(sheet.balanced);
    assert_eq!(sheet.equity.total, dec!(300));
}

#[tokio::test]
async fn test_reopen_voids_the_closing_entry() {
    let Some(db) = connect().await else { return };
    let company = TestCompany::create(&db).await;
    let journal = JournalRepository::new(db.clone()).with_policy(PostingPolicy::default().rejecting_closed_periods());
    let periods = PeriodRepository::new(db.clone()).with_journal(journal);
    let ledger = LedgerRepository::new(db.clone());
    let period = trading_month(&db, &company, &periods).await;

    periods
        .close(company.company_id, period.id, company.user_id)
        .await
        .unwrap();
    let reopened = periods
        .reopen(company.company_id, period.id, company.user_id)
        .await
        .unwrap();
    assert_eq!(reopened.status, PeriodStatus::Open);

    assert_eq!(
        ledger.balance(company.company_id, company.revenue.id).await.unwrap(),
        dec!(500)
    );
    assert_eq!(
        ledger.balance(company.company_id, company.expense.id).await.unwrap(),
        dec!(200)
    );
    assert_eq!(
        ledger.balance(company.company_id, company.retained.id).await.unwrap(),
        Decimal::ZERO
    );

    // Closing again produces a fresh closing entry.
    periods
        .close(company.company_id, period.id, company.user_id)
        .await
        .unwrap();
    assert_eq!(
        ledger.balance(company.company_id, company.retained.id).await.unwrap(),
        dec!(300)
    );

    let reports = ReportRepository::new(db.clone());
    let range = DateRange::new(date(2026, 1, 1), date(2026, 1, 31)).unwrap();
    let statement = reports.income_statement(company.company_id, range).await.unwrap();
    assert_eq!(statement.net_income, dec!(300));
}

#[tokio::test]
async fn test_closed_period_policy() {
    let Some(db) = connect().await else { return };
    let company = TestCompany::create(&db).await;
    let periods = PeriodRepository::new(db.clone());
    let period = trading_month(&db, &company, &periods).await;
    periods
        .close(company.company_id, period.id, company.user_id)
        .await
        .unwrap();

    let allowing = JournalRepository::new(db.clone());
    let receipt = allowing
        .post(company.transfer(date(2026, 1, 25), &company.expense, &company.cash, dec!(10)))
        .await
        .unwrap();
    assert_eq!(receipt.status, EntryStatus::Posted);
    assert_eq!(
        receipt.warnings,
        vec![PostingWarning::PostedIntoClosedPeriod { date: date(2026, 1, 25) }]
    );

    let rejecting = JournalRepository::new(db.clone()).with_policy(PostingPolicy::default().rejecting_closed_periods());
    let result = rejecting
        .post(company.transfer(date(2026, 1, 25), &company.expense, &company.cash, dec!(10)))
        .await;
    assert!(matches!(result, Err(LedgerError::ClosedPeriod(d)) if d == date(2026, 1, 25)));

    // Dates outside every period post normally.
    let receipt = rejecting
        .post(company.transfer(date(2026, 2, 1), &company.expense, &company.cash, dec!(10)))
        .await
        .unwrap();
    assert!(receipt.warnings.is_empty());
}

#[tokio::test]
async fn test_locked_period_refuses_postings_and_transitions() {
    let Some(db) = connect().await else { return };
    let company = TestCompany::create(&db).await;
    let periods = PeriodRepository::new(db.clone());
    let journal = JournalRepository::new(db.clone());
    let period = trading_month(&db, &company, &periods).await;

    assert!(matches!(
        periods.lock(company.company_id, period.id, company.user_id).await,
        Err(LedgerError::InvalidTransition { .. })
    ));

    periods
        .close(company.company_id, period.id, company.user_id)
        .await
        .unwrap();
    let locked = periods
        .transition(company.company_id, period.id, PeriodAction::Lock, company.user_id)
        .await
        .unwrap();
    assert_eq!(locked.map(|p| p.status), Some(PeriodStatus::Locked));
    assert_eq!(
        periods.classify(company.company_id, date(2026, 1, 15)).await.unwrap(),
        PeriodClassification::Locked
    );

    let result = journal
        .post(company.transfer(date(2026, 1, 15), &company.cash, &company.capital, dec!(1)))
        .await;
    assert!(matches!(result, Err(LedgerError::LockedPeriod(_))));

    for action in [PeriodAction::Reopen, PeriodAction::Close, PeriodAction::Delete, PeriodAction::Lock] {
        let result = periods
            .transition(company.company_id, period.id, action, company.user_id)
            .await;
        assert!(
            matches!(result, Err(LedgerError::InvalidTransition { .. })),
            "{} should be refused on a locked period",
            action
        );
    }
}

#[tokio::test]
async fn test_delete_only_open_periods() {
    let Some(db) = connect().await else { return };
    let company = TestCompany::create(&db).await;
    let periods = PeriodRepository::new(db.clone());

    let period = periods.create(january(&company)).await.unwrap();
    periods
        .close(company.company_id, period.id, company.user_id)
        .await
        .unwrap();
    assert!(matches!(
        periods.delete(company.company_id, period.id).await,
        Err(LedgerError::InvalidTransition { .. })
    ));

    periods
        .reopen(company.company_id, period.id, company.user_id)
        .await
        .unwrap();
    let deleted = periods
        .transition(company.company_id, period.id, PeriodAction::Delete, company.user_id)
        .await
        .unwrap();
    assert!(deleted.is_none());
    assert!(matches!(
        periods.get(company.company_id, period.id).await,
        Err(LedgerError::PeriodNotFound(id)) if id == period.id
    ));
    assert_eq!(
        periods.classify(company.company_id, date(2026, 1, 15)).await.unwrap(),
        PeriodClassification::NoPeriod
    );
}

#[tokio::test]
async fn test_close_without_retained_earnings_account() {
    let Some(db) = connect().await else { return };
    let company = TestCompany::create(&db).await;
    let periods = PeriodRepository::new(db.clone());
    let period = trading_month(&db, &company, &periods).await;

    AccountRepository::new(db.clone())
        .set_active(company.company_id, company.retained.id, false)
        .await
        .unwrap();

    assert!(matches!(
        periods.close(company.company_id, period.id, company.user_id).await,
        Err(LedgerError::RetainedEarningsMissing)
    ));
    let unchanged = periods.get(company.company_id, period.id).await.unwrap();
    assert_eq!(unchanged.status, PeriodStatus::Open);
}
