//! Database seeder for Tally development and testing.
//!
//! Migrates the database, then seeds a demo company with a chart of
//! accounts, one closed month of trading and an open month in progress,
//! and logs the resulting trial balance.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tally_core::events::{EventPublisher, HandlerError, LedgerEvent, LedgerEventHandler, spawn_dispatcher};
use tally_core::fiscal::{NewPeriod, PeriodType};
use tally_core::ledger::{
    Account, AccountSubtype, AccountType, CashFlowCategory, NewAccount, PostingLine, PostingPolicy,
    PostingRequest,
};
use tally_db::migration::Migrator;
use tally_db::{AccountRepository, CompanyRepository, JournalRepository, PeriodRepository, ReportRepository};
use tally_shared::AppConfig;
use tally_shared::types::{CompanyId, UserId};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logs every committed ledger event.
struct AuditLog;

#[async_trait]
impl LedgerEventHandler for AuditLog {
    fn name(&self) -> &'static str {
        "audit_log"
    }

    async fn handle(&self, event: &LedgerEvent) -> Result<(), HandlerError> {
        info!(event = event.kind(), company_id = %event.company_id(), "ledger event");
        Ok(())
    }
}

/// The demo chart of accounts.
struct Chart {
    cash: Account,
    receivable: Account,
    equipment: Account,
    payable: Account,
    loan: Account,
    capital: Account,
    revenue: Account,
    rent: Account,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);

    let db = tally_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    Migrator::up(&db, None).await.context("failed to run migrations")?;
    info!("Migrations applied");

    let (publisher, stream) = EventPublisher::channel();
    let dispatcher = spawn_dispatcher(stream, vec![Arc::new(AuditLog)]);

    let journal = JournalRepository::new(db.clone())
        .with_policy(PostingPolicy::from(&config.ledger))
        .with_events(publisher);
    let periods = PeriodRepository::new(db.clone()).with_journal(journal.clone());

    let company = CompanyRepository::new(db.clone())
        .create("Demo Trading Co")
        .await
        .context("failed to create company")?;
    let company_id = CompanyId::from_uuid(company.id);
    let user_id = UserId::new();
    info!(%company_id, "Seeding demo company");

    let chart = seed_chart(&db, company_id).await?;
    seed_postings(&journal, &periods, &chart, company_id, user_id).await?;

    let as_of = day(2026, 2, 28)?;
    let trial = ReportRepository::new(db.clone())
        .trial_balance(company_id, as_of)
        .await?;
    for line in &trial.lines {
        info!(code = %line.code, name = %line.name, debit = %line.debit, credit = %line.credit, "trial balance");
    }
    info!(
        total_debit = %trial.total_debit,
        total_credit = %trial.total_credit,
        balanced = trial.balanced,
        "Seeding complete"
    );

    drop(periods);
    drop(journal);
    dispatcher.await.context("event dispatcher panicked")?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn day(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}

async fn seed_chart(db: &DatabaseConnection, company_id: CompanyId) -> anyhow::Result<Chart> {
    let accounts = AccountRepository::new(db.clone());
    let create = |code: &'static str, name: &'static str, kind: AccountType, subtype: AccountSubtype| {
        accounts.create(NewAccount::new(company_id, code, name, kind).with_subtype(subtype))
    };

    let chart = Chart {
        cash: create("1000", "Cash at Bank", AccountType::Asset, AccountSubtype::Bank).await?,
        receivable: create("1100", "Accounts Receivable", AccountType::Asset, AccountSubtype::AccountsReceivable)
            .await?,
        equipment: create("1500", "Equipment", AccountType::Asset, AccountSubtype::FixedAsset).await?,
        payable: create("2000", "Accounts Payable", AccountType::Liability, AccountSubtype::AccountsPayable)
            .await?,
        loan: accounts
            .create(
                NewAccount::new(company_id, "2500", "Bank Loan", AccountType::Liability)
                    .with_subtype(AccountSubtype::LongTermLiability)
                    .with_cash_flow_category(CashFlowCategory::Financing),
            )
            .await?,
        capital: create("3000", "Owner Capital", AccountType::Equity, AccountSubtype::OwnerEquity).await?,
        revenue: create("4000", "Sales", AccountType::Revenue, AccountSubtype::OperatingRevenue).await?,
        rent: create("6100", "Rent", AccountType::Expense, AccountSubtype::OperatingExpense).await?,
    };
    create("3100", "Retained Earnings", AccountType::Equity, AccountSubtype::RetainedEarnings).await?;

    info!("Created chart of accounts");
    Ok(chart)
}

async fn seed_postings(
    journal: &JournalRepository,
    periods: &PeriodRepository,
    chart: &Chart,
    company_id: CompanyId,
    user_id: UserId,
) -> anyhow::Result<()> {
    let transfer = |on: NaiveDate, debit: &Account, credit: &Account, amount: Decimal, memo: &str| {
        PostingRequest::new(company_id, user_id, on)
            .description(memo)
            .line(PostingLine::debit(debit.id, amount))
            .line(PostingLine::credit(credit.id, amount))
    };

    let january = periods
        .create(NewPeriod {
            company_id,
            name: "January 2026".to_string(),
            fiscal_year: 2026,
            period_type: PeriodType::Monthly,
            start_date: day(2026, 1, 1)?,
            end_date: day(2026, 1, 31)?,
        })
        .await?;
    periods
        .create(NewPeriod {
            company_id,
            name: "February 2026".to_string(),
            fiscal_year: 2026,
            period_type: PeriodType::Monthly,
            start_date: day(2026, 2, 1)?,
            end_date: day(2026, 2, 28)?,
        })
        .await?;

    let postings = [
        transfer(day(2026, 1, 1)?, &chart.cash, &chart.capital, dec!(10000), "Owner investment"),
        transfer(day(2026, 1, 8)?, &chart.receivable, &chart.revenue, dec!(2400), "January sales"),
        transfer(day(2026, 1, 20)?, &chart.cash, &chart.receivable, dec!(1800), "Customer receipts"),
        transfer(day(2026, 1, 31)?, &chart.rent, &chart.cash, dec!(900), "January rent"),
        transfer(day(2026, 2, 2)?, &chart.equipment, &chart.cash, dec!(3000), "Delivery van"),
        transfer(day(2026, 2, 3)?, &chart.cash, &chart.loan, dec!(5000), "Bank loan drawdown"),
        transfer(day(2026, 2, 14)?, &chart.rent, &chart.payable, dec!(900), "February rent"),
    ];
    for request in postings {
        let receipt = journal.post(request).await?;
        info!(entry_number = %receipt.entry_number, "Posted journal entry");
    }

    let closed = periods.close(company_id, january.id, user_id).await?;
    info!(period = %closed.name, status = %closed.status, "Closed period");
    Ok(())
}
