//! Ledger schema migration.
//!
//! Creates companies, the chart of accounts, journal entries and lines, the
//! append-only ledger rows, accounting periods, the entry number sequence
//! table and subsidiary party balances.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANTS & CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 2: PERIODS
        // ============================================================
        db.execute_unprepared(ACCOUNTING_PERIODS_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL & LEDGER
        // ============================================================
        db.execute_unprepared(JOURNAL_SEQUENCES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;
        db.execute_unprepared(LEDGER_ROWS_SQL).await?;

        // ============================================================
        // PART 4: SUBSIDIARY BALANCES
        // ============================================================
        db.execute_unprepared(PARTY_BALANCES_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type VARCHAR(20) NOT NULL,
    normal_balance VARCHAR(10) NOT NULL,
    subtype VARCHAR(40),
    cash_flow_category VARCHAR(20),
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_account_type CHECK (
        account_type IN ('asset', 'liability', 'equity', 'revenue', 'expense')
    ),
    CONSTRAINT chk_normal_balance CHECK (normal_balance IN ('debit', 'credit')),
    CONSTRAINT chk_cash_flow_category CHECK (
        cash_flow_category IS NULL
        OR cash_flow_category IN ('operating', 'investing', 'financing')
    ),
    UNIQUE (company_id, code)
);

CREATE INDEX idx_accounts_company ON accounts(company_id) WHERE is_active = true;
CREATE INDEX idx_accounts_type ON accounts(company_id, account_type);
CREATE INDEX idx_accounts_subtype ON accounts(company_id, subtype) WHERE subtype IS NOT NULL;
";

const ACCOUNTING_PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(50) NOT NULL,
    fiscal_year INTEGER NOT NULL,
    period_type VARCHAR(10) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status VARCHAR(10) NOT NULL DEFAULT 'open',
    closed_by UUID,
    closed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_period_dates CHECK (end_date >= start_date),
    CONSTRAINT chk_period_type CHECK (period_type IN ('monthly', 'quarterly', 'annual')),
    CONSTRAINT chk_period_status CHECK (status IN ('open', 'closed', 'locked')),
    UNIQUE (company_id, period_type, start_date)
);

CREATE INDEX idx_periods_company_date ON accounting_periods(company_id, start_date, end_date);
";

const JOURNAL_SEQUENCES_SQL: &str = r"
CREATE TABLE journal_sequences (
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    last_value BIGINT NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (company_id, year)
);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    entry_number VARCHAR(40) NOT NULL,
    entry_date DATE NOT NULL,
    reference_number VARCHAR(100),
    description TEXT,
    status VARCHAR(10) NOT NULL DEFAULT 'draft',
    source_document_type VARCHAR(20),
    source_document_id UUID,
    reverses_entry_id UUID REFERENCES journal_entries(id),
    reversed_by_entry_id UUID REFERENCES journal_entries(id),
    closing_period_id UUID REFERENCES accounting_periods(id) ON DELETE SET NULL,
    created_by UUID NOT NULL,
    posted_by UUID,
    voided_by UUID,
    void_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    posted_at TIMESTAMPTZ,
    voided_at TIMESTAMPTZ,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_entry_status CHECK (status IN ('draft', 'posted', 'void')),
    CONSTRAINT chk_source_document CHECK (
        (source_document_type IS NULL) = (source_document_id IS NULL)
    ),
    UNIQUE (company_id, entry_number)
);

CREATE INDEX idx_je_company_date ON journal_entries(company_id, entry_date);
CREATE INDEX idx_je_company_status ON journal_entries(company_id, status);
CREATE INDEX idx_je_source ON journal_entries(source_document_type, source_document_id)
    WHERE source_document_id IS NOT NULL;
CREATE INDEX idx_je_closing_period ON journal_entries(closing_period_id)
    WHERE closing_period_id IS NOT NULL;
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    description VARCHAR(500),
    CONSTRAINT chk_line_debit_or_credit CHECK (
        (debit > 0 AND credit = 0) OR (debit = 0 AND credit > 0)
    ),
    UNIQUE (journal_entry_id, line_number)
);

CREATE INDEX idx_jl_account ON journal_lines(account_id);
";

const LEDGER_ROWS_SQL: &str = r"
CREATE TABLE ledger_rows (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id),
    line_number INTEGER NOT NULL,
    account_version BIGINT NOT NULL,
    entry_date DATE NOT NULL,
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    previous_balance NUMERIC(19, 4) NOT NULL,
    running_balance NUMERIC(19, 4) NOT NULL,
    description VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_row_debit_or_credit CHECK (
        (debit > 0 AND credit = 0) OR (debit = 0 AND credit > 0)
    ),
    CONSTRAINT chk_row_version_positive CHECK (account_version > 0),
    UNIQUE (account_id, account_version)
);

CREATE INDEX idx_lr_journal_entry ON ledger_rows(journal_entry_id);
CREATE INDEX idx_lr_account_date ON ledger_rows(account_id, entry_date, account_version);
CREATE INDEX idx_lr_company_date ON ledger_rows(company_id, entry_date);
";

const PARTY_BALANCES_SQL: &str = r"
CREATE TABLE party_balances (
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    party_type VARCHAR(10) NOT NULL,
    party_id UUID NOT NULL,
    current_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_party_type CHECK (party_type IN ('customer', 'supplier')),
    PRIMARY KEY (company_id, party_type, party_id)
);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_ledger_row_modification
-- Ledger rows are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_row_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Ledger rows are append-only. Void the journal entry instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_ledger_rows_append_only
BEFORE UPDATE OR DELETE ON ledger_rows
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_row_modification();

-- ============================================================
-- FUNCTION: prevent_posted_line_modification
-- Lines of posted or void entries are never edited
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_posted_line_modification()
RETURNS TRIGGER AS $$
DECLARE
    entry_status VARCHAR(10);
BEGIN
    SELECT status INTO entry_status
    FROM journal_entries
    WHERE id = COALESCE(NEW.journal_entry_id, OLD.journal_entry_id);

    IF entry_status IN ('posted', 'void') THEN
        RAISE EXCEPTION 'Cannot modify lines of a % journal entry.', entry_status;
    END IF;

    RETURN COALESCE(NEW, OLD);
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_journal_lines_immutable
BEFORE UPDATE OR DELETE ON journal_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_line_modification();
";

const DROP_ALL_SQL: &str = r"
-- Drop triggers
DROP TRIGGER IF EXISTS trg_journal_lines_immutable ON journal_lines;
DROP TRIGGER IF EXISTS trg_ledger_rows_append_only ON ledger_rows;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_posted_line_modification();
DROP FUNCTION IF EXISTS prevent_ledger_row_modification();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS party_balances CASCADE;
DROP TABLE IF EXISTS ledger_rows CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS journal_sequences CASCADE;
DROP TABLE IF EXISTS accounting_periods CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS companies CASCADE;
";
