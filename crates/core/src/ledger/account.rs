//! Chart of accounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CompanyId};

use super::balance::NormalBalance;
use crate::string_enum;

string_enum! {
    /// The five fundamental account types.
    pub enum AccountType {
        /// Resources owned.
        Asset => "asset",
        /// Obligations owed.
        Liability => "liability",
        /// Owner's residual interest.
        Equity => "equity",
        /// Income earned.
        Revenue => "revenue",
        /// Costs incurred.
        Expense => "expense",
    }
}

impl AccountType {
    /// Default normal balance side for this type.
    #[must_use]
    pub const fn default_normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns true for Asset, Liability and Equity.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }

    /// Returns true for Revenue and Expense.
    #[must_use]
    pub const fn is_income_statement(self) -> bool {
        !self.is_balance_sheet()
    }
}

string_enum! {
    /// Reporting sub-type tag.
    pub enum AccountSubtype {
        /// Cash on hand.
        Cash => "cash",
        /// Bank account.
        Bank => "bank",
        /// Trade receivables.
        AccountsReceivable => "accounts_receivable",
        /// Stock.
        Inventory => "inventory",
        /// Other current asset.
        OtherCurrentAsset => "other_current_asset",
        /// Property, plant and equipment.
        FixedAsset => "fixed_asset",
        /// Other non-current asset.
        OtherAsset => "other_asset",
        /// Trade payables.
        AccountsPayable => "accounts_payable",
        /// Other current liability.
        OtherCurrentLiability => "other_current_liability",
        /// Long-term liability.
        LongTermLiability => "long_term_liability",
        /// Other liability.
        OtherLiability => "other_liability",
        /// Owner's capital.
        OwnerEquity => "owner_equity",
        /// Accumulated earnings; the closing target.
        RetainedEarnings => "retained_earnings",
        /// Operating revenue.
        OperatingRevenue => "operating_revenue",
        /// Non-operating income.
        OtherIncome => "other_income",
        /// Cost of goods sold.
        CostOfGoodsSold => "cost_of_goods_sold",
        /// Operating expense.
        OperatingExpense => "operating_expense",
        /// Non-operating expense.
        OtherExpense => "other_expense",
    }
}

impl AccountSubtype {
    /// Returns true if this subtype holds cash.
    #[must_use]
    pub const fn is_cash(self) -> bool {
        matches!(self, Self::Cash | Self::Bank)
    }

    /// Returns true if this subtype is a current asset or liability.
    #[must_use]
    pub const fn is_current(self) -> bool {
        matches!(
            self,
            Self::Cash
                | Self::Bank
                | Self::AccountsReceivable
                | Self::Inventory
                | Self::OtherCurrentAsset
                | Self::AccountsPayable
                | Self::OtherCurrentLiability
        )
    }

    /// Cash-flow section used when an account carries no explicit tag.
    #[must_use]
    pub const fn default_cash_flow_category(self) -> CashFlowCategory {
        match self {
            Self::FixedAsset | Self::OtherAsset => CashFlowCategory::Investing,
            Self::LongTermLiability | Self::OwnerEquity => CashFlowCategory::Financing,
            _ => CashFlowCategory::Operating,
        }
    }
}

string_enum! {
    /// Cash-flow statement section.
    pub enum CashFlowCategory {
        /// Day-to-day operations.
        Operating => "operating",
        /// Long-lived asset purchases and disposals.
        Investing => "investing",
        /// Debt and owner funding.
        Financing => "financing",
    }
}

/// An account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Account code, unique per company.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Normal balance side.
    pub normal_balance: NormalBalance,
    /// Reporting sub-type.
    pub subtype: Option<AccountSubtype>,
    /// Explicit cash-flow section.
    pub cash_flow_category: Option<CashFlowCategory>,
    /// Cached balance, signed per the normal side.
    pub balance: Decimal,
    /// Whether the account accepts postings.
    pub is_active: bool,
}

impl Account {
    /// Returns true if this is a cash or bank account.
    #[must_use]
    pub fn is_cash(&self) -> bool {
        self.subtype.is_some_and(AccountSubtype::is_cash)
    }

    /// Returns true if this is the retained earnings account.
    #[must_use]
    pub fn is_retained_earnings(&self) -> bool {
        self.subtype == Some(AccountSubtype::RetainedEarnings)
    }

    /// Explicit cash-flow tag, falling back to the subtype default.
    #[must_use]
    pub fn effective_cash_flow_category(&self) -> CashFlowCategory {
        self.cash_flow_category.unwrap_or_else(|| {
            self.subtype
                .map_or(CashFlowCategory::Operating, AccountSubtype::default_cash_flow_category)
        })
    }

    /// Signed balance change for a debit/credit pair on this account.
    #[must_use]
    pub fn signed_delta(&self, debit: Decimal, credit: Decimal) -> Decimal {
        self.normal_balance.signed_delta(debit, credit)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Owning company.
    pub company_id: CompanyId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Explicit normal side (contra accounts); defaults from the type.
    pub normal_balance: Option<NormalBalance>,
    /// Reporting sub-type.
    pub subtype: Option<AccountSubtype>,
    /// Explicit cash-flow section.
    pub cash_flow_category: Option<CashFlowCategory>,
}

impl NewAccount {
    /// Creates an input with the type's default normal side and no tags.
    pub fn new(
        company_id: CompanyId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            company_id,
            code: code.into(),
            name: name.into(),
            account_type,
            normal_balance: None,
            subtype: None,
            cash_flow_category: None,
        }
    }

    /// Sets the reporting sub-type.
    #[must_use]
    pub fn with_subtype(mut self, subtype: AccountSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Overrides the normal balance side.
    #[must_use]
    pub fn with_normal_balance(mut self, side: NormalBalance) -> Self {
        self.normal_balance = Some(side);
        self
    }

    /// Sets the cash-flow section.
    #[must_use]
    pub fn with_cash_flow_category(mut self, category: CashFlowCategory) -> Self {
        self.cash_flow_category = Some(category);
        self
    }

    /// The normal side that will be stored.
    #[must_use]
    pub fn resolved_normal_balance(&self) -> NormalBalance {
        self.normal_balance
            .unwrap_or_else(|| self.account_type.default_normal_balance())
    }

    /// Builds a zero-balance active account with a fresh ID.
    #[must_use]
    pub fn into_account(self) -> Account {
        let normal_balance = self.resolved_normal_balance();
        Account {
            id: AccountId::new(),
            company_id: self.company_id,
            code: self.code,
            name: self.name,
            account_type: self.account_type,
            normal_balance,
            subtype: self.subtype,
            cash_flow_category: self.cash_flow_category,
            balance: Decimal::ZERO,
            is_active: true,
        }
    }
}
