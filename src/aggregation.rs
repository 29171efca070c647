// ⚖️ Aggregation Engine - assets, liabilities, net worth
//
//   total_assets      = Σ account balance (missing balance row counts as 0)
//   total_liabilities = Σ loan debt, outstanding loans only
//   net_worth         = total_assets
//
// Net worth deliberately does NOT subtract liabilities. Liabilities are
// reported next to it, never netted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Category, DashboardError, Result};
use crate::model::{round_money, Account, Loan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub net_worth: Decimal,
}

impl Totals {
    pub fn summary(&self) -> String {
        format!(
            "assets {:.2}, liabilities {:.2}, net worth {:.2}",
            self.total_assets, self.total_liabilities, self.net_worth
        )
    }
}

pub struct AggregationEngine;

impl AggregationEngine {
    pub fn new() -> Self {
        AggregationEngine
    }

    pub fn total_assets(&self, accounts: &[Account]) -> Result<Decimal> {
        checked_total(Category::Accounts, "total assets", accounts.iter().map(|a| a.balance))
    }

    /// Fully repaid loans contribute nothing even if handed in
    pub fn total_liabilities(&self, loans: &[Loan]) -> Result<Decimal> {
        checked_total(
            Category::Loans,
            "total liabilities",
            loans
                .iter()
                .filter(|loan| loan.is_outstanding())
                .map(|loan| loan.debt),
        )
    }

    /// Net worth as defined by this system: total assets alone
    pub fn net_worth(&self, total_assets: Decimal, _total_liabilities: Decimal) -> Decimal {
        total_assets
    }

    pub fn aggregate(&self, accounts: &[Account], loans: &[Loan]) -> Result<Totals> {
        let total_assets = self.total_assets(accounts)?;
        let total_liabilities = self.total_liabilities(loans)?;

        Ok(Totals {
            total_assets,
            total_liabilities,
            net_worth: self.net_worth(total_assets, total_liabilities),
        })
    }
}

/// Sum amounts without wrapping; a total outside the Decimal range is an
/// integrity failure that takes the whole view down
fn checked_total<I>(category: Category, label: &str, amounts: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .map(round_money)
        .ok_or_else(|| DashboardError::Integrity {
            category,
            detail: format!("{} overflows the money range", label),
            affects_totals: true,
        })
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new()
    }
}
