// 📋 View Assembler - one immutable dashboard object per request
//
// Each category arrives as a CategoryOutcome so partial failures stay
// visible: a failed category is an empty list plus an issue on the view,
// never a missing field.

use log::warn;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregation::{AggregationEngine, Totals};
use crate::classifier::TransactionEntry;
use crate::error::{Category, DashboardError};
use crate::integrity::IntegrityIssue;
use crate::model::{Account, CreditCard, CustomerId, DebitCard, Loan};

// ============================================================================
// CATEGORY OUTCOME
// ============================================================================

#[derive(Debug)]
pub enum CategoryOutcome<T> {
    Loaded(Vec<T>),

    /// Query ran and matched nothing
    Empty,

    /// Query not issued because an upstream category had nothing to give
    Skipped,

    Failed(DashboardError),
}

impl<T> CategoryOutcome<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            CategoryOutcome::Empty
        } else {
            CategoryOutcome::Loaded(rows)
        }
    }

    pub fn rows(&self) -> &[T] {
        match self {
            CategoryOutcome::Loaded(rows) => rows,
            _ => &[],
        }
    }

    pub fn into_rows(self) -> Vec<T> {
        match self {
            CategoryOutcome::Loaded(rows) => rows,
            _ => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&DashboardError> {
        match self {
            CategoryOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CategoryOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CategoryOutcome::Skipped)
    }
}

/// Everything fetched for one dashboard request
#[derive(Debug)]
pub struct CategoryResults {
    pub accounts: CategoryOutcome<Account>,
    pub debit_cards: CategoryOutcome<DebitCard>,
    pub credit_cards: CategoryOutcome<CreditCard>,
    pub loans: CategoryOutcome<Loan>,
    pub transactions: CategoryOutcome<TransactionEntry>,

    /// Non-blocking integrity findings
    pub warnings: Vec<IntegrityIssue>,
}

// ============================================================================
// DASHBOARD VIEW
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewStatus {
    Complete,

    /// Some categories failed and are shown empty
    Degraded,

    /// Nothing could be aggregated
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewIssue {
    /// None when the whole aggregation was affected
    pub category: Option<Category>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    customer_id: CustomerId,
    customer_name: Option<String>,
    status: ViewStatus,
    accounts: Vec<Account>,
    debit_cards: Vec<DebitCard>,
    credit_cards: Vec<CreditCard>,
    loans: Vec<Loan>,
    transactions: Vec<TransactionEntry>,
    total_assets: Decimal,
    total_liabilities: Decimal,
    net_worth: Decimal,
    issues: Vec<ViewIssue>,
}

impl DashboardView {
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn debit_cards(&self) -> &[DebitCard] {
        &self.debit_cards
    }

    pub fn credit_cards(&self) -> &[CreditCard] {
        &self.credit_cards
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn transactions(&self) -> &[TransactionEntry] {
        &self.transactions
    }

    pub fn total_assets(&self) -> Decimal {
        self.total_assets
    }

    pub fn total_liabilities(&self) -> Decimal {
        self.total_liabilities
    }

    pub fn net_worth(&self) -> Decimal {
        self.net_worth
    }

    pub fn issues(&self) -> &[ViewIssue] {
        &self.issues
    }

    pub fn totals(&self) -> Totals {
        Totals {
            total_assets: self.total_assets,
            total_liabilities: self.total_liabilities,
            net_worth: self.net_worth,
        }
    }
}

// ============================================================================
// ASSEMBLER
// ============================================================================

pub struct ViewAssembler {
    engine: AggregationEngine,
}

impl ViewAssembler {
    pub fn new() -> Self {
        ViewAssembler {
            engine: AggregationEngine::new(),
        }
    }

    /// Fold category results into the view. A fatal error in any category
    /// yields the unavailable view instead of a partial one.
    pub fn assemble(
        &self,
        customer_id: CustomerId,
        customer_name: Option<String>,
        results: CategoryResults,
    ) -> DashboardView {
        let fatal = [
            results.accounts.error(),
            results.debit_cards.error(),
            results.credit_cards.error(),
            results.loans.error(),
            results.transactions.error(),
        ]
        .into_iter()
        .flatten()
        .find(|e| e.is_fatal());

        if let Some(error) = fatal {
            return Self::unavailable(customer_id, customer_name, error);
        }

        let totals = match self
            .engine
            .aggregate(results.accounts.rows(), results.loans.rows())
        {
            Ok(totals) => totals,
            Err(e) => {
                warn!("dashboard for customer {} abandoned: {}", customer_id, e);
                return Self::unavailable(customer_id, customer_name, &e);
            }
        };

        let mut issues: Vec<ViewIssue> = [
            results.accounts.error(),
            results.debit_cards.error(),
            results.credit_cards.error(),
            results.loans.error(),
            results.transactions.error(),
        ]
        .into_iter()
        .flatten()
        .map(|e| ViewIssue {
            category: e.category(),
            message: e.to_string(),
        })
        .collect();

        let degraded = !issues.is_empty();
        if degraded {
            warn!(
                "dashboard for customer {} degraded: {} failed categories",
                customer_id,
                issues.len()
            );
        }

        issues.extend(results.warnings.iter().map(|w| ViewIssue {
            category: Some(w.category),
            message: w.detail.clone(),
        }));

        DashboardView {
            customer_id,
            customer_name,
            status: if degraded {
                ViewStatus::Degraded
            } else {
                ViewStatus::Complete
            },
            accounts: results.accounts.into_rows(),
            debit_cards: results.debit_cards.into_rows(),
            credit_cards: results.credit_cards.into_rows(),
            loans: results.loans.into_rows(),
            transactions: results.transactions.into_rows(),
            total_assets: totals.total_assets,
            total_liabilities: totals.total_liabilities,
            net_worth: totals.net_worth,
            issues,
        }
    }

    /// Empty-default view carrying the reason aggregation was abandoned
    pub fn unavailable(
        customer_id: CustomerId,
        customer_name: Option<String>,
        error: &DashboardError,
    ) -> DashboardView {
        DashboardView {
            customer_id,
            customer_name,
            status: ViewStatus::Unavailable,
            accounts: Vec::new(),
            debit_cards: Vec::new(),
            credit_cards: Vec::new(),
            loans: Vec::new(),
            transactions: Vec::new(),
            total_assets: Decimal::ZERO,
            total_liabilities: Decimal::ZERO,
            net_worth: Decimal::ZERO,
            issues: vec![ViewIssue {
                category: error.category(),
                message: error.to_string(),
            }],
        }
    }
}

impl Default for ViewAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountKind;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn account(id: i64, balance: Decimal) -> Account {
        Account {
            id,
            account_number: format!("ACC-{}", id),
            currency: "EUR".to_string(),
            kind: AccountKind::Checking,
            balance,
            owner_count: 1,
            claims_both_subtypes: false,
        }
    }

    fn loan(debt: Decimal) -> Loan {
        Loan {
            loan_id: 1,
            loan_type: "Personal".to_string(),
            amount: dec!(10000),
            expiration: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            debt,
        }
    }

    fn empty_results() -> CategoryResults {
        CategoryResults {
            accounts: CategoryOutcome::Empty,
            debit_cards: CategoryOutcome::Empty,
            credit_cards: CategoryOutcome::Empty,
            loans: CategoryOutcome::Empty,
            transactions: CategoryOutcome::Skipped,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_outcome_from_rows() {
        assert!(matches!(CategoryOutcome::<i32>::from_rows(vec![]), CategoryOutcome::Empty));
        assert_eq!(CategoryOutcome::from_rows(vec![1, 2]).rows(), &[1, 2]);
        assert!(CategoryOutcome::<i32>::Skipped.into_rows().is_empty());
    }

    #[test]
    fn test_empty_customer_view() {
        let view = ViewAssembler::new().assemble(1, None, empty_results());

        assert_eq!(view.status(), ViewStatus::Complete);
        assert!(view.accounts().is_empty());
        assert!(view.transactions().is_empty());
        assert_eq!(view.total_assets(), Decimal::ZERO);
        assert_eq!(view.total_liabilities(), Decimal::ZERO);
        assert_eq!(view.net_worth(), Decimal::ZERO);
        assert!(view.issues().is_empty());
    }

    #[test]
    fn test_failed_loans_are_isolated() {
        let mut results = empty_results();
        results.accounts = CategoryOutcome::Loaded(vec![account(1, dec!(700))]);
        results.loans = CategoryOutcome::Failed(DashboardError::Query {
            category: Category::Loans,
            source: rusqlite::Error::InvalidQuery,
        });

        let view = ViewAssembler::new().assemble(1, None, results);

        assert_eq!(view.status(), ViewStatus::Degraded);
        assert_eq!(view.accounts().len(), 1);
        assert_eq!(view.total_assets(), dec!(700));
        assert_eq!(view.total_liabilities(), Decimal::ZERO);
        assert_eq!(view.issues()[0].category, Some(Category::Loans));
    }

    #[test]
    fn test_fatal_integrity_fails_closed() {
        let mut results = empty_results();
        results.loans = CategoryOutcome::Loaded(vec![loan(dec!(3000))]);
        results.accounts = CategoryOutcome::Failed(DashboardError::Integrity {
            category: Category::Accounts,
            detail: "account 1 has 2 owners".to_string(),
            affects_totals: true,
        });

        let view = ViewAssembler::new().assemble(1, Some("Test".to_string()), results);

        assert_eq!(view.status(), ViewStatus::Unavailable);
        assert!(view.loans().is_empty());
        assert_eq!(view.total_liabilities(), Decimal::ZERO);
        assert_eq!(view.customer_name(), Some("Test"));
        assert_eq!(view.issues().len(), 1);
    }

    #[test]
    fn test_warnings_do_not_degrade() {
        let mut results = empty_results();
        results.accounts = CategoryOutcome::Loaded(vec![account(1, dec!(10))]);
        results.warnings.push(IntegrityIssue {
            category: Category::Accounts,
            severity: crate::integrity::Severity::Warning,
            detail: "account 1 is both savings and checking, classified as Savings".to_string(),
        });

        let view = ViewAssembler::new().assemble(1, None, results);

        assert_eq!(view.status(), ViewStatus::Complete);
        assert_eq!(view.issues().len(), 1);
    }

    #[test]
    fn test_net_worth_is_assets() {
        let mut results = empty_results();
        results.accounts = CategoryOutcome::Loaded(vec![account(1, dec!(500.00))]);
        results.loans = CategoryOutcome::Loaded(vec![loan(dec!(2000.00))]);

        let view = ViewAssembler::new().assemble(1, None, results);

        assert_eq!(view.net_worth(), dec!(500.00));
        assert_eq!(view.total_liabilities(), dec!(2000.00));
        assert_eq!(view.totals().net_worth, view.total_assets());
    }

    #[test]
    fn test_overflowing_totals_make_view_unavailable() {
        let huge = dec!(50000000000000000000000000000);
        let mut results = empty_results();
        results.accounts = CategoryOutcome::Loaded(vec![account(1, huge), account(2, huge)]);

        let view = ViewAssembler::new().assemble(1, None, results);

        assert_eq!(view.status(), ViewStatus::Unavailable);
        assert!(view.accounts().is_empty());
        assert_eq!(view.total_assets(), Decimal::ZERO);
        assert_eq!(view.issues()[0].category, Some(Category::Accounts));
    }
}
