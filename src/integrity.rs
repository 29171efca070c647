// 🧪 Integrity checks - structural violations in fetched rows
//
// Each category is checked after fetch. Findings carry a severity:
// - Critical: the row feeds a total, the whole aggregation fails closed
// - Error:    the category is excluded from the view
// - Warning:  reported, row kept (resolved by a documented rule)

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::error::{Category, DashboardError};
use crate::model::{Account, AccountId, CreditCard, DebitCard, Loan, TransactionRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityIssue {
    pub category: Category,
    pub severity: Severity,
    pub detail: String,
}

impl IntegrityIssue {
    fn new(category: Category, severity: Severity, detail: String) -> Self {
        IntegrityIssue {
            category,
            severity,
            detail,
        }
    }

    /// Error/Critical findings as a dashboard error; warnings are not errors
    pub fn to_error(&self) -> Option<DashboardError> {
        match self.severity {
            Severity::Warning => None,
            Severity::Error | Severity::Critical => Some(DashboardError::Integrity {
                category: self.category,
                detail: self.detail.clone(),
                affects_totals: self.severity == Severity::Critical,
            }),
        }
    }
}

/// Outcome of checking one category
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    fn push(&mut self, issue: IntegrityIssue) {
        warn!("integrity: {} ({:?}): {}", issue.category, issue.severity, issue.detail);
        self.issues.push(issue);
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Most severe blocking finding (Critical before Error), if any
    pub fn blocking(&self) -> Option<&IntegrityIssue> {
        self.issues
            .iter()
            .find(|i| i.severity == Severity::Critical)
            .or_else(|| self.issues.iter().find(|i| i.severity == Severity::Error))
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// Accounts feed TotalAssets, so ownership violations are critical
pub fn check_accounts(accounts: &[Account]) -> IntegrityReport {
    let mut report = IntegrityReport::default();
    let mut seen = HashSet::new();

    for account in accounts {
        if !seen.insert(account.id) {
            report.push(IntegrityIssue::new(
                Category::Accounts,
                Severity::Critical,
                format!("account {} returned more than once", account.id),
            ));
        }
        if account.owner_count != 1 {
            report.push(IntegrityIssue::new(
                Category::Accounts,
                Severity::Critical,
                format!(
                    "account {} has {} owners",
                    account.id, account.owner_count
                ),
            ));
        }
        if account.claims_both_subtypes {
            report.push(IntegrityIssue::new(
                Category::Accounts,
                Severity::Warning,
                format!(
                    "account {} is both savings and checking, classified as {}",
                    account.id, account.kind
                ),
            ));
        }
    }

    report
}

pub fn check_debit_cards(cards: &[DebitCard]) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    for card in cards {
        if card.also_credit {
            report.push(IntegrityIssue::new(
                Category::DebitCards,
                Severity::Error,
                format!("card {} is both debit and credit", card.card_id),
            ));
        }
    }

    report
}

pub fn check_credit_cards(cards: &[CreditCard]) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    for card in cards {
        if card.also_debit {
            report.push(IntegrityIssue::new(
                Category::CreditCards,
                Severity::Error,
                format!("card {} is both debit and credit", card.card_id),
            ));
        }
        if card.credit_limit < Decimal::ZERO {
            report.push(IntegrityIssue::new(
                Category::CreditCards,
                Severity::Error,
                format!("card {} has negative credit limit {}", card.card_id, card.credit_limit),
            ));
        }
        if let Some(available) = card.available_balance {
            if available > card.credit_limit || available < Decimal::ZERO {
                report.push(IntegrityIssue::new(
                    Category::CreditCards,
                    Severity::Error,
                    format!(
                        "card {} available balance {} outside limit {}",
                        card.card_id, available, card.credit_limit
                    ),
                ));
            }
        }
    }

    report
}

/// Loans feed TotalLiabilities, so a non-outstanding row is critical
pub fn check_loans(loans: &[Loan]) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    for loan in loans {
        if !loan.is_outstanding() {
            report.push(IntegrityIssue::new(
                Category::Loans,
                Severity::Critical,
                format!("loan {} fetched with non-positive debt {}", loan.loan_id, loan.debt),
            ));
        }
    }

    report
}

pub fn check_transactions(rows: &[TransactionRow], owned: &BTreeSet<AccountId>) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    for row in rows {
        if !owned.contains(&row.account_id) {
            report.push(IntegrityIssue::new(
                Category::Transactions,
                Severity::Error,
                format!(
                    "transaction {} touches foreign account {}",
                    row.transaction_id, row.account_id
                ),
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountKind, CardStatus, MovementType};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;

    fn account(id: AccountId) -> Account {
        Account {
            id,
            account_number: format!("ACC-{}", id),
            currency: "EUR".to_string(),
            kind: AccountKind::General,
            balance: dec!(10),
            owner_count: 1,
            claims_both_subtypes: false,
        }
    }

    fn credit_card(limit: Decimal, available: Option<Decimal>) -> CreditCard {
        CreditCard {
            card_id: 9,
            card_number: "**** 0009".to_string(),
            holder_name: "TEST".to_string(),
            expiration: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            status: CardStatus::Active,
            credit_limit: limit,
            available_balance: available,
            current_debt: CreditCard::debt_for(limit, available),
            also_debit: false,
        }
    }

    #[test]
    fn test_clean_accounts() {
        let report = check_accounts(&[account(1), account(2)]);
        assert!(report.is_clean());
        assert!(report.blocking().is_none());
    }

    #[test]
    fn test_shared_account_is_critical() {
        let mut shared = account(1);
        shared.owner_count = 2;

        let report = check_accounts(&[shared]);
        let blocking = report.blocking().unwrap();

        assert_eq!(blocking.severity, Severity::Critical);
        assert!(blocking.to_error().unwrap().is_fatal());
    }

    #[test]
    fn test_duplicate_account_is_critical() {
        let report = check_accounts(&[account(4), account(4)]);
        assert_eq!(report.blocking().unwrap().severity, Severity::Critical);
    }

    #[test]
    fn test_both_subtypes_is_warning_only() {
        let mut both = account(1);
        both.kind = AccountKind::Savings;
        both.claims_both_subtypes = true;

        let report = check_accounts(&[both]);

        assert!(!report.is_clean());
        assert!(report.blocking().is_none());
        assert_eq!(report.warnings().count(), 1);
        assert!(report.issues[0].to_error().is_none());
    }

    #[test]
    fn test_dual_specialized_debit_card() {
        let card = DebitCard {
            card_id: 3,
            card_number: "**** 0003".to_string(),
            holder_name: "TEST".to_string(),
            expiration: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            status: CardStatus::Active,
            account_id: 1,
            account_number: "ACC-1".to_string(),
            also_credit: true,
        };

        let report = check_debit_cards(&[card]);
        let error = report.blocking().unwrap().to_error().unwrap();

        assert!(!error.is_fatal());
        assert_eq!(error.category(), Some(Category::DebitCards));
    }

    #[test]
    fn test_credit_card_balance_bounds() {
        assert!(check_credit_cards(&[credit_card(dec!(5000), Some(dec!(4500)))]).is_clean());
        assert!(check_credit_cards(&[credit_card(dec!(5000), None)]).is_clean());
        assert!(!check_credit_cards(&[credit_card(dec!(5000), Some(dec!(5000.01)))]).is_clean());
        assert!(!check_credit_cards(&[credit_card(dec!(-1), None)]).is_clean());
    }

    #[test]
    fn test_repaid_loan_row_is_critical() {
        let loan = Loan {
            loan_id: 1,
            loan_type: "Car".to_string(),
            amount: dec!(8000),
            expiration: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            debt: Decimal::ZERO,
        };

        let report = check_loans(&[loan]);
        assert_eq!(report.blocking().unwrap().severity, Severity::Critical);
    }

    #[test]
    fn test_foreign_transaction_row() {
        let row = TransactionRow {
            transaction_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            amount: dec!(10),
            movement_type: MovementType::Deposit,
            account_id: 77,
            account_number: "X".to_string(),
        };
        let owned: BTreeSet<AccountId> = [1, 2].into_iter().collect();

        let report = check_transactions(&[row], &owned);
        assert_eq!(report.blocking().unwrap().severity, Severity::Error);
    }
}
