// 🏷️ Transaction Classifier - presentation transforms per movement type
//
// Works on a view-layer copy. The persisted rows are only borrowed, so their
// amounts cannot change.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{round_money, AccountId, MovementType, TransactionId, TransactionRow};

/// Transaction as shown in the dashboard feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub time: NaiveTime,

    /// Display amount (after classification)
    pub amount: Decimal,
    pub movement_type: MovementType,
    pub account_id: AccountId,
    pub account_number: String,
}

pub struct TransactionClassifier;

impl TransactionClassifier {
    pub fn new() -> Self {
        TransactionClassifier
    }

    /// Display amount for one persisted row. Credit-card repayments are
    /// shown at half their persisted amount.
    pub fn display_amount(&self, row: &TransactionRow) -> Decimal {
        match row.movement_type {
            MovementType::CcRepayment => round_money(row.amount / Decimal::TWO),
            _ => row.amount,
        }
    }

    pub fn classify(&self, row: &TransactionRow) -> TransactionEntry {
        TransactionEntry {
            transaction_id: row.transaction_id,
            date: row.date,
            time: row.time,
            amount: self.display_amount(row),
            movement_type: row.movement_type.clone(),
            account_id: row.account_id,
            account_number: row.account_number.clone(),
        }
    }

    /// Classify a fetched feed, keeping its order
    pub fn classify_all(&self, rows: &[TransactionRow]) -> Vec<TransactionEntry> {
        rows.iter().map(|row| self.classify(row)).collect()
    }
}

impl Default for TransactionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(movement_type: &str, amount: Decimal) -> TransactionRow {
        TransactionRow {
            transaction_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            amount,
            movement_type: MovementType::from(movement_type),
            account_id: 1,
            account_number: "ACC-1".to_string(),
        }
    }

    #[test]
    fn test_cc_repayment_is_halved_on_copy() {
        let classifier = TransactionClassifier::new();
        let persisted = row("CC_Repayment", dec!(100.00));

        let entry = classifier.classify(&persisted);

        assert_eq!(entry.amount, dec!(50.00));
        assert_eq!(persisted.amount, dec!(100.00));
    }

    #[test]
    fn test_other_movements_pass_through() {
        let classifier = TransactionClassifier::new();

        for tag in ["Deposit", "Withdrawal", "Transfer_In", "Transfer_Out", "Loan_Payment", "Fee"] {
            let entry = classifier.classify(&row(tag, dec!(100.00)));
            assert_eq!(entry.amount, dec!(100.00), "{} should pass through", tag);
        }
    }

    #[test]
    fn test_odd_cent_halving_rounds() {
        let classifier = TransactionClassifier::new();
        assert_eq!(classifier.display_amount(&row("CC_Repayment", dec!(0.05))), dec!(0.03));
        assert_eq!(classifier.display_amount(&row("CC_Repayment", dec!(99.99))), dec!(50.00));
    }

    #[test]
    fn test_classify_all_applies_once_and_keeps_order() {
        let classifier = TransactionClassifier::new();
        let mut first = row("CC_Repayment", dec!(80));
        first.transaction_id = 2;
        let second = row("Deposit", dec!(30));
        let rows = vec![first, second];

        let entries = classifier.classify_all(&rows);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].transaction_id, 2);
        assert_eq!(entries[0].amount, dec!(40));
        assert_eq!(entries[1].amount, dec!(30));
        assert_eq!(rows[0].amount, dec!(80));
    }
}
