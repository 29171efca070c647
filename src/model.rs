// 🏦 Schema Model - Typed rows for the customer dashboard
//
// Accounts, cards, loans and transactions are stored as separate entities with
// no precomputed aggregates. These are the typed rows the store hands back,
// already resolved where a column set maps onto a single variant
// (AccountKind, CardStatus, MovementType).

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type CustomerId = i64;
pub type AccountId = i64;
pub type CardId = i64;
pub type LoanId = i64;
pub type TransactionId = i64;

/// Decimal places kept for currency amounts
pub const MONEY_SCALE: u32 = 2;

/// Round a currency amount to cents (half away from zero)
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// CUSTOMER
// ============================================================================

/// Customer record, created out-of-band and read-only here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,

    /// Tax identification number (unique login lookup key)
    pub tin: String,

    pub name: String,
}

// ============================================================================
// ACCOUNT
// ============================================================================

/// Subtype of an account, derived from presence in the savings or checking table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Savings,
    Checking,
    General,
}

impl AccountKind {
    /// Resolve the subtype from sub-table presence.
    ///
    /// Precedence is Savings > Checking > General, so a malformed account that
    /// claims both resolves to Savings.
    pub fn resolve(in_savings: bool, in_checking: bool) -> Self {
        if in_savings {
            AccountKind::Savings
        } else if in_checking {
            AccountKind::Checking
        } else {
            AccountKind::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Savings => "Savings",
            AccountKind::Checking => "Checking",
            AccountKind::General => "General",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Account owned by a customer, with its resolved subtype and balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub account_number: String,
    pub currency: String,
    pub kind: AccountKind,

    /// Zero when the account has no balance row
    pub balance: Decimal,

    /// Number of customers linked through the ownership join (must be 1)
    #[serde(skip)]
    pub owner_count: i64,

    /// Row is present in both the savings and the checking table
    #[serde(skip)]
    pub claims_both_subtypes: bool,
}

// ============================================================================
// CARDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStatus {
    Active,
    Inactive,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "Active",
            CardStatus::Inactive => "Inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(CardStatus::Active),
            "Inactive" => Some(CardStatus::Inactive),
            _ => None,
        }
    }
}

/// Debit card linked 1:1 to one of the customer's accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitCard {
    pub card_id: CardId,

    /// Masked card number (last 4 digits visible)
    pub card_number: String,
    pub holder_name: String,
    pub expiration: NaiveDate,
    pub status: CardStatus,
    pub account_id: AccountId,
    pub account_number: String,

    /// Same card id also registered as a credit card
    #[serde(skip)]
    pub also_credit: bool,
}

/// Credit card linked directly to a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    pub card_id: CardId,
    pub card_number: String,
    pub holder_name: String,
    pub expiration: NaiveDate,
    pub status: CardStatus,
    pub credit_limit: Decimal,

    /// None when the card has no balance record
    pub available_balance: Option<Decimal>,
    pub current_debt: Decimal,

    /// Same card id also registered as a debit card
    #[serde(skip)]
    pub also_debit: bool,
}

impl CreditCard {
    /// CurrentDebt = CreditLimit - AvailableBalance.
    ///
    /// A missing balance record means the whole limit is available, so the
    /// debt is zero.
    pub fn debt_for(credit_limit: Decimal, available_balance: Option<Decimal>) -> Decimal {
        credit_limit.saturating_sub(available_balance.unwrap_or(credit_limit))
    }
}

/// Mask a card number, keeping only the last 4 digits
///
/// Example: "4111111111111111" → "**** 1111"
pub fn mask_card_number(full_number: &str) -> String {
    let digits: Vec<char> = full_number.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() <= 4 {
        return digits.into_iter().collect();
    }
    let last_four: String = digits[digits.len() - 4..].iter().collect();
    format!("**** {}", last_four)
}

// ============================================================================
// LOAN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub loan_type: String,

    /// Principal amount
    pub amount: Decimal,
    pub expiration: NaiveDate,

    /// Outstanding debt
    pub debt: Decimal,
}

impl Loan {
    pub fn is_outstanding(&self) -> bool {
        self.debt > Decimal::ZERO
    }
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

/// Semantic category of the way a transaction touched an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
    CcRepayment,
    LoanPayment,
    Other(String),
}

impl MovementType {
    pub fn as_str(&self) -> &str {
        match self {
            MovementType::Deposit => "Deposit",
            MovementType::Withdrawal => "Withdrawal",
            MovementType::TransferIn => "Transfer_In",
            MovementType::TransferOut => "Transfer_Out",
            MovementType::CcRepayment => "CC_Repayment",
            MovementType::LoanPayment => "Loan_Payment",
            MovementType::Other(tag) => tag,
        }
    }
}

impl From<&str> for MovementType {
    fn from(tag: &str) -> Self {
        match tag {
            "Deposit" => MovementType::Deposit,
            "Withdrawal" => MovementType::Withdrawal,
            "Transfer_In" => MovementType::TransferIn,
            "Transfer_Out" => MovementType::TransferOut,
            "CC_Repayment" => MovementType::CcRepayment,
            "Loan_Payment" => MovementType::LoanPayment,
            other => MovementType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One (transaction, account) pair as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub amount: Decimal,
    pub movement_type: MovementType,
    pub account_id: AccountId,
    pub account_number: String,
}
