// 🔎 Query Composer - parameterized fetches per aggregate category
//
// Every value reaches SQLite as a positional parameter. The transaction feed
// takes a dynamic account-ID set, so its IN-list is built from placeholders
// only ("?2, ?3, ..."), never from the ids themselves.

use chrono::{NaiveDate, NaiveTime};
use log::debug;
use rusqlite::types::{Type, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{Category, DashboardError, Result};
use crate::model::{
    mask_card_number, round_money, Account, AccountId, AccountKind, CardStatus, CreditCard,
    CustomerId, DebitCard, Loan, MovementType, TransactionRow,
};

/// Number of rows in the recent-transactions feed
pub const RECENT_TRANSACTION_LIMIT: usize = 10;

// ============================================================================
// COMPOSED QUERY
// ============================================================================

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub category: Category,
    pub sql: String,
    pub params: Vec<Value>,
}

// ============================================================================
// QUERY COMPOSER
// ============================================================================

pub struct QueryComposer {
    transaction_limit: usize,
}

impl QueryComposer {
    pub fn new() -> Self {
        QueryComposer {
            transaction_limit: RECENT_TRANSACTION_LIMIT,
        }
    }

    /// Accounts owned through the ownership join, with balance, subtype
    /// presence flags and owner count outer-joined in
    pub fn accounts(&self, customer_id: CustomerId) -> ComposedQuery {
        ComposedQuery {
            category: Category::Accounts,
            sql: "SELECT ca.AccountID, acc.AccountNumber, acc.Currency, ab.Balance,
                    sa.AccountID IS NOT NULL AS InSavings,
                    cha.AccountID IS NOT NULL AS InChecking,
                    (SELECT COUNT(*) FROM customer_accounts o WHERE o.AccountID = ca.AccountID) AS Owners
                 FROM customer_accounts ca
                 JOIN account acc ON ca.AccountID = acc.AccountID
                 LEFT JOIN accounts_balance ab ON ca.AccountID = ab.AccountID
                 LEFT JOIN savings_account sa ON ca.AccountID = sa.AccountID
                 LEFT JOIN checking_account cha ON ca.AccountID = cha.AccountID
                 WHERE ca.CustomerID = ?1
                 ORDER BY ca.AccountID"
                .to_string(),
            params: vec![Value::Integer(customer_id)],
        }
    }

    /// Active debit cards linked to accounts the customer owns
    pub fn debit_cards(&self, customer_id: CustomerId) -> ComposedQuery {
        ComposedQuery {
            category: Category::DebitCards,
            sql: "SELECT dc.CardID, c.CardNumber, c.CardholderName, c.ExpirationDate, c.Status,
                    dc.AccountID, a.AccountNumber,
                    EXISTS (SELECT 1 FROM credit_card x WHERE x.CardID = dc.CardID) AS AlsoCredit
                 FROM debit_card dc
                 JOIN card c ON dc.CardID = c.CardID
                 JOIN account a ON dc.AccountID = a.AccountID
                 JOIN customer_accounts ca ON ca.AccountID = dc.AccountID
                 WHERE ca.CustomerID = ?1 AND c.Status = ?2
                 ORDER BY dc.CardID"
                .to_string(),
            params: vec![
                Value::Integer(customer_id),
                Value::Text(CardStatus::Active.as_str().to_string()),
            ],
        }
    }

    /// Active credit cards with their optional balance record
    pub fn credit_cards(&self, customer_id: CustomerId) -> ComposedQuery {
        ComposedQuery {
            category: Category::CreditCards,
            sql: "SELECT cc.CardID, c.CardNumber, c.CardholderName, c.ExpirationDate, c.Status,
                    cc.CreditLimit, ccb.AvailableBalance,
                    EXISTS (SELECT 1 FROM debit_card x WHERE x.CardID = cc.CardID) AS AlsoDebit
                 FROM credit_card cc
                 JOIN card c ON cc.CardID = c.CardID
                 LEFT JOIN credit_card_balance ccb ON cc.CardID = ccb.CardID
                 WHERE cc.CustomerID = ?1 AND c.Status = ?2
                 ORDER BY cc.CardID"
                .to_string(),
            params: vec![
                Value::Integer(customer_id),
                Value::Text(CardStatus::Active.as_str().to_string()),
            ],
        }
    }

    /// Loans with outstanding debt
    pub fn loans(&self, customer_id: CustomerId) -> ComposedQuery {
        ComposedQuery {
            category: Category::Loans,
            sql: "SELECT LoanID, Type, Amount, ExpirationDate, Debt
                 FROM loan
                 WHERE CustomerID = ?1 AND ROUND(CAST(Debt AS REAL), 2) > 0
                 ORDER BY LoanID"
                .to_string(),
            params: vec![Value::Integer(customer_id)],
        }
    }

    /// Most recent transaction legs touching any of `account_ids`.
    ///
    /// Returns `None` for an empty set: there is nothing to fetch and an
    /// empty IN-list is not valid SQL.
    pub fn recent_transactions(&self, account_ids: &BTreeSet<AccountId>) -> Option<ComposedQuery> {
        if account_ids.is_empty() {
            return None;
        }

        let in_list = (1..=account_ids.len())
            .map(|n| format!("?{}", n))
            .collect::<Vec<_>>()
            .join(", ");
        let limit_slot = account_ids.len() + 1;

        let sql = format!(
            "SELECT t.TransactionID, t.Date, t.Time, t.Amount, at.MovementType,
                at.AccountID, a.AccountNumber
             FROM bank_transaction t
             JOIN account_transaction at ON t.TransactionID = at.TransactionID
             JOIN account a ON at.AccountID = a.AccountID
             WHERE at.AccountID IN ({})
             ORDER BY t.Date DESC, t.Time DESC, t.TransactionID DESC
             LIMIT ?{}",
            in_list, limit_slot
        );

        let mut params: Vec<Value> = account_ids.iter().map(|id| Value::Integer(*id)).collect();
        params.push(Value::Integer(self.transaction_limit as i64));

        Some(ComposedQuery {
            category: Category::Transactions,
            sql,
            params,
        })
    }
}

impl Default for QueryComposer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// STORE CONTRACT
// ============================================================================

/// Read-side store the dashboard aggregates from.
///
/// Zero matching rows is `Ok(vec![])`, never an error.
pub trait DashboardStore {
    fn fetch_accounts(&self, customer_id: CustomerId) -> Result<Vec<Account>>;

    fn fetch_debit_cards(&self, customer_id: CustomerId) -> Result<Vec<DebitCard>>;

    fn fetch_credit_cards(&self, customer_id: CustomerId) -> Result<Vec<CreditCard>>;

    fn fetch_loans(&self, customer_id: CustomerId) -> Result<Vec<Loan>>;

    /// Callers never pass an empty set; implementations still answer it with
    /// an empty feed.
    fn fetch_recent_transactions(&self, account_ids: &BTreeSet<AccountId>) -> Result<Vec<TransactionRow>>;
}

impl DashboardStore for Connection {
    fn fetch_accounts(&self, customer_id: CustomerId) -> Result<Vec<Account>> {
        let query = QueryComposer::new().accounts(customer_id);
        run(self, &query, |row| {
            let in_savings: bool = row.get(4)?;
            let in_checking: bool = row.get(5)?;

            Ok(Account {
                id: row.get(0)?,
                account_number: row.get(1)?,
                currency: row.get(2)?,
                kind: AccountKind::resolve(in_savings, in_checking),
                balance: money_at(row, 3)?.unwrap_or(Decimal::ZERO),
                owner_count: row.get(6)?,
                claims_both_subtypes: in_savings && in_checking,
            })
        })
    }

    fn fetch_debit_cards(&self, customer_id: CustomerId) -> Result<Vec<DebitCard>> {
        let query = QueryComposer::new().debit_cards(customer_id);
        run(self, &query, |row| {
            let number: String = row.get(1)?;

            Ok(DebitCard {
                card_id: row.get(0)?,
                card_number: mask_card_number(&number),
                holder_name: row.get(2)?,
                expiration: row.get::<_, NaiveDate>(3)?,
                status: status_at(row, 4)?,
                account_id: row.get(5)?,
                account_number: row.get(6)?,
                also_credit: row.get(7)?,
            })
        })
    }

    fn fetch_credit_cards(&self, customer_id: CustomerId) -> Result<Vec<CreditCard>> {
        let query = QueryComposer::new().credit_cards(customer_id);
        run(self, &query, |row| {
            let number: String = row.get(1)?;
            let credit_limit = required_money_at(row, 5)?;
            let available_balance = money_at(row, 6)?;

            Ok(CreditCard {
                card_id: row.get(0)?,
                card_number: mask_card_number(&number),
                holder_name: row.get(2)?,
                expiration: row.get::<_, NaiveDate>(3)?,
                status: status_at(row, 4)?,
                credit_limit,
                available_balance,
                current_debt: CreditCard::debt_for(credit_limit, available_balance),
                also_debit: row.get(7)?,
            })
        })
    }

    fn fetch_loans(&self, customer_id: CustomerId) -> Result<Vec<Loan>> {
        let query = QueryComposer::new().loans(customer_id);
        run(self, &query, |row| {
            Ok(Loan {
                loan_id: row.get(0)?,
                loan_type: row.get(1)?,
                amount: required_money_at(row, 2)?,
                expiration: row.get::<_, NaiveDate>(3)?,
                debt: required_money_at(row, 4)?,
            })
        })
    }

    fn fetch_recent_transactions(&self, account_ids: &BTreeSet<AccountId>) -> Result<Vec<TransactionRow>> {
        let Some(query) = QueryComposer::new().recent_transactions(account_ids) else {
            return Ok(Vec::new());
        };

        run(self, &query, |row| {
            let movement_type: String = row.get(4)?;

            Ok(TransactionRow {
                transaction_id: row.get(0)?,
                date: row.get::<_, NaiveDate>(1)?,
                time: row.get::<_, NaiveTime>(2)?,
                amount: required_money_at(row, 3)?,
                movement_type: MovementType::from(movement_type.as_str()),
                account_id: row.get(5)?,
                account_number: row.get(6)?,
            })
        })
    }
}

/// Execute a composed query and map every row
fn run<T, F>(conn: &Connection, query: &ComposedQuery, map_row: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    debug!(
        "fetching {} ({} parameters)",
        query.category,
        query.params.len()
    );

    let fetch = || -> rusqlite::Result<Vec<T>> {
        let mut stmt = conn.prepare(&query.sql)?;
        let rows = stmt
            .query_map(params_from_iter(query.params.iter()), map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    };

    fetch().map_err(|e| DashboardError::from_sqlite(query.category, e))
}

// ============================================================================
// COLUMN DECODING
// ============================================================================

/// Decode a money column. TEXT cells are parsed exactly; REAL cells are
/// rounded to cents at this boundary.
fn money_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(value) => Ok(Some(Decimal::from(value))),
        ValueRef::Real(value) => Decimal::from_f64_retain(value)
            .map(|amount| Some(round_money(amount)))
            .ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Real, "non-finite amount".into())
            }),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))?;
            Decimal::from_str(text.trim())
                .map(Some)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
        }
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "amount".to_string(),
            Type::Blob,
        )),
    }
}

fn required_money_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    money_at(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "amount".to_string(),
        Type::Null,
    ))
}

fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<CardStatus> {
    let status: String = row.get(idx)?;
    CardStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown card status {:?}", status).into(),
        )
    })
}
