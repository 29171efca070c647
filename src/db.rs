// 🗄️ Relational store - schema, fixtures writers, customer lookup
//
// Accounts, cards, loans and transactions live in separate tables with no
// precomputed aggregates. Money columns hold canonical decimal strings.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;

use crate::model::{
    AccountId, AccountKind, CardId, CardStatus, Customer, CustomerId, LoanId, TransactionId,
};

/// Open (or create) a file database with foreign keys enforced
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {:?}", path))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    debug!("opened database {:?}", path);
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Customers and accounts
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS customer (
            CustomerID INTEGER PRIMARY KEY AUTOINCREMENT,
            TIN TEXT UNIQUE NOT NULL,
            Name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS account (
            AccountID INTEGER PRIMARY KEY AUTOINCREMENT,
            AccountNumber TEXT UNIQUE NOT NULL,
            Currency TEXT NOT NULL
        );

        -- Ownership join
        CREATE TABLE IF NOT EXISTS customer_accounts (
            CustomerID INTEGER NOT NULL REFERENCES customer(CustomerID),
            AccountID INTEGER NOT NULL REFERENCES account(AccountID),
            PRIMARY KEY (CustomerID, AccountID)
        );

        CREATE TABLE IF NOT EXISTS accounts_balance (
            AccountID INTEGER PRIMARY KEY REFERENCES account(AccountID),
            Balance TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS savings_account (
            AccountID INTEGER PRIMARY KEY REFERENCES account(AccountID),
            InterestRate TEXT
        );

        CREATE TABLE IF NOT EXISTS checking_account (
            AccountID INTEGER PRIMARY KEY REFERENCES account(AccountID),
            OverdraftLimit TEXT
        );",
    )?;

    // ==========================================================================
    // Cards (debit and credit specializations)
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS card (
            CardID INTEGER PRIMARY KEY AUTOINCREMENT,
            CardNumber TEXT NOT NULL,
            CardholderName TEXT NOT NULL,
            ExpirationDate TEXT NOT NULL,
            Status TEXT NOT NULL CHECK (Status IN ('Active', 'Inactive'))
        );

        CREATE TABLE IF NOT EXISTS debit_card (
            CardID INTEGER PRIMARY KEY REFERENCES card(CardID),
            AccountID INTEGER UNIQUE NOT NULL REFERENCES account(AccountID)
        );

        CREATE TABLE IF NOT EXISTS credit_card (
            CardID INTEGER PRIMARY KEY REFERENCES card(CardID),
            CustomerID INTEGER NOT NULL REFERENCES customer(CustomerID),
            CreditLimit TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS credit_card_balance (
            CardID INTEGER PRIMARY KEY REFERENCES credit_card(CardID),
            AvailableBalance TEXT NOT NULL
        );",
    )?;

    // ==========================================================================
    // Loans and transactions
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS loan (
            LoanID INTEGER PRIMARY KEY AUTOINCREMENT,
            CustomerID INTEGER NOT NULL REFERENCES customer(CustomerID),
            Type TEXT NOT NULL,
            Amount TEXT NOT NULL,
            ExpirationDate TEXT NOT NULL,
            Debt TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bank_transaction (
            TransactionID INTEGER PRIMARY KEY AUTOINCREMENT,
            Date TEXT NOT NULL,
            Time TEXT NOT NULL,
            Amount TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS account_transaction (
            TransactionID INTEGER NOT NULL REFERENCES bank_transaction(TransactionID),
            AccountID INTEGER NOT NULL REFERENCES account(AccountID),
            MovementType TEXT NOT NULL,
            PRIMARY KEY (TransactionID, AccountID)
        );",
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_customer_accounts_account ON customer_accounts(AccountID);
        CREATE INDEX IF NOT EXISTS idx_credit_card_customer ON credit_card(CustomerID);
        CREATE INDEX IF NOT EXISTS idx_loan_customer ON loan(CustomerID);
        CREATE INDEX IF NOT EXISTS idx_account_transaction_account ON account_transaction(AccountID);
        CREATE INDEX IF NOT EXISTS idx_transaction_date ON bank_transaction(Date, Time);",
    )?;

    Ok(())
}

// ============================================================================
// CUSTOMER LOOKUP
// ============================================================================

/// Resolve a customer by TIN (login lookup key). Unknown TIN is `Ok(None)`.
pub fn find_customer_by_tin(conn: &Connection, tin: &str) -> Result<Option<Customer>> {
    let customer = conn
        .query_row(
            "SELECT CustomerID, TIN, Name FROM customer WHERE TIN = ?1",
            params![tin.trim()],
            |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    tin: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )
        .optional()
        .context("Failed to look up customer by TIN")?;

    Ok(customer)
}

pub fn find_customer(conn: &Connection, customer_id: CustomerId) -> Result<Option<Customer>> {
    let customer = conn
        .query_row(
            "SELECT CustomerID, TIN, Name FROM customer WHERE CustomerID = ?1",
            params![customer_id],
            |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    tin: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )
        .optional()
        .context("Failed to look up customer")?;

    Ok(customer)
}

// ============================================================================
// WRITERS (fixtures and demo seed)
// ============================================================================

pub fn insert_customer(conn: &Connection, tin: &str, name: &str) -> Result<CustomerId> {
    conn.execute(
        "INSERT INTO customer (TIN, Name) VALUES (?1, ?2)",
        params![tin, name],
    )
    .with_context(|| format!("Failed to insert customer {}", tin))?;
    Ok(conn.last_insert_rowid())
}

/// Insert an account owned by `customer_id`, registering its subtype row
pub fn insert_account(
    conn: &Connection,
    customer_id: CustomerId,
    account_number: &str,
    currency: &str,
    kind: AccountKind,
) -> Result<AccountId> {
    conn.execute(
        "INSERT INTO account (AccountNumber, Currency) VALUES (?1, ?2)",
        params![account_number, currency],
    )
    .with_context(|| format!("Failed to insert account {}", account_number))?;
    let account_id = conn.last_insert_rowid();

    link_account_owner(conn, customer_id, account_id)?;

    match kind {
        AccountKind::Savings => {
            conn.execute(
                "INSERT INTO savings_account (AccountID) VALUES (?1)",
                params![account_id],
            )?;
        }
        AccountKind::Checking => {
            conn.execute(
                "INSERT INTO checking_account (AccountID) VALUES (?1)",
                params![account_id],
            )?;
        }
        AccountKind::General => {}
    }

    Ok(account_id)
}

pub fn link_account_owner(
    conn: &Connection,
    customer_id: CustomerId,
    account_id: AccountId,
) -> Result<()> {
    conn.execute(
        "INSERT INTO customer_accounts (CustomerID, AccountID) VALUES (?1, ?2)",
        params![customer_id, account_id],
    )?;
    Ok(())
}

pub fn upsert_account_balance(conn: &Connection, account_id: AccountId, balance: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO accounts_balance (AccountID, Balance) VALUES (?1, ?2)
         ON CONFLICT(AccountID) DO UPDATE SET Balance = excluded.Balance",
        params![account_id, balance.to_string()],
    )?;
    Ok(())
}

/// Card attributes shared by both specializations
#[derive(Debug, Clone)]
pub struct NewCard<'a> {
    pub number: &'a str,
    pub holder_name: &'a str,
    pub expiration: NaiveDate,
    pub status: CardStatus,
}

fn insert_card(conn: &Connection, card: &NewCard<'_>) -> Result<CardId> {
    conn.execute(
        "INSERT INTO card (CardNumber, CardholderName, ExpirationDate, Status)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            card.number,
            card.holder_name,
            card.expiration,
            card.status.as_str()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_debit_card(conn: &Connection, account_id: AccountId, card: &NewCard<'_>) -> Result<CardId> {
    let card_id = insert_card(conn, card)?;
    conn.execute(
        "INSERT INTO debit_card (CardID, AccountID) VALUES (?1, ?2)",
        params![card_id, account_id],
    )
    .with_context(|| format!("Failed to link debit card to account {}", account_id))?;
    Ok(card_id)
}

pub fn insert_credit_card(
    conn: &Connection,
    customer_id: CustomerId,
    card: &NewCard<'_>,
    credit_limit: Decimal,
) -> Result<CardId> {
    let card_id = insert_card(conn, card)?;
    register_credit_card(conn, card_id, customer_id, credit_limit)?;
    Ok(card_id)
}

/// Attach the credit specialization to an existing card row
pub fn register_credit_card(
    conn: &Connection,
    card_id: CardId,
    customer_id: CustomerId,
    credit_limit: Decimal,
) -> Result<()> {
    conn.execute(
        "INSERT INTO credit_card (CardID, CustomerID, CreditLimit) VALUES (?1, ?2, ?3)",
        params![card_id, customer_id, credit_limit.to_string()],
    )?;
    Ok(())
}

pub fn upsert_credit_card_balance(conn: &Connection, card_id: CardId, available: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO credit_card_balance (CardID, AvailableBalance) VALUES (?1, ?2)
         ON CONFLICT(CardID) DO UPDATE SET AvailableBalance = excluded.AvailableBalance",
        params![card_id, available.to_string()],
    )?;
    Ok(())
}

pub fn insert_loan(
    conn: &Connection,
    customer_id: CustomerId,
    loan_type: &str,
    amount: Decimal,
    expiration: NaiveDate,
    debt: Decimal,
) -> Result<LoanId> {
    conn.execute(
        "INSERT INTO loan (CustomerID, Type, Amount, ExpirationDate, Debt)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            customer_id,
            loan_type,
            amount.to_string(),
            expiration,
            debt.to_string()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a transaction and the (account, movement type) legs it touched
pub fn insert_transaction(
    conn: &Connection,
    date: NaiveDate,
    time: NaiveTime,
    amount: Decimal,
    legs: &[(AccountId, &str)],
) -> Result<TransactionId> {
    conn.execute(
        "INSERT INTO bank_transaction (Date, Time, Amount) VALUES (?1, ?2, ?3)",
        params![
            date.format("%Y-%m-%d").to_string(),
            time.format("%H:%M:%S").to_string(),
            amount.to_string()
        ],
    )?;
    let transaction_id = conn.last_insert_rowid();

    for (account_id, movement_type) in legs {
        conn.execute(
            "INSERT INTO account_transaction (TransactionID, AccountID, MovementType)
             VALUES (?1, ?2, ?3)",
            params![transaction_id, account_id, movement_type],
        )?;
    }

    Ok(transaction_id)
}

// ============================================================================
// DEMO SEED
// ============================================================================

/// TIN of the customer written by `seed_demo`
pub const DEMO_TIN: &str = "100200300";

/// Seed the reference customer: one savings (1000.00) and one checking
/// (250.00) account, an active credit card with 500 of debt, an outstanding
/// loan of 3000 and a repaid one, plus a handful of transactions.
pub fn seed_demo(conn: &Connection) -> Result<CustomerId> {
    if let Some(existing) = find_customer_by_tin(conn, DEMO_TIN)? {
        info!("demo customer already present (id {})", existing.id);
        return Ok(existing.id);
    }

    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).context("invalid seed date");
    let time = |h, m, s| NaiveTime::from_hms_opt(h, m, s).context("invalid seed time");

    let customer_id = insert_customer(conn, DEMO_TIN, "Demo Customer")?;

    let savings = insert_account(conn, customer_id, "GR1601101250000000012300695", "EUR", AccountKind::Savings)?;
    upsert_account_balance(conn, savings, Decimal::new(100000, 2))?;

    let checking = insert_account(conn, customer_id, "GR1601101250000000012300696", "EUR", AccountKind::Checking)?;
    upsert_account_balance(conn, checking, Decimal::new(25000, 2))?;

    insert_debit_card(
        conn,
        checking,
        &NewCard {
            number: "4000001234567899",
            holder_name: "DEMO CUSTOMER",
            expiration: date(2029, 8, 31)?,
            status: CardStatus::Active,
        },
    )?;

    let credit = insert_credit_card(
        conn,
        customer_id,
        &NewCard {
            number: "5100009876543210",
            holder_name: "DEMO CUSTOMER",
            expiration: date(2028, 3, 31)?,
            status: CardStatus::Active,
        },
        Decimal::new(5000, 0),
    )?;
    upsert_credit_card_balance(conn, credit, Decimal::new(4500, 0))?;

    insert_loan(conn, customer_id, "Personal", Decimal::new(10000, 0), date(2030, 12, 31)?, Decimal::new(3000, 0))?;
    insert_loan(conn, customer_id, "Car", Decimal::new(8000, 0), date(2024, 6, 30)?, Decimal::ZERO)?;

    insert_transaction(conn, date(2025, 1, 10)?, time(9, 15, 0)?, Decimal::new(150000, 2), &[(savings, "Deposit")])?;
    insert_transaction(conn, date(2025, 1, 12)?, time(18, 40, 5)?, Decimal::new(4250, 2), &[(checking, "Withdrawal")])?;
    insert_transaction(
        conn,
        date(2025, 1, 15)?,
        time(11, 0, 0)?,
        Decimal::new(20000, 2),
        &[(savings, "Transfer_Out"), (checking, "Transfer_In")],
    )?;
    insert_transaction(conn, date(2025, 1, 20)?, time(8, 30, 0)?, Decimal::new(10000, 2), &[(checking, "CC_Repayment")])?;

    info!("seeded demo customer {} ({})", customer_id, DEMO_TIN);
    Ok(customer_id)
}
