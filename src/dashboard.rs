// 📊 Dashboard - aggregation entry points
//
// Customer identity is an explicit parameter. Fetch order is fixed:
// accounts first (their ids gate the transaction feed), then cards and
// loans, then the feed. A connectivity failure anywhere stops the fetches
// and yields the unavailable view.

use log::{debug, error, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::BTreeSet;

use crate::classifier::TransactionClassifier;
use crate::db::find_customer;
use crate::error::{DashboardError, Result};
use crate::integrity::{
    check_accounts, check_credit_cards, check_debit_cards, check_loans, check_transactions,
    IntegrityIssue, IntegrityReport,
};
use crate::model::{AccountId, CustomerId};
use crate::query::DashboardStore;
use crate::view::{CategoryOutcome, CategoryResults, DashboardView, ViewAssembler};

/// Build the dashboard view for `customer_id` from any store
pub fn build_dashboard<S: DashboardStore + ?Sized>(store: &S, customer_id: CustomerId) -> DashboardView {
    build_named_dashboard(store, customer_id, None)
}

pub fn build_named_dashboard<S: DashboardStore + ?Sized>(
    store: &S,
    customer_id: CustomerId,
    customer_name: Option<String>,
) -> DashboardView {
    let assembler = ViewAssembler::new();

    match fetch_categories(store, customer_id) {
        Ok(results) => {
            let view = assembler.assemble(customer_id, customer_name, results);
            info!(
                "dashboard for customer {}: {:?}, {}",
                customer_id,
                view.status(),
                view.totals().summary()
            );
            view
        }
        Err(e) => {
            error!("dashboard for customer {} unavailable: {}", customer_id, e);
            ViewAssembler::unavailable(customer_id, customer_name, &e)
        }
    }
}

/// Build the dashboard inside one deferred read transaction so every
/// category sees the same snapshot of the store
pub fn build_dashboard_snapshot(conn: &mut Connection, customer_id: CustomerId) -> DashboardView {
    let snapshot = match conn.transaction_with_behavior(TransactionBehavior::Deferred) {
        Ok(tx) => tx,
        Err(e) => {
            let e = DashboardError::Connectivity(e.to_string());
            error!("dashboard for customer {} unavailable: {}", customer_id, e);
            return ViewAssembler::unavailable(customer_id, None, &e);
        }
    };

    let view = build_named_dashboard(&*snapshot, customer_id, customer_name(&snapshot, customer_id));

    if let Err(e) = snapshot.commit() {
        warn!("closing read snapshot failed: {}", e);
    }

    view
}

/// Build the dashboard from a connection, with or without a read snapshot
pub fn load_dashboard(conn: &mut Connection, customer_id: CustomerId, snapshot_reads: bool) -> DashboardView {
    if snapshot_reads {
        build_dashboard_snapshot(conn, customer_id)
    } else {
        let name = customer_name(conn, customer_id);
        build_named_dashboard(&*conn, customer_id, name)
    }
}

fn customer_name(conn: &Connection, customer_id: CustomerId) -> Option<String> {
    match find_customer(conn, customer_id) {
        Ok(customer) => customer.map(|c| c.name),
        Err(e) => {
            warn!("customer {} name lookup failed: {:#}", customer_id, e);
            None
        }
    }
}

// ============================================================================
// CATEGORY FETCHES
// ============================================================================

/// Fetch and check every category. Only connectivity failures escape as
/// `Err`; everything else is recorded on its category.
pub fn fetch_categories<S: DashboardStore + ?Sized>(
    store: &S,
    customer_id: CustomerId,
) -> Result<CategoryResults> {
    let mut warnings = Vec::new();

    let accounts = settle(store.fetch_accounts(customer_id), check_accounts, &mut warnings)?;
    let debit_cards = settle(store.fetch_debit_cards(customer_id), check_debit_cards, &mut warnings)?;
    let credit_cards = settle(store.fetch_credit_cards(customer_id), check_credit_cards, &mut warnings)?;
    let loans = settle(store.fetch_loans(customer_id), check_loans, &mut warnings)?;

    let owned: BTreeSet<AccountId> = accounts.rows().iter().map(|a| a.id).collect();

    let transactions = if accounts.is_failed() || owned.is_empty() {
        CategoryOutcome::Skipped
    } else {
        let rows = settle(
            store.fetch_recent_transactions(&owned),
            |rows| check_transactions(rows, &owned),
            &mut warnings,
        )?;
        match rows {
            CategoryOutcome::Loaded(rows) => {
                CategoryOutcome::Loaded(TransactionClassifier::new().classify_all(&rows))
            }
            CategoryOutcome::Empty => CategoryOutcome::Empty,
            CategoryOutcome::Skipped => CategoryOutcome::Skipped,
            CategoryOutcome::Failed(e) => CategoryOutcome::Failed(e),
        }
    };

    if transactions.is_skipped() {
        debug!("transaction feed skipped for customer {}", customer_id);
    }

    Ok(CategoryResults {
        accounts,
        debit_cards,
        credit_cards,
        loans,
        transactions,
        warnings,
    })
}

/// Turn one category fetch into its outcome, applying its integrity check
fn settle<T, F>(
    fetched: Result<Vec<T>>,
    check: F,
    warnings: &mut Vec<IntegrityIssue>,
) -> Result<CategoryOutcome<T>>
where
    F: FnOnce(&[T]) -> IntegrityReport,
{
    let rows = match fetched {
        Ok(rows) => rows,
        Err(DashboardError::Connectivity(reason)) => {
            return Err(DashboardError::Connectivity(reason));
        }
        Err(e) => {
            warn!("{}", e);
            return Ok(CategoryOutcome::Failed(e));
        }
    };

    let report = check(&rows);
    if report.is_clean() {
        return Ok(CategoryOutcome::from_rows(rows));
    }
    if let Some(error) = report.blocking().and_then(|issue| issue.to_error()) {
        return Ok(CategoryOutcome::Failed(error));
    }
    warnings.extend(report.warnings().cloned());

    Ok(CategoryOutcome::from_rows(rows))
}
