// Ledger Dashboard - Core Library
// Derives a customer's consolidated position (accounts, cards, loans, recent
// transactions, totals) from the normalized banking schema

pub mod model;
pub mod error;
pub mod db;
pub mod query;
pub mod integrity;
pub mod aggregation;
pub mod classifier;
pub mod view;
pub mod dashboard;
pub mod export;
pub mod config;

// Re-export commonly used types
pub use model::{
    Account, AccountId, AccountKind, CardStatus, CreditCard, Customer, CustomerId, DebitCard,
    Loan, MovementType, TransactionRow,
};
pub use error::{Category, DashboardError};
pub use db::{
    find_customer, find_customer_by_tin, open_database, seed_demo, setup_database,
};
pub use query::{ComposedQuery, DashboardStore, QueryComposer, RECENT_TRANSACTION_LIMIT};
pub use integrity::{IntegrityIssue, IntegrityReport, Severity};
pub use aggregation::{AggregationEngine, Totals};
pub use classifier::{TransactionClassifier, TransactionEntry};
pub use view::{CategoryOutcome, CategoryResults, DashboardView, ViewAssembler, ViewIssue, ViewStatus};
pub use dashboard::{build_dashboard, build_dashboard_snapshot, build_named_dashboard, load_dashboard};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
