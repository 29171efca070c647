// Error taxonomy for dashboard aggregation
//
// Empty result sets are never errors. Connectivity failures and integrity
// violations that touch the totals abort the whole view; everything else is
// scoped to the category it happened in.

use rusqlite::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Aggregate category fetched for the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Accounts,
    DebitCards,
    CreditCards,
    Loans,
    Transactions,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Accounts => "accounts",
            Category::DebitCards => "debit cards",
            Category::CreditCards => "credit cards",
            Category::Loans => "loans",
            Category::Transactions => "transactions",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Store unreachable
    #[error("aggregation unavailable: {0}")]
    Connectivity(String),

    #[error("integrity violation in {category}: {detail}")]
    Integrity {
        category: Category,
        detail: String,
        affects_totals: bool,
    },

    #[error("{category} query failed: {source}")]
    Query {
        category: Category,
        #[source]
        source: rusqlite::Error,
    },
}

impl DashboardError {
    /// Classify a SQLite failure raised while fetching `category`
    pub fn from_sqlite(category: Category, err: rusqlite::Error) -> Self {
        let unreachable = matches!(
            &err,
            rusqlite::Error::SqliteFailure(failure, _)
                if matches!(
                    failure.code,
                    ErrorCode::CannotOpen
                        | ErrorCode::NotADatabase
                        | ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::SystemIoFailure
                )
        );

        if unreachable {
            DashboardError::Connectivity(err.to_string())
        } else {
            DashboardError::Query {
                category,
                source: err,
            }
        }
    }

    /// Whether this error must take the whole aggregation down
    pub fn is_fatal(&self) -> bool {
        match self {
            DashboardError::Connectivity(_) => true,
            DashboardError::Integrity { affects_totals, .. } => *affects_totals,
            DashboardError::Query { .. } => false,
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            DashboardError::Connectivity(_) => None,
            DashboardError::Integrity { category, .. } => Some(*category),
            DashboardError::Query { category, .. } => Some(*category),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    #[test]
    fn test_busy_database_is_connectivity() {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None);
        let classified = DashboardError::from_sqlite(Category::Loans, err);

        assert!(matches!(classified, DashboardError::Connectivity(_)));
        assert!(classified.is_fatal());
        assert_eq!(classified.category(), None);
    }

    #[test]
    fn test_bad_query_is_scoped_to_category() {
        let err = rusqlite::Error::InvalidColumnName("Debt".to_string());
        let classified = DashboardError::from_sqlite(Category::Loans, err);

        assert!(matches!(
            classified,
            DashboardError::Query {
                category: Category::Loans,
                ..
            }
        ));
        assert!(!classified.is_fatal());
        assert!(classified.to_string().starts_with("loans query failed"));
    }

    #[test]
    fn test_integrity_fatality_follows_totals() {
        let scoped = DashboardError::Integrity {
            category: Category::DebitCards,
            detail: "card 7 is also a credit card".to_string(),
            affects_totals: false,
        };
        let fatal = DashboardError::Integrity {
            category: Category::Accounts,
            detail: "account 3 has 2 owners".to_string(),
            affects_totals: true,
        };

        assert!(!scoped.is_fatal());
        assert!(fatal.is_fatal());
    }
}
