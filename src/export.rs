// Export - render a dashboard view as JSON or its feed as CSV

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::view::DashboardView;

/// Flat CSV row of the post-classification feed
#[derive(Debug, Serialize)]
struct FeedRecord<'a> {
    #[serde(rename = "Date")]
    date: String,

    #[serde(rename = "Time")]
    time: String,

    #[serde(rename = "Amount")]
    amount: String,

    #[serde(rename = "MovementType")]
    movement_type: &'a str,

    #[serde(rename = "AccountNumber")]
    account_number: &'a str,
}

/// Write the transaction feed as CSV, header included. Returns rows written.
pub fn write_transactions_csv<W: Write>(view: &DashboardView, writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    for entry in view.transactions() {
        wtr.serialize(FeedRecord {
            date: entry.date.format("%Y-%m-%d").to_string(),
            time: entry.time.format("%H:%M:%S").to_string(),
            amount: format!("{:.2}", entry.amount),
            movement_type: entry.movement_type.as_str(),
            account_number: &entry.account_number,
        })
        .context("Failed to write transaction row")?;
    }

    // Header only when there are no rows
    if view.transactions().is_empty() {
        wtr.write_record(["Date", "Time", "Amount", "MovementType", "AccountNumber"])?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(view.transactions().len())
}

pub fn to_json(view: &DashboardView) -> Result<String> {
    serde_json::to_string_pretty(view).context("Failed to serialize dashboard view")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::build_dashboard;
    use crate::db::{seed_demo, setup_database};
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    fn demo_view() -> DashboardView {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let customer = seed_demo(&conn).unwrap();
        build_dashboard(&conn, customer)
    }

    #[test]
    fn test_feed_csv() {
        let view = demo_view();
        let mut out = Vec::new();

        let written = write_transactions_csv(&view, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(written, 5);
        assert_eq!(lines[0], "Date,Time,Amount,MovementType,AccountNumber");
        // Newest first, repayment halved
        assert!(lines[1].starts_with("2025-01-20,08:30:00,50.00,CC_Repayment,"));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_json_hides_integrity_flags() {
        let view = demo_view();
        let json = to_json(&view).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["net_worth"], "1250.00");
        let liabilities: Decimal = value["total_liabilities"].as_str().unwrap().parse().unwrap();
        assert_eq!(liabilities, Decimal::from(3000));
        assert_eq!(value["status"], "Complete");
        assert!(value["accounts"][0].get("owner_count").is_none());
        assert_eq!(value["accounts"][0]["kind"], "Savings");
    }
}
