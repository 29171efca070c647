use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;

use ledger_dashboard::export::{to_json, write_transactions_csv};
use ledger_dashboard::{
    find_customer_by_tin, load_dashboard, open_database, seed_demo, setup_database, Config,
    CustomerId, DashboardView, ViewStatus,
};

const USAGE: &str = "usage: ledger-dashboard <command>

commands:
  init                              create the schema
  seed                              create the schema and the demo customer
  dashboard <CUSTOMER_ID> [--json]  show a customer's dashboard
  login <TIN> [--json]              look a customer up by TIN and show the dashboard
  export <CUSTOMER_ID> <FILE.csv>   write the recent transaction feed as CSV";

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env()?;

    match args.first().map(String::as_str) {
        Some("init") => run_init(&config),
        Some("seed") => run_seed(&config),
        Some("dashboard") => {
            let customer_id = parse_customer_id(args.get(1))?;
            run_dashboard(&config, customer_id, has_flag(&args, "--json"))
        }
        Some("login") => {
            let tin = args.get(1).context("login needs a TIN")?;
            run_login(&config, tin, has_flag(&args, "--json"))
        }
        Some("export") => {
            let customer_id = parse_customer_id(args.get(1))?;
            let path = args.get(2).context("export needs an output file")?;
            run_export(&config, customer_id, path)
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn init_logging() {
    let filters = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_customer_id(raw: Option<&String>) -> Result<CustomerId> {
    let raw = raw.context("missing CUSTOMER_ID")?;
    raw.parse()
        .with_context(|| format!("CUSTOMER_ID must be an integer, got {:?}", raw))
}

fn run_init(config: &Config) -> Result<()> {
    let conn = open_database(&config.database_path)?;
    setup_database(&conn)?;
    println!("✓ Schema ready in {:?}", config.database_path);
    Ok(())
}

fn run_seed(config: &Config) -> Result<()> {
    let conn = open_database(&config.database_path)?;
    setup_database(&conn)?;
    let customer_id = seed_demo(&conn)?;
    println!("✓ Demo customer {} ready (login with TIN {})", customer_id, ledger_dashboard::db::DEMO_TIN);
    Ok(())
}

fn run_dashboard(config: &Config, customer_id: CustomerId, json: bool) -> Result<()> {
    let mut conn = open_database(&config.database_path)?;
    let view = load_dashboard(&mut conn, customer_id, config.snapshot_reads);
    render(&view, json)
}

fn run_login(config: &Config, tin: &str, json: bool) -> Result<()> {
    let mut conn = open_database(&config.database_path)?;

    let Some(customer) = find_customer_by_tin(&conn, tin)? else {
        bail!("Invalid TIN. No customer found.");
    };

    if !json {
        println!("Welcome, {}!", customer.name);
    }
    let view = load_dashboard(&mut conn, customer.id, config.snapshot_reads);
    render(&view, json)
}

fn run_export(config: &Config, customer_id: CustomerId, path: &str) -> Result<()> {
    let mut conn = open_database(&config.database_path)?;
    let view = load_dashboard(&mut conn, customer_id, config.snapshot_reads);

    if view.status() == ViewStatus::Unavailable {
        bail!("Dashboard unavailable for customer {}", customer_id);
    }

    let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
    let written = write_transactions_csv(&view, file)?;
    println!("✓ Exported {} transactions to {}", written, path);
    Ok(())
}

fn render(view: &DashboardView, json: bool) -> Result<()> {
    if json {
        println!("{}", to_json(view)?);
        return Ok(());
    }

    println!("📊 Dashboard for customer {}", view.customer_id());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match view.status() {
        ViewStatus::Complete => {}
        ViewStatus::Degraded => println!("⚠️  Some sections could not be loaded"),
        ViewStatus::Unavailable => println!("❌ Aggregation unavailable"),
    }
    for issue in view.issues() {
        println!("   - {}", issue.message);
    }

    println!("\n🏦 Accounts");
    for account in view.accounts() {
        println!(
            "   {:<30} {:<9} {:>12.2} {}",
            account.account_number, account.kind, account.balance, account.currency
        );
    }

    println!("\n💳 Debit cards");
    for card in view.debit_cards() {
        println!(
            "   {} {} (exp {}) → {}",
            card.card_number, card.holder_name, card.expiration, card.account_number
        );
    }

    println!("\n💳 Credit cards");
    for card in view.credit_cards() {
        println!(
            "   {} {} limit {:.2}, debt {:.2}",
            card.card_number, card.holder_name, card.credit_limit, card.current_debt
        );
    }

    println!("\n📄 Loans");
    for loan in view.loans() {
        println!(
            "   {:<12} principal {:.2}, debt {:.2}, expires {}",
            loan.loan_type, loan.amount, loan.debt, loan.expiration
        );
    }

    println!("\n🧾 Recent transactions");
    for entry in view.transactions() {
        println!(
            "   {} {} {:>10.2} {:<14} {}",
            entry.date, entry.time, entry.amount, entry.movement_type, entry.account_number
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total assets:      {:.2}", view.total_assets());
    println!("Total liabilities: {:.2}", view.total_liabilities());
    println!("Net worth:         {:.2}", view.net_worth());

    Ok(())
}
