use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::Date;

use halfsies::{
    BalanceMode, BalanceSummary, DateRange, PartnerArgs, PartnerId, Partners, WhoOwesWhom,
    calculate_balance, format_currency, get_expenses, get_settlements, reconcile,
};

/// Print who owes whom from a halfsies database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    #[command(flatten)]
    partners: PartnerArgs,

    /// Ignore settlements and only count expenses.
    #[arg(long)]
    expenses_only: bool,

    /// Only count records on or after this date, e.g. 2025-01-01.
    #[arg(long, value_parser = parse_date)]
    from: Option<Date>,

    /// Only count records on or before this date, e.g. 2025-12-31.
    #[arg(long, value_parser = parse_date)]
    to: Option<Date>,
}

fn parse_date(text: &str) -> Result<Date, String> {
    let format = time::macros::format_description!("[year]-[month]-[day]");

    Date::parse(text, &format).map_err(|error| format!("expected a date like 2025-01-31: {error}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        eprintln!("No database found at {db_path:#?}");
        exit(1);
    }

    let partners = args.partners.into_partners()?;
    let range = DateRange::new(args.from, args.to)?;

    let conn = Connection::open(db_path)?;
    let expenses = get_expenses(&range, &conn)?;

    let summary = if args.expenses_only {
        calculate_balance(&partners, &expenses)
    } else {
        let settlements = get_settlements(&range, &conn)?;
        reconcile(&partners, &expenses, &settlements)
    };

    print_summary(&partners, &summary.rounded());

    Ok(())
}

fn print_summary(partners: &Partners, summary: &BalanceSummary) {
    let mode = match summary.mode {
        BalanceMode::ExpensesOnly => "expenses only",
        BalanceMode::Full => "expenses and settlements",
    };

    println!("Balance ({mode})");
    println!("  Total spent: {}", format_currency(summary.combined_total));
    println!("  Fair share:  {}", format_currency(summary.fair_share));
    println!();

    for partner in partners.iter() {
        println!("{}", partner.name);
        println!("  Paid:    {}", format_currency(summary.paid(&partner.id)));
        println!("  Balance: {}", format_currency(summary.balance_of(&partner.id)));
    }

    println!();

    match &summary.who_owes_whom {
        WhoOwesWhom::Nobody => println!("All square, nobody owes anything."),
        WhoOwesWhom::Owes { debtor, creditor } => println!(
            "{} owes {} {}",
            name_of(partners, debtor),
            name_of(partners, creditor),
            format_currency(summary.net_balance)
        ),
    }
}

fn name_of<'a>(partners: &'a Partners, id: &'a PartnerId) -> &'a str {
    partners
        .get(id)
        .map_or(id.as_str(), |partner| partner.name.as_str())
}
