use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use halfsies::{
    Expense, PartnerArgs, Settlement, UNCATEGORISED_LABEL, create_expense, create_settlement,
    initialize_db,
};

/// A utility for creating a test database for the REST API server of halfsies.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    #[command(flatten)]
    partners: PartnerArgs,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let partners = args.partners.into_partners()?;
    let first = partners.first().id.clone();
    let second = partners.second().id.clone();

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test expenses...");

    let today = OffsetDateTime::now_utc().date();
    let days_ago = |days: i64| -> Date { today - Duration::days(days) };

    let expenses = [
        (Decimal::new(8_450, 2), 75, &first, "Groceries", "Weekly shop"),
        (Decimal::new(3_200, 2), 70, &second, "Dining", "Takeaways"),
        (Decimal::new(180_000, 2), 60, &first, "Rent", ""),
        (Decimal::new(9_915, 2), 45, &second, "Groceries", "Weekly shop"),
        (Decimal::new(12_999, 2), 40, &first, "Utilities", "Power bill"),
        (Decimal::new(4_550, 2), 20, &second, UNCATEGORISED_LABEL, "Cinema tickets"),
        (Decimal::new(180_000, 2), 15, &second, "Rent", ""),
        (Decimal::new(6_705, 2), 3, &first, "Groceries", "Weekly shop"),
    ];

    for (amount, days, paid_by, category, description) in expenses {
        create_expense(
            Expense::build(amount, days_ago(days), paid_by.clone())
                .category(category)
                .description(description),
            &conn,
        )?;
    }

    println!("Creating test settlements...");

    create_settlement(
        Settlement::build(Decimal::new(50_000, 2), days_ago(50), second.clone(), first.clone())
            .description("Rent top up"),
        &conn,
    )?;
    create_settlement(
        Settlement::build(Decimal::new(2_000, 2), days_ago(5), first, second),
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
