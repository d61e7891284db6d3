//! Defines the expense model, its validation and the database queries for expenses.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::ExpenseId,
    date_range::DateRange,
    money::{MAX_AMOUNT, parse_stored_amount},
    partner::{PartnerId, Partners},
};

/// The category given to expenses that were not assigned one.
pub const UNCATEGORISED_LABEL: &str = "Uncategorised";

// ============================================================================
// MODELS
// ============================================================================

/// Money one partner spent that benefits both partners.
///
/// Every expense is split evenly between the two partners.
///
/// To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The amount of money spent, never negative.
    pub amount: Decimal,
    /// When the money was spent.
    pub date: Date,
    /// The partner who paid.
    pub paid_by: PartnerId,
    /// What the money was spent on, e.g. "Groceries".
    pub category: String,
    /// A text description of the expense.
    pub description: String,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(amount: Decimal, date: Date, paid_by: PartnerId) -> ExpenseBuilder {
        ExpenseBuilder {
            amount,
            date,
            paid_by,
            category: String::new(),
            description: String::new(),
        }
    }
}

/// The fields of an expense that has not been stored yet.
///
/// This is also the JSON body accepted when creating or updating an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBuilder {
    /// The amount of money spent.
    pub amount: Decimal,
    /// When the money was spent.
    pub date: Date,
    /// The partner who paid.
    pub paid_by: PartnerId,
    /// What the money was spent on.
    ///
    /// A blank category is stored as [UNCATEGORISED_LABEL].
    #[serde(default)]
    pub category: String,
    /// A text description of the expense.
    #[serde(default)]
    pub description: String,
}

impl ExpenseBuilder {
    /// Set the category for the expense.
    pub fn category(mut self, category: &str) -> Self {
        category.clone_into(&mut self.category);
        self
    }

    /// Set the description for the expense.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }
}

/// Check an expense before it is stored and normalise its text fields.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is less than zero,
/// - [Error::AmountTooLarge] if the amount is more than [MAX_AMOUNT],
/// - [Error::UnknownPartner] if the payer is not one of `partners`,
/// - or [Error::FutureDate] if the expense is dated after `today`.
pub fn validate_expense(
    builder: ExpenseBuilder,
    partners: &Partners,
    today: Date,
) -> Result<ExpenseBuilder, Error> {
    if builder.amount.is_sign_negative() && !builder.amount.is_zero() {
        return Err(Error::NegativeAmount(builder.amount));
    }

    if builder.amount > MAX_AMOUNT {
        return Err(Error::AmountTooLarge(builder.amount));
    }

    partners.require(&builder.paid_by)?;

    if builder.date > today {
        return Err(Error::FutureDate(builder.date));
    }

    let category = match builder.category.trim() {
        "" => UNCATEGORISED_LABEL.to_owned(),
        category => category.to_owned(),
    };
    let description = builder.description.trim().to_owned();

    Ok(ExpenseBuilder {
        category,
        description,
        ..builder
    })
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table in the database.
///
/// Amounts are stored as decimal text so that no precision is lost.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                paid_by TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let amount: String = row.get(1)?;
    let amount = parse_stored_amount(&amount, 1)?;
    let date = row.get(2)?;
    let paid_by = row.get(3)?;
    let category = row.get(4)?;
    let description = row.get(5)?;

    Ok(Expense {
        id,
        amount,
        date,
        paid_by,
        category,
        description,
    })
}

/// Create a new expense in the database from a builder.
///
/// The builder should have been checked with [validate_expense] first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn create_expense(builder: ExpenseBuilder, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "INSERT INTO expense (amount, date, paid_by, category, description)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, amount, date, paid_by, category, description",
        )?
        .query_row(
            params![
                builder.amount.to_string(),
                builder.date,
                builder.paid_by,
                builder.category,
                builder.description,
            ],
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, amount, date, paid_by, category, description FROM expense WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_expense_row)?;

    Ok(expense)
}

/// Get the expenses dated within `range`, oldest first.
///
/// Expenses on the same day are returned in the order they were created.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn get_expenses(range: &DateRange, connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, paid_by, category, description
             FROM expense
             WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
             ORDER BY date ASC, id ASC",
        )?
        .query_map(params![range.from, range.to], map_expense_row)?
        .collect::<Result<Vec<Expense>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Replace the fields of the expense `id` with those in `builder`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingExpense] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    builder: ExpenseBuilder,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(
            "UPDATE expense
            SET \
                amount = ?1, \
                date = ?2, \
                paid_by = ?3, \
                category = ?4, \
                description = ?5 \
            WHERE id = ?6
            RETURNING id, amount, date, paid_by, category, description",
        )?
        .query_row(
            params![
                builder.amount.to_string(),
                builder.date,
                builder.paid_by,
                builder.category,
                builder.description,
                id,
            ],
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingExpense,
            error => error.into(),
        })
}

/// Delete the expense `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingExpense] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM expense WHERE id = :id", &[(":id", &id)])?;

    match rows_affected {
        0 => Err(Error::DeleteMissingExpense),
        _ => Ok(()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
