//! Defines the settlement model, its validation and the database queries for settlements.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::SettlementId,
    date_range::DateRange,
    money::{MAX_AMOUNT, parse_stored_amount},
    partner::{PartnerId, Partners},
};

// ============================================================================
// MODELS
// ============================================================================

/// A direct reimbursement from one partner to the other.
///
/// Settlements are not tied to any particular expense, they pay down
/// whatever the payer owes at the time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// The ID of the settlement.
    pub id: SettlementId,
    /// The amount of money transferred, never negative.
    pub amount: Decimal,
    /// When the money was transferred.
    pub date: Date,
    /// The partner who sent the money.
    pub paid_by: PartnerId,
    /// The partner who received the money.
    pub paid_to: PartnerId,
    /// A text description of the settlement.
    pub description: String,
}

impl Settlement {
    /// Create a new settlement.
    ///
    /// Shortcut for [SettlementBuilder] for discoverability.
    pub fn build(
        amount: Decimal,
        date: Date,
        paid_by: PartnerId,
        paid_to: PartnerId,
    ) -> SettlementBuilder {
        SettlementBuilder {
            amount,
            date,
            paid_by,
            paid_to,
            description: String::new(),
        }
    }
}

/// The fields of a settlement that has not been stored yet.
///
/// This is also the JSON body accepted when creating or updating a settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementBuilder {
    /// The amount of money transferred.
    pub amount: Decimal,
    /// When the money was transferred.
    pub date: Date,
    /// The partner who sent the money.
    pub paid_by: PartnerId,
    /// The partner who received the money.
    pub paid_to: PartnerId,
    /// A text description of the settlement.
    #[serde(default)]
    pub description: String,
}

impl SettlementBuilder {
    /// Set the description for the settlement.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }
}

/// Check a settlement before it is stored.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is less than zero,
/// - [Error::AmountTooLarge] if the amount is more than [MAX_AMOUNT],
/// - [Error::UnknownPartner] if either side is not one of `partners`,
/// - [Error::SelfSettlement] if the payer and payee are the same partner,
/// - or [Error::FutureDate] if the settlement is dated after `today`.
pub fn validate_settlement(
    builder: SettlementBuilder,
    partners: &Partners,
    today: Date,
) -> Result<SettlementBuilder, Error> {
    if builder.amount.is_sign_negative() && !builder.amount.is_zero() {
        return Err(Error::NegativeAmount(builder.amount));
    }

    if builder.amount > MAX_AMOUNT {
        return Err(Error::AmountTooLarge(builder.amount));
    }

    partners.require(&builder.paid_by)?;
    partners.require(&builder.paid_to)?;

    if builder.paid_by == builder.paid_to {
        return Err(Error::SelfSettlement(builder.paid_by));
    }

    if builder.date > today {
        return Err(Error::FutureDate(builder.date));
    }

    Ok(SettlementBuilder {
        description: builder.description.trim().to_owned(),
        ..builder
    })
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the settlement table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_settlement_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS settlement (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                paid_by TEXT NOT NULL,
                paid_to TEXT NOT NULL,
                description TEXT NOT NULL,
                CHECK (paid_by <> paid_to)
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_settlement_date ON settlement(date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Settlement.
pub fn map_settlement_row(row: &Row) -> Result<Settlement, rusqlite::Error> {
    let id = row.get(0)?;
    let amount: String = row.get(1)?;
    let amount = parse_stored_amount(&amount, 1)?;
    let date = row.get(2)?;
    let paid_by = row.get(3)?;
    let paid_to = row.get(4)?;
    let description = row.get(5)?;

    Ok(Settlement {
        id,
        amount,
        date,
        paid_by,
        paid_to,
        description,
    })
}

/// Create a new settlement in the database from a builder.
///
/// The builder should have been checked with [validate_settlement] first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn create_settlement(
    builder: SettlementBuilder,
    connection: &Connection,
) -> Result<Settlement, Error> {
    let settlement = connection
        .prepare(
            "INSERT INTO settlement (amount, date, paid_by, paid_to, description)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, amount, date, paid_by, paid_to, description",
        )?
        .query_row(
            params![
                builder.amount.to_string(),
                builder.date,
                builder.paid_by,
                builder.paid_to,
                builder.description,
            ],
            map_settlement_row,
        )?;

    Ok(settlement)
}

/// Retrieve a settlement from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid settlement,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_settlement(id: SettlementId, connection: &Connection) -> Result<Settlement, Error> {
    let settlement = connection
        .prepare(
            "SELECT id, amount, date, paid_by, paid_to, description FROM settlement WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_settlement_row)?;

    Ok(settlement)
}

/// Get the settlements dated within `range`, oldest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn get_settlements(
    range: &DateRange,
    connection: &Connection,
) -> Result<Vec<Settlement>, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, paid_by, paid_to, description
             FROM settlement
             WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
             ORDER BY date ASC, id ASC",
        )?
        .query_map(params![range.from, range.to], map_settlement_row)?
        .collect::<Result<Vec<Settlement>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Replace the fields of the settlement `id` with those in `builder`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingSettlement] if `id` does not refer to a valid settlement,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_settlement(
    id: SettlementId,
    builder: SettlementBuilder,
    connection: &Connection,
) -> Result<Settlement, Error> {
    connection
        .prepare(
            "UPDATE settlement
            SET \
                amount = ?1, \
                date = ?2, \
                paid_by = ?3, \
                paid_to = ?4, \
                description = ?5 \
            WHERE id = ?6
            RETURNING id, amount, date, paid_by, paid_to, description",
        )?
        .query_row(
            params![
                builder.amount.to_string(),
                builder.date,
                builder.paid_by,
                builder.paid_to,
                builder.description,
                id,
            ],
            map_settlement_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingSettlement,
            error => error.into(),
        })
}

/// Delete the settlement `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingSettlement] if `id` does not refer to a valid settlement,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_settlement(id: SettlementId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM settlement WHERE id = :id", &[(":id", &id)])?;

    match rows_affected {
        0 => Err(Error::DeleteMissingSettlement),
        _ => Ok(()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
