//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::Date;

use crate::{money::MAX_AMOUNT, partner::PartnerId};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A partner ID was empty, too long, used unsupported characters or was
    /// the reserved word "none".
    #[error("\"{0}\" is not a valid partner ID")]
    InvalidPartnerId(String),

    /// Both partners were configured with the same ID.
    #[error("both partners have the ID \"{0}\", partner IDs must be unique")]
    DuplicatePartner(PartnerId),

    /// An expense or settlement referred to someone who is not one of the two
    /// partners.
    #[error("\"{0}\" is not one of the partners")]
    UnknownPartner(PartnerId),

    /// An expense or settlement was given a negative amount.
    ///
    /// Refunds should be recorded by editing or deleting the original expense.
    #[error("amounts cannot be negative, got {0}")]
    NegativeAmount(rust_decimal::Decimal),

    /// An expense or settlement was given an amount above [MAX_AMOUNT].
    #[error("amounts cannot be more than {max}, got {0}", max = MAX_AMOUNT)]
    AmountTooLarge(rust_decimal::Decimal),

    /// A settlement was paid by a partner to themselves.
    #[error("{0} cannot settle up with themselves")]
    SelfSettlement(PartnerId),

    /// A date in the future was used to create an expense or settlement.
    ///
    /// Expenses and settlements record events that have already happened,
    /// therefore future dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The start of a date range was after its end.
    #[error("the date range {0} to {1} is invalid, the start must not be after the end")]
    InvalidDateRange(Date, Date),

    /// A stored amount could not be read back as a decimal number.
    #[error("a stored amount is not a valid decimal number: {0}")]
    InvalidAmount(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update an expense that does not exist
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to update a settlement that does not exist
    #[error("tried to update a settlement that is not in the database")]
    UpdateMissingSettlement,

    /// Tried to delete a settlement that does not exist
    #[error("tried to delete a settlement that is not in the database")]
    DeleteMissingSettlement,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::FromSqlConversionFailure(_, rusqlite::types::Type::Text, ref error)
                if error.is::<rust_decimal::Error>() =>
            {
                Error::InvalidAmount(error.to_string())
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidPartnerId(_)
            | Error::InvalidDateRange(_, _)
            | Error::InvalidTimezoneError(_) => StatusCode::BAD_REQUEST,
            Error::DuplicatePartner(_)
            | Error::UnknownPartner(_)
            | Error::NegativeAmount(_)
            | Error::AmountTooLarge(_)
            | Error::SelfSettlement(_)
            | Error::FutureDate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound
            | Error::UpdateMissingExpense
            | Error::DeleteMissingExpense
            | Error::UpdateMissingSettlement
            | Error::DeleteMissingSettlement => StatusCode::NOT_FOUND,
            Error::InvalidAmount(_) | Error::SqlError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            // Any errors that are not the client's fault are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
