//! Route handlers for reading and changing expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::ExpenseId,
    date_range::DateRange,
    expense::{
        Expense, ExpenseBuilder, create_expense, delete_expense, get_expense, get_expenses,
        update_expense, validate_expense,
    },
    partner::Partners,
    timezone::today_in,
};

/// The state needed for the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The two partners that may pay for expenses.
    pub partners: Partners,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            partners: state.partners.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for listing expenses, optionally limited to a date range.
pub async fn list_expenses_endpoint(
    State(state): State<ExpenseState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<Expense>>, Error> {
    let range = range.validate()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_expenses(&range, &connection)
        .inspect_err(|error| tracing::error!("could not get expenses: {error}"))
        .map(Json)
}

/// A route handler for recording a new expense, responds with the stored expense.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Json(builder): Json<ExpenseBuilder>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let today = today_in(&state.local_timezone)?;
    let builder = validate_expense(builder, &state.partners, today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = create_expense(builder, &connection)
        .inspect_err(|error| tracing::error!("could not create expense: {error}"))?;
    tracing::info!("recorded expense {} paid by {}", expense.id, expense.paid_by);

    Ok((StatusCode::CREATED, Json(expense)))
}

/// A route handler for getting a single expense.
pub async fn get_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_expense(expense_id, &connection).map(Json)
}

/// A route handler for replacing the fields of an existing expense.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
    Json(builder): Json<ExpenseBuilder>,
) -> Result<Json<Expense>, Error> {
    let today = today_in(&state.local_timezone)?;
    let builder = validate_expense(builder, &state.partners, today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_expense(expense_id, builder, &connection)
        .inspect_err(|error| tracing::error!("could not update expense {expense_id}: {error}"))
        .map(Json)
}

/// A route handler for deleting an expense.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_expense(expense_id, &connection)
        .inspect_err(|error| tracing::error!("could not delete expense {expense_id}: {error}"))?;

    Ok(StatusCode::NO_CONTENT)
}
