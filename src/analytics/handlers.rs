//! Analytics HTTP handlers.
//!
//! Each handler reads a snapshot of the records in the requested date range,
//! releases the database lock and then aggregates the snapshot.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    analytics::aggregation::{
        BalancePoint, CategoryTotal, MonthlyTrend, PartnerTotals, balance_history,
        category_breakdown, monthly_trends, partner_totals,
    },
    date_range::DateRange,
    expense::{Expense, get_expenses},
    partner::Partners,
    settlement::{Settlement, get_settlements},
};

/// The state needed for the analytics endpoints.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The database connection for reading expenses and settlements.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The two partners sharing expenses.
    pub partners: Partners,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            partners: state.partners.clone(),
        }
    }
}

/// The records in a date range.
struct Snapshot {
    expenses: Vec<Expense>,
    settlements: Vec<Settlement>,
}

fn load_snapshot(
    state: &AnalyticsState,
    range: DateRange,
    include_settlements: bool,
) -> Result<Snapshot, Error> {
    let range = range.validate()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = get_expenses(&range, &connection)
        .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;

    let settlements = if include_settlements {
        get_settlements(&range, &connection)
            .inspect_err(|error| tracing::error!("could not get settlements: {error}"))?
    } else {
        Vec::new()
    };

    Ok(Snapshot {
        expenses,
        settlements,
    })
}

/// Total spending per month in the date range.
pub async fn get_monthly_trends_endpoint(
    State(state): State<AnalyticsState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<MonthlyTrend>>, Error> {
    let snapshot = load_snapshot(&state, range, false)?;

    Ok(Json(monthly_trends(&state.partners, &snapshot.expenses)))
}

/// Total spending per category in the date range.
pub async fn get_category_breakdown_endpoint(
    State(state): State<AnalyticsState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    let snapshot = load_snapshot(&state, range, false)?;

    Ok(Json(category_breakdown(&snapshot.expenses)))
}

/// What each partner paid in the date range.
pub async fn get_partner_totals_endpoint(
    State(state): State<AnalyticsState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<PartnerTotals>>, Error> {
    let snapshot = load_snapshot(&state, range, true)?;

    Ok(Json(partner_totals(
        &state.partners,
        &snapshot.expenses,
        &snapshot.settlements,
    )))
}

/// The reconciled balance at the end of each month in the date range.
///
/// Records before the start of the range are not counted, so the history
/// starts from a zero balance.
pub async fn get_balance_history_endpoint(
    State(state): State<AnalyticsState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<BalancePoint>>, Error> {
    let snapshot = load_snapshot(&state, range, true)?;

    Ok(Json(balance_history(
        &state.partners,
        &snapshot.expenses,
        &snapshot.settlements,
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        db::initialize,
        endpoints,
        expense::{Expense, create_expense},
        partner::test_partners::{alice, alice_and_bob, bob},
        settlement::{Settlement, create_settlement},
    };

    use super::{
        AnalyticsState, get_balance_history_endpoint, get_category_breakdown_endpoint,
        get_monthly_trends_endpoint, get_partner_totals_endpoint,
    };

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        create_expense(
            Expense::build(dec!(100), date!(2025 - 01 - 03), alice()).category("Groceries"),
            &connection,
        )
        .unwrap();
        create_expense(
            Expense::build(dec!(60), date!(2025 - 01 - 10), bob()).category("Dining"),
            &connection,
        )
        .unwrap();
        create_expense(
            Expense::build(dec!(80), date!(2025 - 02 - 01), alice()).category("Groceries"),
            &connection,
        )
        .unwrap();
        create_settlement(
            Settlement::build(dec!(60), date!(2025 - 02 - 15), bob(), alice()),
            &connection,
        )
        .unwrap();

        let app = Router::new()
            .route(endpoints::MONTHLY_TRENDS, get(get_monthly_trends_endpoint))
            .route(
                endpoints::CATEGORY_BREAKDOWN,
                get(get_category_breakdown_endpoint),
            )
            .route(endpoints::PARTNER_TOTALS, get(get_partner_totals_endpoint))
            .route(endpoints::BALANCE_HISTORY, get(get_balance_history_endpoint))
            .with_state(AnalyticsState {
                db_connection: Arc::new(Mutex::new(connection)),
                partners: alice_and_bob(),
            });

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn monthly_trends_lists_each_month() {
        let server = get_test_server();

        let body: Value = server.get(endpoints::MONTHLY_TRENDS).await.json();

        assert_eq!(body[0]["month"], "2025-01");
        assert_eq!(body[0]["label"], "Jan 2025");
        assert_eq!(body[0]["total"], json!(160.0));
        assert_eq!(body[0]["paid_by"]["bob"], json!(60.0));
        assert_eq!(body[1]["month"], "2025-02");
        assert_eq!(body[1]["total"], json!(80.0));
    }

    #[tokio::test]
    async fn category_breakdown_respects_date_range() {
        let server = get_test_server();

        let body: Value = server
            .get(endpoints::CATEGORY_BREAKDOWN)
            .add_query_param("to", "2025-01-31")
            .await
            .json();

        assert_eq!(
            body,
            json!([
                {"category": "Groceries", "total": 100.0, "expense_count": 1, "percentage": 62.5},
                {"category": "Dining", "total": 60.0, "expense_count": 1, "percentage": 37.5},
            ])
        );
    }

    #[tokio::test]
    async fn partner_totals_include_settlements() {
        let server = get_test_server();

        let body: Value = server.get(endpoints::PARTNER_TOTALS).await.json();

        assert_eq!(body[0]["partner"], "alice");
        assert_eq!(body[0]["expenses_paid"], json!(180.0));
        assert_eq!(body[0]["settlements_received"], json!(60.0));
        assert_eq!(body[1]["partner"], "bob");
        assert_eq!(body[1]["settlements_paid"], json!(60.0));
    }

    #[tokio::test]
    async fn balance_history_ends_settled() {
        let server = get_test_server();

        let body: Value = server.get(endpoints::BALANCE_HISTORY).await.json();

        assert_eq!(body[0]["who_owes_whom"], "bob");
        assert_eq!(body[0]["owed_to"], "alice");
        assert_eq!(body[0]["net_balance"], json!(20.0));
        assert_eq!(body[1]["who_owes_whom"], "none");
        assert_eq!(body[1]["owed_to"], Value::Null);
    }

    #[tokio::test]
    async fn reversed_range_is_bad_request() {
        let server = get_test_server();

        server
            .get(endpoints::MONTHLY_TRENDS)
            .add_query_param("from", "2025-02-01")
            .add_query_param("to", "2025-01-01")
            .expect_failure()
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
