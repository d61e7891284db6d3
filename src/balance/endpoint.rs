use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    balance::{BalanceMode, BalanceSummary, calculate_balance, reconcile},
    date_range::DateRange,
    expense::get_expenses,
    partner::Partners,
    settlement::get_settlements,
};

/// The state needed to calculate the balance.
#[derive(Debug, Clone)]
pub struct BalanceState {
    /// The database connection for reading expenses and settlements.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The two partners sharing expenses.
    pub partners: Partners,
}

impl FromRef<AppState> for BalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            partners: state.partners.clone(),
        }
    }
}

/// The `mode` query parameter, defaulting to [BalanceMode::Full].
#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    #[serde(default)]
    mode: BalanceMode,
}

/// A route handler for the balance between the two partners.
///
/// Settlements are included unless `mode=expenses` is given. The optional
/// `from` and `to` dates limit which records are counted.
pub async fn get_balance_endpoint(
    State(state): State<BalanceState>,
    Query(query): Query<BalanceQuery>,
    Query(range): Query<DateRange>,
) -> Result<Json<BalanceSummary>, Error> {
    let range = range.validate()?;

    let (expenses, settlements) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let expenses = get_expenses(&range, &connection)
            .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;

        let settlements = match query.mode {
            BalanceMode::ExpensesOnly => Vec::new(),
            BalanceMode::Full => get_settlements(&range, &connection)
                .inspect_err(|error| tracing::error!("could not get settlements: {error}"))?,
        };

        (expenses, settlements)
    };

    let summary = match query.mode {
        BalanceMode::ExpensesOnly => calculate_balance(&state.partners, &expenses),
        BalanceMode::Full => reconcile(&state.partners, &expenses, &settlements),
    };

    Ok(Json(summary))
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

    use super::{BalanceState, get_balance_endpoint};

    fn get_test_server() -> (TestServer, Arc<Mutex<Connection>>) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let app = Router::new()
            .route(endpoints::BALANCE, get(get_balance_endpoint))
            .with_state(BalanceState {
                db_connection: connection.clone(),
                partners: alice_and_bob(),
            });

        (
            TestServer::try_new(app).expect("Could not create test server."),
            connection,
        )
    }

    fn insert_scenario(connection: &Mutex<Connection>) {
        let connection = connection.lock().unwrap();
        for (amount, paid_by, date) in [
            (dec!(100), alice(), date!(2025 - 01 - 03)),
            (dec!(60), bob(), date!(2025 - 01 - 10)),
            (dec!(80), alice(), date!(2025 - 02 - 01)),
        ] {
            create_expense(Expense::build(amount, date, paid_by), &connection).unwrap();
        }
        create_settlement(
            Settlement::build(dec!(60), date!(2025 - 02 - 15), bob(), alice()),
            &connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn empty_database_owes_nothing() {
        let (server, _) = get_test_server();

        let response = server.get(endpoints::BALANCE).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["combined_total"], json!(0.0));
        assert_eq!(body["who_owes_whom"], "none");
    }

    #[tokio::test]
    async fn full_mode_includes_settlements() {
        let (server, connection) = get_test_server();
        insert_scenario(&connection);

        let body: Value = server.get(endpoints::BALANCE).await.json();

        assert_eq!(body["mode"], "full");
        assert_eq!(body["combined_total"], json!(240.0));
        assert_eq!(body["net_balance"], json!(0.0));
        assert_eq!(body["who_owes_whom"], "none");
    }

    #[tokio::test]
    async fn expense_mode_ignores_settlements() {
        let (server, connection) = get_test_server();
        insert_scenario(&connection);

        let body: Value = server
            .get(endpoints::BALANCE)
            .add_query_param("mode", "expenses")
            .await
            .json();

        assert_eq!(body["mode"], "expenses");
        assert_eq!(body["fair_share"], json!(120.0));
        assert_eq!(body["balance"]["alice"], json!(60.0));
        assert_eq!(body["balance"]["bob"], json!(-60.0));
        assert_eq!(body["net_balance"], json!(60.0));
        assert_eq!(body["who_owes_whom"], "bob");
        assert_eq!(body["owed_to"], "alice");
    }

    #[tokio::test]
    async fn date_range_limits_records() {
        let (server, connection) = get_test_server();
        insert_scenario(&connection);

        let body: Value = server
            .get(endpoints::BALANCE)
            .add_query_param("from", "2025-01-01")
            .add_query_param("to", "2025-01-31")
            .await
            .json();

        assert_eq!(body["combined_total"], json!(160.0));
        assert_eq!(body["who_owes_whom"], "bob");
        assert_eq!(body["net_balance"], json!(20.0));
    }

    #[tokio::test]
    async fn reversed_range_is_bad_request() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::BALANCE)
            .add_query_param("from", "2025-02-01")
            .add_query_param("to", "2025-01-01")
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
