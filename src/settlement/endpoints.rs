//! Route handlers for reading and changing settlements.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::SettlementId,
    date_range::DateRange,
    partner::Partners,
    settlement::{
        Settlement, SettlementBuilder, create_settlement, delete_settlement, get_settlement,
        get_settlements, update_settlement, validate_settlement,
    },
    timezone::today_in,
};

/// The state needed for the settlement endpoints.
#[derive(Debug, Clone)]
pub struct SettlementState {
    /// The database connection for managing settlements.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The two partners that may settle up with each other.
    pub partners: Partners,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for SettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            partners: state.partners.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for listing settlements, optionally limited to a date range.
pub async fn list_settlements_endpoint(
    State(state): State<SettlementState>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<Settlement>>, Error> {
    let range = range.validate()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_settlements(&range, &connection)
        .inspect_err(|error| tracing::error!("could not get settlements: {error}"))
        .map(Json)
}

/// A route handler for recording a settlement, responds with the stored settlement.
pub async fn create_settlement_endpoint(
    State(state): State<SettlementState>,
    Json(builder): Json<SettlementBuilder>,
) -> Result<(StatusCode, Json<Settlement>), Error> {
    let today = today_in(&state.local_timezone)?;
    let builder = validate_settlement(builder, &state.partners, today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let settlement = create_settlement(builder, &connection)
        .inspect_err(|error| tracing::error!("could not create settlement: {error}"))?;
    tracing::info!(
        "recorded settlement {} from {} to {}",
        settlement.id,
        settlement.paid_by,
        settlement.paid_to
    );

    Ok((StatusCode::CREATED, Json(settlement)))
}

/// A route handler for getting a single settlement.
pub async fn get_settlement_endpoint(
    State(state): State<SettlementState>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<Json<Settlement>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_settlement(settlement_id, &connection).map(Json)
}

/// A route handler for replacing the fields of an existing settlement.
pub async fn update_settlement_endpoint(
    State(state): State<SettlementState>,
    Path(settlement_id): Path<SettlementId>,
    Json(builder): Json<SettlementBuilder>,
) -> Result<Json<Settlement>, Error> {
    let today = today_in(&state.local_timezone)?;
    let builder = validate_settlement(builder, &state.partners, today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_settlement(settlement_id, builder, &connection)
        .inspect_err(|error| {
            tracing::error!("could not update settlement {settlement_id}: {error}")
        })
        .map(Json)
}

/// A route handler for deleting a settlement.
pub async fn delete_settlement_endpoint(
    State(state): State<SettlementState>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_settlement(settlement_id, &connection).inspect_err(|error| {
        tracing::error!("could not delete settlement {settlement_id}: {error}")
    })?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        http::StatusCode,
        routing::{get, put},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use crate::{
        db::initialize,
        endpoints::{self, format_endpoint},
        partner::test_partners::alice_and_bob,
        settlement::Settlement,
    };

    use super::{
        SettlementState, create_settlement_endpoint, delete_settlement_endpoint,
        get_settlement_endpoint, list_settlements_endpoint, update_settlement_endpoint,
    };

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let app = Router::new()
            .route(
                endpoints::SETTLEMENTS,
                get(list_settlements_endpoint).post(create_settlement_endpoint),
            )
            .route(
                endpoints::SETTLEMENT,
                put(update_settlement_endpoint)
                    .get(get_settlement_endpoint)
                    .delete(delete_settlement_endpoint),
            )
            .with_state(SettlementState {
                db_connection: Arc::new(Mutex::new(connection)),
                partners: alice_and_bob(),
                local_timezone: "Etc/UTC".to_owned(),
            });

        TestServer::try_new(app).expect("Could not create test server.")
    }

    async fn create_test_settlement(server: &TestServer) -> Settlement {
        let response = server
            .post(endpoints::SETTLEMENTS)
            .json(&json!({
                "amount": 60,
                "date": "2025-02-15",
                "paid_by": "bob",
                "paid_to": "alice",
                "description": "Evening up"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn create_settlement_stores_settlement() {
        let server = get_test_server();

        let settlement = create_test_settlement(&server).await;

        assert_eq!(settlement.amount, dec!(60));
        let fetched: Settlement = server
            .get(&format_endpoint(endpoints::SETTLEMENT, settlement.id))
            .await
            .json();
        assert_eq!(fetched, settlement);
    }

    #[tokio::test]
    async fn create_settlement_accepts_numeric_string_amount() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SETTLEMENTS)
            .json(&json!({
                "amount": "12.50",
                "date": "2025-02-15",
                "paid_by": "bob",
                "paid_to": "alice"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let settlement: Settlement = response.json();
        assert_eq!(settlement.amount, dec!(12.50));
    }

    #[tokio::test]
    async fn create_settlement_rejects_amount_that_is_not_a_number() {
        let server = get_test_server();

        for amount in [json!("twelve"), json!(null), json!(true)] {
            let response = server
                .post(endpoints::SETTLEMENTS)
                .json(&json!({
                    "amount": amount,
                    "date": "2025-02-15",
                    "paid_by": "bob",
                    "paid_to": "alice"
                }))
                .expect_failure()
                .await;

            response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        }

        let settlements: Vec<Settlement> = server.get(endpoints::SETTLEMENTS).await.json();
        assert!(settlements.is_empty());
    }

    #[tokio::test]
    async fn create_settlement_rejects_amount_over_limit() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SETTLEMENTS)
            .json(&json!({
                "amount": 1_000_000_001,
                "date": "2025-02-15",
                "paid_by": "bob",
                "paid_to": "alice"
            }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(
            body["error"],
            "amounts cannot be more than 1000000000, got 1000000001"
        );
    }

    #[tokio::test]
    async fn create_settlement_rejects_self_settlement() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SETTLEMENTS)
            .json(&json!({
                "amount": 60,
                "date": "2025-02-15",
                "paid_by": "bob",
                "paid_to": "bob"
            }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"], "bob cannot settle up with themselves");
    }

    #[tokio::test]
    async fn create_settlement_rejects_unknown_payee() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SETTLEMENTS)
            .json(&json!({
                "amount": 60,
                "date": "2025-02-15",
                "paid_by": "bob",
                "paid_to": "carol"
            }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn list_settlements_returns_all() {
        let server = get_test_server();
        create_test_settlement(&server).await;
        create_test_settlement(&server).await;

        let settlements: Vec<Settlement> = server.get(endpoints::SETTLEMENTS).await.json();

        assert_eq!(settlements.len(), 2);
    }

    #[tokio::test]
    async fn update_settlement_replaces_fields() {
        let server = get_test_server();
        let settlement = create_test_settlement(&server).await;

        let updated: Settlement = server
            .put(&format_endpoint(endpoints::SETTLEMENT, settlement.id))
            .json(&json!({
                "amount": 25.5,
                "date": "2025-02-16",
                "paid_by": "alice",
                "paid_to": "bob"
            }))
            .await
            .json();

        assert_eq!(updated.id, settlement.id);
        assert_eq!(updated.amount, dec!(25.5));
        assert_eq!(updated.paid_by.as_str(), "alice");
        assert_eq!(updated.description, "");
    }

    #[tokio::test]
    async fn delete_missing_settlement_is_not_found() {
        let server = get_test_server();

        let response = server
            .delete(&format_endpoint(endpoints::SETTLEMENT, 7))
            .expect_failure()
            .await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(
            body["error"],
            "tried to delete a settlement that is not in the database"
        );
    }
}
