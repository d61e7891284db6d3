//! Application router configuration.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use crate::{
    AppState, Error,
    analytics::{
        get_balance_history_endpoint, get_category_breakdown_endpoint,
        get_monthly_trends_endpoint, get_partner_totals_endpoint,
    },
    balance::get_balance_endpoint,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
        list_expenses_endpoint, update_expense_endpoint,
    },
    partner::{Partner, Partners},
    settlement::{
        create_settlement_endpoint, delete_settlement_endpoint, get_settlement_endpoint,
        list_settlements_endpoint, update_settlement_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::PARTNERS, get(get_partners_endpoint))
        .route(endpoints::BALANCE, get(get_balance_endpoint))
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(
            endpoints::SETTLEMENTS,
            get(list_settlements_endpoint).post(create_settlement_endpoint),
        )
        .route(
            endpoints::SETTLEMENT,
            get(get_settlement_endpoint)
                .put(update_settlement_endpoint)
                .delete(delete_settlement_endpoint),
        )
        .route(endpoints::MONTHLY_TRENDS, get(get_monthly_trends_endpoint))
        .route(
            endpoints::CATEGORY_BREAKDOWN,
            get(get_category_breakdown_endpoint),
        )
        .route(endpoints::PARTNER_TOTALS, get(get_partner_totals_endpoint))
        .route(endpoints::BALANCE_HISTORY, get(get_balance_history_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

/// The root path '/' redirects to the balance.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::BALANCE)
}

/// The two partners sharing expenses, partner A first.
async fn get_partners_endpoint(State(partners): State<Partners>) -> Json<Vec<Partner>> {
    Json(partners.iter().cloned().collect())
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
