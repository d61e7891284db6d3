//! Halfsies works out who owes whom when two partners share expenses.
//!
//! Every expense is split evenly between the two partners. Settlements, direct
//! payments from one partner to the other, are netted off to give the balance
//! still owing.
//!
//! This library provides a JSON REST API over a SQLite database of expenses and
//! settlements, plus the pure balance and analytics functions behind it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod analytics;
mod app_state;
mod balance;
mod config;
mod database_id;
mod date_range;
mod db;
pub mod endpoints;
mod error;
mod expense;
mod logging;
mod money;
mod partner;
mod routing;
mod settlement;
mod timezone;

pub use analytics::{
    BalancePoint, CategoryTotal, MonthKey, MonthlyTrend, PartnerTotals, balance_history,
    category_breakdown, monthly_trends, partner_totals,
};
pub use app_state::AppState;
pub use balance::{
    BalanceLedger, BalanceMode, BalanceSummary, WhoOwesWhom, calculate_balance, reconcile,
};
pub use config::PartnerArgs;
pub use database_id::{DatabaseId, ExpenseId, SettlementId};
pub use date_range::DateRange;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{
    Expense, ExpenseBuilder, UNCATEGORISED_LABEL, create_expense, get_expenses, validate_expense,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::{MAX_AMOUNT, format_currency, round_currency};
pub use partner::{Partner, PartnerId, Partners};
pub use routing::build_router;
pub use settlement::{
    Settlement, SettlementBuilder, create_settlement, get_settlements, validate_settlement,
};
pub use timezone::{get_local_offset, today_in};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
