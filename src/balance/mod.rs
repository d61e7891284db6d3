//! The balance between the two partners: who owes whom and by how much.

mod calculator;
mod endpoint;

pub use calculator::{
    BalanceLedger, BalanceMode, BalanceSummary, WhoOwesWhom, calculate_balance, reconcile,
};
pub use endpoint::get_balance_endpoint;
