//! Analytics module
//!
//! Summaries of shared spending over time, by category and by partner, plus
//! the history of the balance between the partners.

mod aggregation;
mod handlers;

pub use aggregation::{
    BalancePoint, CategoryTotal, MonthKey, MonthlyTrend, PartnerTotals, balance_history,
    category_breakdown, monthly_trends, partner_totals,
};
pub use handlers::{
    AnalyticsState, get_balance_history_endpoint, get_category_breakdown_endpoint,
    get_monthly_trends_endpoint, get_partner_totals_endpoint,
};
