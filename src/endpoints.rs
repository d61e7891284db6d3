//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g. '/api/expenses/{expense_id}', use [format_endpoint].

/// The root route which redirects to the balance.
pub const ROOT: &str = "/";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for the two partners sharing expenses.
pub const PARTNERS: &str = "/api/partners";
/// The route for the balance between the partners.
pub const BALANCE: &str = "/api/balance";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to access a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to list and create settlements.
pub const SETTLEMENTS: &str = "/api/settlements";
/// The route to access a single settlement.
pub const SETTLEMENT: &str = "/api/settlements/{settlement_id}";
/// The route for spending per month.
pub const MONTHLY_TRENDS: &str = "/api/analytics/monthly";
/// The route for spending per category.
pub const CATEGORY_BREAKDOWN: &str = "/api/analytics/categories";
/// The route for what each partner paid.
pub const PARTNER_TOTALS: &str = "/api/analytics/partners";
/// The route for the balance at the end of each month.
pub const BALANCE_HISTORY: &str = "/api/analytics/balance-history";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, e.g.
/// '{expense_id}' in '/api/expenses/{expense_id}'. Only the first parameter is
/// replaced. An unclosed parameter runs to the end of the path.
///
/// If no parameter is found in `endpoint_path`, the original path is returned.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}
