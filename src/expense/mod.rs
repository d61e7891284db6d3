//! Expenses: money one partner spent on something both partners share.

mod core;
mod endpoints;

pub use core::{
    Expense, ExpenseBuilder, UNCATEGORISED_LABEL, create_expense, create_expense_table,
    delete_expense, get_expense, get_expenses, map_expense_row, update_expense, validate_expense,
};
pub use endpoints::{
    ExpenseState, create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
    list_expenses_endpoint, update_expense_endpoint,
};
