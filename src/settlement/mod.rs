//! Settlements: direct reimbursements between the two partners.

mod core;
mod endpoints;

pub use core::{
    Settlement, SettlementBuilder, create_settlement, create_settlement_table, delete_settlement,
    get_settlement, get_settlements, map_settlement_row, update_settlement, validate_settlement,
};
pub use endpoints::{
    SettlementState, create_settlement_endpoint, delete_settlement_endpoint,
    get_settlement_endpoint, list_settlements_endpoint, update_settlement_endpoint,
};
