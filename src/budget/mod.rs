//! Per-category monthly budgets.

mod core;
mod endpoints;

pub use core::{
    Budget, create_budget_table, get_budgets, parse_budget_map, replace_budgets, upsert_budget,
};
pub use endpoints::{BudgetState, get_budgets_endpoint, replace_budgets_endpoint};
