//! One-off savings.

mod core;
mod endpoints;

pub use core::{
    NewSaving, Saving, create_saving, create_saving_table, delete_saving, get_savings, sum_savings,
};
pub use endpoints::{
    SavingForm, SavingState, create_saving_endpoint, delete_saving_endpoint, get_savings_endpoint,
};
