//! Expenses: money spent in a category on a given day.

mod core;
mod endpoints;

pub use core::{
    CategorySpending, Expense, NewExpense, create_expense, create_expense_table, delete_expense,
    get_expense_months, get_expenses, sum_expenses_by_category, sum_expenses_by_category_between,
    sum_expenses_by_month,
};
pub use endpoints::{
    ExpenseForm, ExpenseQuery, ExpenseState, create_expense_endpoint, delete_expense_endpoint,
    get_expenses_endpoint,
};
