//! Savings goals and the money added to them.

mod core;
mod endpoints;

pub use core::{
    NewSavingsGoal, SavingsGoal, add_to_savings_goal, archive_savings_goal,
    create_savings_goal, create_savings_goal_table, delete_savings_goal, get_savings_goal,
    get_savings_goals, insert_savings_goal,
};
pub use endpoints::{
    AddToGoalForm, SavingsGoalForm, SavingsGoalQuery, SavingsGoalState, SavingsGoalView,
    add_to_savings_goal_endpoint, archive_savings_goal_endpoint, create_savings_goal_endpoint,
    delete_savings_goal_endpoint, get_savings_goals_endpoint,
};
