mod budget;
pub(crate) mod calendar;
mod expense;
mod period;
mod user;

pub(crate) use budget::{Budget, BudgetUpdate, NewBudget};
pub(crate) use expense::{Expense, ExpenseUpdate, NewExpense};
pub(crate) use period::Period;
pub(crate) use user::UserId;

use crate::error::{Result, TrackerError};

/// Trimmed text, or a validation error naming the field when it is blank.
fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(TrackerError::validation(format!("{field} must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}
