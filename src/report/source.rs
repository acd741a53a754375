use crate::error::Result;
use crate::models::{Budget, Expense, Period, UserId};

use super::window::DateWindow;

/// Constraints for an expense lookup. All present constraints must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ExpenseFilter {
    /// Applied to the expense date.
    pub window: DateWindow,
    /// Exact, case-sensitive match.
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BudgetFilter {
    pub period: Option<Period>,
    /// Applied to the budget start date.
    pub window: DateWindow,
    pub category: Option<String>,
}

/// Read side of the record store, scoped to one user per call.
pub(crate) trait RecordSource {
    fn find_expenses(&self, user: &UserId, filter: &ExpenseFilter) -> Result<Vec<Expense>>;

    fn find_budgets(&self, user: &UserId, filter: &BudgetFilter) -> Result<Vec<Budget>>;
}
