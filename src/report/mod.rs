//! Budget-vs-spend reporting: window resolution, pure report builders and
//! the service that feeds them from storage.

mod engine;
mod service;
mod source;
mod window;

pub(crate) use engine::{BudgetRow, CategoryReport, DuplicateBudgets, SpendSummary, TrendPoint};
pub(crate) use service::ReportService;
pub(crate) use source::{BudgetFilter, ExpenseFilter, RecordSource};
pub(crate) use window::{DateWindow, WindowSpec};
