use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::models::{Period, UserId};

use super::engine::{
    build_budget_report, build_category_report, build_spend_summary, build_trend_report,
    spend_by_category, BudgetRow, CategoryReport, DuplicateBudgets, SpendSummary, TrendBucket,
    TrendPoint,
};
use super::source::{BudgetFilter, ExpenseFilter, RecordSource};
use super::window::{explicit_window, WindowSpec};

/// Fetches one user's records through a [`RecordSource`] and hands them to
/// the pure builders. Storage failures propagate unchanged.
pub(crate) struct ReportService<'a, S: RecordSource> {
    source: &'a S,
    now: NaiveDateTime,
}

impl<'a, S: RecordSource> ReportService<'a, S> {
    /// `now` anchors period windows ("this week", "this month").
    pub(crate) fn new(source: &'a S, now: NaiveDateTime) -> Self {
        Self { source, now }
    }

    /// Budget vs spend for the resolved window.
    ///
    /// Budgets are narrowed by `period` when one is given, otherwise by the
    /// month of their start date when a monthYear label is given.
    pub(crate) fn budget_report(
        &self,
        user: &UserId,
        spec: &WindowSpec,
        duplicates: DuplicateBudgets,
    ) -> Result<Vec<BudgetRow>> {
        let window = spec.resolve(self.now)?;
        let expenses = self.source.find_expenses(
            user,
            &ExpenseFilter {
                window,
                category: None,
            },
        )?;

        let budget_filter = match (spec.period, &spec.month_year) {
            (Some(period), _) => BudgetFilter {
                period: Some(period),
                ..Default::default()
            },
            (None, Some(_)) => BudgetFilter {
                window,
                ..Default::default()
            },
            (None, None) => BudgetFilter::default(),
        };
        let budgets = self.source.find_budgets(user, &budget_filter)?;

        let rows = build_budget_report(&budgets, &spend_by_category(&expenses)?, duplicates)?;
        tracing::debug!(
            user = %user,
            expenses = expenses.len(),
            budgets = budgets.len(),
            exceeded = rows.iter().filter(|r| r.exceeded).count(),
            "built budget report"
        );
        Ok(rows)
    }

    /// Spend per time bucket. The period picks the bucket size; only explicit
    /// dates narrow the records.
    pub(crate) fn trend_report(
        &self,
        user: &UserId,
        period: Option<Period>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        by_label: bool,
    ) -> Result<Vec<TrendPoint>> {
        let bucket = if by_label {
            TrendBucket::MonthYearLabel
        } else {
            TrendBucket::for_period(period)
        };
        let filter = ExpenseFilter {
            window: explicit_window(start_date, end_date),
            category: None,
        };
        let expenses = self.source.find_expenses(user, &filter)?;
        let points = build_trend_report(&expenses, bucket)?;
        tracing::debug!(user = %user, ?bucket, buckets = points.len(), "built trend report");
        Ok(points)
    }

    pub(crate) fn category_report(&self, user: &UserId, spec: &WindowSpec) -> Result<CategoryReport> {
        let window = spec.resolve(self.now)?;
        if window.is_unbounded() {
            tracing::debug!(user = %user, "category report over all expenses");
        }
        let expenses = self.source.find_expenses(
            user,
            &ExpenseFilter {
                window,
                category: None,
            },
        )?;
        let report = build_category_report(&expenses)?;
        tracing::debug!(
            user = %user,
            categories = report.categories.len(),
            "built category report"
        );
        Ok(report)
    }

    pub(crate) fn spend_summary(
        &self,
        user: &UserId,
        category: Option<&str>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<SpendSummary> {
        let filter = ExpenseFilter {
            window: explicit_window(start_date, end_date),
            category: None,
        };
        let expenses = self.source.find_expenses(user, &filter)?;
        let budgets = self.source.find_budgets(user, &BudgetFilter::default())?;
        build_spend_summary(&expenses, &budgets, category)
    }
}
