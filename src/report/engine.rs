//! Pure report builders over records that were already fetched and scoped to
//! one user. Nothing here touches storage or the clock.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::models::calendar::month_year_label;
use crate::models::{Budget, Expense, Period};

/// Summed spend per category. Categories with no expenses are absent.
pub(crate) type CategorySpend = BTreeMap<String, Decimal>;

pub(crate) fn spend_by_category(expenses: &[Expense]) -> Result<CategorySpend> {
    let mut totals = CategorySpend::new();
    for expense in expenses {
        let total = totals.entry(expense.category.clone()).or_insert(Decimal::ZERO);
        *total = in_range(total.checked_add(expense.amount))?;
    }
    Ok(totals)
}

/// Decimal arithmetic beyond about 7.9e28 has no result.
fn in_range(value: Option<Decimal>) -> Result<Decimal> {
    value.ok_or_else(|| TrackerError::validation("amounts are too large to total"))
}

// ── Budget comparison ─────────────────────────────────────────

/// How budgets that share a category are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum DuplicateBudgets {
    /// One row per budget record, each compared against the full category spend.
    #[default]
    Separate,
    /// One row per category with the limits summed.
    Merge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetRow {
    pub category: String,
    pub limit: Decimal,
    pub period: Period,
    pub month_year: String,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub exceeded: bool,
}

impl BudgetRow {
    fn new(
        category: String,
        limit: Decimal,
        period: Period,
        month_year: String,
        spent: Decimal,
    ) -> Result<Self> {
        let remaining = in_range(limit.checked_sub(spent))?;
        Ok(Self {
            category,
            limit,
            period,
            month_year,
            spent,
            remaining,
            exceeded: remaining < Decimal::ZERO,
        })
    }

    pub(crate) fn status(&self) -> BudgetStatus {
        if self.exceeded {
            BudgetStatus::OverBudget
        } else {
            BudgetStatus::WithinBudget
        }
    }
}

/// Compare each budget against its category's spend, keeping budget order.
pub(crate) fn build_budget_report(
    budgets: &[Budget],
    spend: &CategorySpend,
    duplicates: DuplicateBudgets,
) -> Result<Vec<BudgetRow>> {
    let spent_for = |category: &str| spend.get(category).copied().unwrap_or(Decimal::ZERO);

    match duplicates {
        DuplicateBudgets::Separate => budgets
            .iter()
            .map(|b| {
                BudgetRow::new(
                    b.category.clone(),
                    b.limit,
                    b.period,
                    b.month_year(),
                    spent_for(&b.category),
                )
            })
            .collect(),
        DuplicateBudgets::Merge => {
            let mut rows: Vec<BudgetRow> = Vec::new();
            let mut index: HashMap<&str, usize> = HashMap::new();
            for b in budgets {
                if let Some(&i) = index.get(b.category.as_str()) {
                    let row = &mut rows[i];
                    row.limit = in_range(row.limit.checked_add(b.limit))?;
                    row.remaining = in_range(row.limit.checked_sub(row.spent))?;
                    row.exceeded = row.remaining < Decimal::ZERO;
                } else {
                    index.insert(b.category.as_str(), rows.len());
                    rows.push(BudgetRow::new(
                        b.category.clone(),
                        b.limit,
                        b.period,
                        b.month_year(),
                        spent_for(&b.category),
                    )?);
                }
            }
            Ok(rows)
        }
    }
}

// ── Trends ────────────────────────────────────────────────────

/// Bucketing for the trend series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TrendBucket {
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-WW`, Sunday-first week of the year, zero padded.
    Week,
    /// `YYYY-MM`
    #[default]
    Month,
    /// `YYYY`
    Year,
    /// "Month Year" label, ordered by calendar month.
    MonthYearLabel,
}

impl TrendBucket {
    pub(crate) fn for_period(period: Option<Period>) -> Self {
        match period {
            Some(Period::Daily) => Self::Day,
            Some(Period::Weekly) => Self::Week,
            Some(Period::Monthly) | None => Self::Month,
            Some(Period::Yearly) => Self::Year,
        }
    }

    pub(crate) fn key(&self, ts: &NaiveDateTime) -> String {
        match self {
            Self::Day => ts.format("%Y-%m-%d").to_string(),
            Self::Week => ts.format("%Y-%U").to_string(),
            Self::Month => ts.format("%Y-%m").to_string(),
            Self::Year => ts.format("%Y").to_string(),
            Self::MonthYearLabel => month_year_label(ts),
        }
    }

    /// Sort key. Labels sort by their month, everything else by its text.
    fn order(&self, ts: &NaiveDateTime) -> (i32, u32, String) {
        match self {
            Self::MonthYearLabel => (ts.year(), ts.month(), String::new()),
            _ => (0, 0, self.key(ts)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrendPoint {
    pub bucket: String,
    pub total_spent: Decimal,
}

pub(crate) fn build_trend_report(
    expenses: &[Expense],
    bucket: TrendBucket,
) -> Result<Vec<TrendPoint>> {
    let mut totals: BTreeMap<(i32, u32, String), TrendPoint> = BTreeMap::new();
    for expense in expenses {
        let point = totals
            .entry(bucket.order(&expense.date))
            .or_insert_with(|| TrendPoint {
                bucket: bucket.key(&expense.date),
                total_spent: Decimal::ZERO,
            });
        point.total_spent = in_range(point.total_spent.checked_add(expense.amount))?;
    }
    Ok(totals.into_values().collect())
}

// ── Category percentages ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryShare {
    pub category: String,
    pub total_spent: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryReport {
    pub grand_total: Decimal,
    pub categories: Vec<CategoryShare>,
}

/// Largest categories first. A zero grand total yields an empty report.
pub(crate) fn build_category_report(expenses: &[Expense]) -> Result<CategoryReport> {
    let spend = spend_by_category(expenses)?;
    let mut grand_total = Decimal::ZERO;
    for total in spend.values() {
        grand_total = in_range(grand_total.checked_add(*total))?;
    }
    if grand_total.is_zero() {
        return Ok(CategoryReport::default());
    }

    // Divide before scaling so totals near the Decimal limit still get a share.
    let mut categories = Vec::with_capacity(spend.len());
    for (category, total_spent) in spend {
        let share = in_range(total_spent.checked_div(grand_total))?;
        let percentage = in_range(share.checked_mul(Decimal::ONE_HUNDRED))?;
        categories.push(CategoryShare {
            category,
            total_spent,
            percentage: percentage.normalize(),
        });
    }
    categories.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(CategoryReport {
        grand_total,
        categories,
    })
}

// ── Spend summary ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum BudgetStatus {
    #[serde(rename = "Within Budget")]
    WithinBudget,
    #[serde(rename = "Over Budget")]
    OverBudget,
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WithinBudget => write!(f, "Within Budget"),
            Self::OverBudget => write!(f, "Over Budget"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryTotal {
    pub category: String,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetStatusRow {
    pub category: String,
    pub limit: Decimal,
    pub period: Period,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpendSummary {
    pub expense_summary: Vec<CategoryTotal>,
    pub budget_summary: Vec<BudgetStatusRow>,
}

/// Per-category totals plus budget status.
///
/// `category` narrows the expense totals only; every budget is measured
/// against the spend of its own category.
pub(crate) fn build_spend_summary(
    expenses: &[Expense],
    budgets: &[Budget],
    category: Option<&str>,
) -> Result<SpendSummary> {
    let spend = spend_by_category(expenses)?;

    let mut expense_summary: Vec<CategoryTotal> = spend
        .iter()
        .filter(|(name, _)| category.map_or(true, |c| c == name.as_str()))
        .map(|(name, total)| CategoryTotal {
            category: name.clone(),
            total_spent: *total,
        })
        .collect();
    expense_summary.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then_with(|| a.category.cmp(&b.category))
    });

    let budget_summary = build_budget_report(budgets, &spend, DuplicateBudgets::Separate)?
        .into_iter()
        .map(|row| BudgetStatusRow {
            status: row.status(),
            category: row.category,
            limit: row.limit,
            period: row.period,
            spent: row.spent,
            remaining: row.remaining,
        })
        .collect();

    Ok(SpendSummary {
        expense_summary,
        budget_summary,
    })
}
