use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

use super::AppContext;
use crate::error::{Result, TrackerError};
use crate::format::{format_amount, format_percentage, truncate};
use crate::models::calendar::{format_timestamp, month_year_range, parse_date_input};
use crate::models::*;
use crate::report::{
    BudgetFilter, BudgetRow, CategoryReport, DateWindow, DuplicateBudgets, ExpenseFilter,
    ReportService, SpendSummary, TrendPoint, WindowSpec,
};

/// Track expenses against budgets and report on spending.
#[derive(Parser, Debug)]
#[command(name = "expense-tracker", author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// User whose records are read and written
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Database file (default: per-user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Print JSON bodies instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Add, list, change and remove expenses
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Add, list, change and remove budgets
    #[command(subcommand)]
    Budget(BudgetCommand),
    /// Budget-vs-spend, trend, category and summary reports
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Subcommand, Debug)]
pub(crate) enum ExpenseCommand {
    /// Record a new expense
    Add {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        category: Option<String>,
        /// Defaults to now
        #[arg(long, value_parser = parse_date_input)]
        date: Option<NaiveDateTime>,
    },
    /// List expenses, newest first
    List {
        /// Only this month, e.g. "September 2025"
        #[arg(long, value_name = "LABEL")]
        month: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one expense
    Show { id: i64 },
    /// Change the given fields of an expense
    Update {
        id: i64,
        #[command(flatten)]
        fields: ExpenseFields,
    },
    /// Remove an expense
    Delete { id: i64 },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExpenseFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    amount: Option<Decimal>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long, value_parser = parse_date_input)]
    date: Option<NaiveDateTime>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum BudgetCommand {
    /// Set a spending limit for a category
    Add {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<Decimal>,
        /// daily, weekly, monthly (default) or yearly
        #[arg(long)]
        period: Option<Period>,
        /// Start date, defaults to now
        #[arg(long, value_parser = parse_date_input)]
        date: Option<NaiveDateTime>,
    },
    /// List budgets in creation order
    List {
        /// Only budgets starting in this month, e.g. "September 2025"
        #[arg(long, value_name = "LABEL")]
        month: Option<String>,
        #[arg(long)]
        period: Option<Period>,
    },
    /// Months that have budgets, oldest first
    Months,
    /// Change the given fields of a budget
    Update {
        id: i64,
        #[command(flatten)]
        fields: BudgetFields,
    },
    /// Remove a budget
    Delete { id: i64 },
}

#[derive(Args, Debug, Default)]
pub(crate) struct BudgetFields {
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    limit: Option<Decimal>,
    #[arg(long)]
    period: Option<Period>,
    #[arg(long, value_parser = parse_date_input)]
    date: Option<NaiveDateTime>,
}

/// Window selection shared by the windowed reports.
/// Precedence: --period, then --month, then --from/--to.
#[derive(Args, Debug, Default)]
pub(crate) struct WindowArgs {
    /// Current day, week, month or year
    #[arg(long)]
    period: Option<Period>,
    /// A calendar month, e.g. "September 2025"
    #[arg(long, value_name = "LABEL")]
    month: Option<String>,
    /// First day included (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    to: Option<NaiveDate>,
}

impl WindowArgs {
    fn spec(&self) -> WindowSpec {
        WindowSpec {
            period: self.period,
            month_year: self.month.clone(),
            start_date: self.from,
            end_date: self.to,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum ReportCommand {
    /// Spend against each budget
    Budget {
        #[command(flatten)]
        window: WindowArgs,
        /// One row per category with limits summed
        #[arg(long)]
        merge_duplicates: bool,
    },
    /// Spend per day, week, month or year
    Trend {
        /// Bucket size (default: month)
        #[arg(long)]
        period: Option<Period>,
        #[arg(long, value_name = "DATE")]
        from: Option<NaiveDate>,
        #[arg(long, value_name = "DATE")]
        to: Option<NaiveDate>,
        /// Bucket by "Month Year" label
        #[arg(long)]
        by_label: bool,
    },
    /// Share of spend per category
    Category {
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Spend per category plus the status of every budget
    Summary {
        /// Only list this category's spend
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_name = "DATE")]
        from: Option<NaiveDate>,
        #[arg(long, value_name = "DATE")]
        to: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

pub(crate) fn dispatch<W: Write>(
    args: &Cli,
    ctx: &AppContext,
    now: NaiveDateTime,
    out: &mut W,
) -> Result<()> {
    let user = ctx.current_user()?;
    let mut cmd = Handler {
        ctx,
        user,
        now,
        json: args.json,
        out,
    };
    match &args.command {
        Command::Expense(command) => cmd.expense(command),
        Command::Budget(command) => cmd.budget(command),
        Command::Report(command) => cmd.report(command),
    }
}

struct Handler<'a, W: Write> {
    ctx: &'a AppContext,
    user: UserId,
    now: NaiveDateTime,
    json: bool,
    out: &'a mut W,
}

impl<W: Write> Handler<'_, W> {
    /// JSON body when `--json` was given, otherwise the table `text` writes.
    fn emit<T: Serialize>(
        &mut self,
        value: &T,
        text: impl FnOnce(&mut W, &T) -> io::Result<()>,
    ) -> Result<()> {
        if self.json {
            serde_json::to_writer_pretty(&mut *self.out, value)?;
            writeln!(self.out)?;
        } else {
            text(self.out, value)?;
        }
        Ok(())
    }

    // ── Expenses ──────────────────────────────────────────────

    fn expense(&mut self, command: &ExpenseCommand) -> Result<()> {
        let ctx = self.ctx;
        let db = &ctx.db;
        match command {
            ExpenseCommand::Add {
                title,
                amount,
                category,
                date,
            } => {
                let new = NewExpense {
                    title: title.clone().unwrap_or_default(),
                    amount: *amount,
                    category: category.clone().unwrap_or_default(),
                    date: *date,
                };
                let expense = db.insert_expense(&new.into_expense(&self.user, self.now)?)?;
                tracing::info!(user = %self.user, id = ?expense.id, "expense added");
                self.emit(&expense, |out, e| {
                    writeln!(
                        out,
                        "Added expense #{}: {} {}",
                        e.id.unwrap_or(0),
                        e.title,
                        format_amount(e.amount)
                    )
                })
            }
            ExpenseCommand::List { month, category } => {
                let filter = ExpenseFilter {
                    window: month_window(month.as_deref())?,
                    category: category.clone(),
                };
                let expenses = db.get_expenses(&self.user, &filter)?;
                self.emit(&expenses, |out, list| write_expenses(out, list))
            }
            ExpenseCommand::Show { id } => {
                let expense = db
                    .get_expense(&self.user, *id)?
                    .ok_or(TrackerError::NotFound("Expense not found"))?;
                self.emit(&expense, |out, e| write_expenses(out, std::slice::from_ref(e)))
            }
            ExpenseCommand::Update { id, fields } => {
                let update = ExpenseUpdate {
                    title: fields.title.clone(),
                    amount: fields.amount,
                    category: fields.category.clone(),
                    date: fields.date,
                }
                .validate()?;
                let expense = db
                    .update_expense(&self.user, *id, &update)?
                    .ok_or(TrackerError::NotFound("Expense not found"))?;
                tracing::info!(user = %self.user, id, "expense updated");
                self.emit(&expense, |out, e| write_expenses(out, std::slice::from_ref(e)))
            }
            ExpenseCommand::Delete { id } => {
                if !db.delete_expense(&self.user, *id)? {
                    return Err(TrackerError::NotFound("Expense not found"));
                }
                tracing::info!(user = %self.user, id, "expense deleted");
                let message = Message {
                    message: "Expense deleted successfully",
                };
                self.emit(&message, |out, m| writeln!(out, "{}", m.message))
            }
        }
    }

    // ── Budgets ───────────────────────────────────────────────

    fn budget(&mut self, command: &BudgetCommand) -> Result<()> {
        let ctx = self.ctx;
        let db = &ctx.db;
        match command {
            BudgetCommand::Add {
                category,
                limit,
                period,
                date,
            } => {
                let new = NewBudget {
                    category: category.clone().unwrap_or_default(),
                    limit: *limit,
                    period: *period,
                    start_date: *date,
                };
                let budget = db.insert_budget(&new.into_budget(&self.user, self.now)?)?;
                tracing::info!(user = %self.user, id = ?budget.id, "budget added");
                self.emit(&budget, |out, b| {
                    writeln!(
                        out,
                        "Added {} budget #{}: {} {}",
                        b.period,
                        b.id.unwrap_or(0),
                        b.category,
                        format_amount(b.limit)
                    )
                })
            }
            BudgetCommand::List { month, period } => {
                let filter = BudgetFilter {
                    period: *period,
                    window: month_window(month.as_deref())?,
                    category: None,
                };
                let budgets = db.get_budgets(&self.user, &filter)?;
                self.emit(&budgets, |out, list| write_budgets(out, list))
            }
            BudgetCommand::Months => {
                let months = db.get_budget_months(&self.user)?;
                self.emit(&months, |out, list| {
                    if list.is_empty() {
                        return writeln!(out, "No budgets");
                    }
                    for month in list {
                        writeln!(out, "{month}")?;
                    }
                    Ok(())
                })
            }
            BudgetCommand::Update { id, fields } => {
                let update = BudgetUpdate {
                    category: fields.category.clone(),
                    limit: fields.limit,
                    period: fields.period,
                    start_date: fields.date,
                }
                .validate()?;
                let budget = db
                    .update_budget(&self.user, *id, &update)?
                    .ok_or(TrackerError::NotFound("Budget not found"))?;
                tracing::info!(user = %self.user, id, "budget updated");
                self.emit(&budget, |out, b| write_budgets(out, std::slice::from_ref(b)))
            }
            BudgetCommand::Delete { id } => {
                if !db.delete_budget(&self.user, *id)? {
                    return Err(TrackerError::NotFound("Budget not found"));
                }
                tracing::info!(user = %self.user, id, "budget deleted");
                let message = Message {
                    message: "Budget deleted successfully",
                };
                self.emit(&message, |out, m| writeln!(out, "{}", m.message))
            }
        }
    }

    // ── Reports ───────────────────────────────────────────────

    fn report(&mut self, command: &ReportCommand) -> Result<()> {
        let ctx = self.ctx;
        let service = ReportService::new(&ctx.db, self.now);
        match command {
            ReportCommand::Budget {
                window,
                merge_duplicates,
            } => {
                let duplicates = if *merge_duplicates {
                    DuplicateBudgets::Merge
                } else {
                    ctx.config.duplicate_budgets
                };
                let rows = service.budget_report(&self.user, &window.spec(), duplicates)?;
                self.emit(&rows, |out, rows| write_budget_report(out, rows))
            }
            ReportCommand::Trend {
                period,
                from,
                to,
                by_label,
            } => {
                let points = service.trend_report(&self.user, *period, *from, *to, *by_label)?;
                self.emit(&points, |out, points| write_trend(out, points))
            }
            ReportCommand::Category { window } => {
                let report = service.category_report(&self.user, &window.spec())?;
                self.emit(&report, |out, report| write_category_report(out, report))
            }
            ReportCommand::Summary { category, from, to } => {
                let summary = service.spend_summary(&self.user, category.as_deref(), *from, *to)?;
                self.emit(&summary, |out, summary| write_summary(out, summary))
            }
        }
    }
}

/// Window for a `--month` label, unbounded when none was given.
fn month_window(label: Option<&str>) -> Result<DateWindow> {
    match label {
        Some(label) => {
            let (start, end) = month_year_range(label)?;
            Ok(DateWindow::between(start, end))
        }
        None => Ok(DateWindow::unbounded()),
    }
}

// ── Tables ────────────────────────────────────────────────────

fn write_expenses(out: &mut impl Write, expenses: &[Expense]) -> io::Result<()> {
    if expenses.is_empty() {
        return writeln!(out, "No expenses");
    }
    writeln!(
        out,
        "{:<5} {:<19} {:<24} {:<16} {:>12}",
        "ID", "Date", "Title", "Category", "Amount"
    )?;
    writeln!(out, "{}", "─".repeat(80))?;
    for e in expenses {
        writeln!(
            out,
            "{:<5} {:<19} {:<24} {:<16} {:>12}",
            e.id.unwrap_or(0),
            format_timestamp(&e.date),
            truncate(&e.title, 24),
            truncate(&e.category, 16),
            format_amount(e.amount),
        )?;
    }
    Ok(())
}

fn write_budgets(out: &mut impl Write, budgets: &[Budget]) -> io::Result<()> {
    if budgets.is_empty() {
        return writeln!(out, "No budgets");
    }
    writeln!(
        out,
        "{:<5} {:<20} {:>12} {:<8} Month",
        "ID", "Category", "Limit", "Period"
    )?;
    writeln!(out, "{}", "─".repeat(65))?;
    for b in budgets {
        writeln!(
            out,
            "{:<5} {:<20} {:>12} {:<8} {}",
            b.id.unwrap_or(0),
            truncate(&b.category, 20),
            format_amount(b.limit),
            b.period,
            b.month_year(),
        )?;
    }
    Ok(())
}

fn write_budget_report(out: &mut impl Write, rows: &[BudgetRow]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No budgets");
    }
    writeln!(
        out,
        "{:<20} {:<8} {:>12} {:>12} {:>12}  Status",
        "Category", "Period", "Limit", "Spent", "Remaining"
    )?;
    writeln!(out, "{}", "─".repeat(82))?;
    for row in rows {
        writeln!(
            out,
            "{:<20} {:<8} {:>12} {:>12} {:>12}  {}",
            truncate(&row.category, 20),
            row.period,
            format_amount(row.limit),
            format_amount(row.spent),
            format_amount(row.remaining),
            row.status(),
        )?;
    }
    Ok(())
}

fn write_trend(out: &mut impl Write, points: &[TrendPoint]) -> io::Result<()> {
    if points.is_empty() {
        return writeln!(out, "No expenses");
    }
    for point in points {
        writeln!(out, "{:<16} {:>12}", point.bucket, format_amount(point.total_spent))?;
    }
    Ok(())
}

fn write_category_report(out: &mut impl Write, report: &CategoryReport) -> io::Result<()> {
    if report.categories.is_empty() {
        return writeln!(out, "No expenses");
    }
    for share in &report.categories {
        writeln!(
            out,
            "{:<20} {:>12} {:>7}",
            truncate(&share.category, 20),
            format_amount(share.total_spent),
            format_percentage(share.percentage),
        )?;
    }
    writeln!(out, "{}", "─".repeat(41))?;
    writeln!(out, "{:<20} {:>12}", "Total", format_amount(report.grand_total))
}

fn write_summary(out: &mut impl Write, summary: &SpendSummary) -> io::Result<()> {
    writeln!(out, "Spending by Category:")?;
    if summary.expense_summary.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for total in &summary.expense_summary {
        writeln!(
            out,
            "  {:<24} {:>12}",
            truncate(&total.category, 24),
            format_amount(total.total_spent)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Budgets:")?;
    if summary.budget_summary.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for row in &summary.budget_summary {
        writeln!(
            out,
            "  {:<24} {:>12} of {:>12}  {}",
            truncate(&row.category, 24),
            format_amount(row.spent),
            format_amount(row.limit),
            row.status,
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
