mod schema;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, TrackerError};
use crate::models::calendar::{format_timestamp, month_year_label, midnight, parse_timestamp};
use crate::models::*;
use crate::report::{BudgetFilter, DateWindow, ExpenseFilter, RecordSource};

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let mut db = Self { conn };
        db.migrate()?;
        tracing::info!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        // Check if schema_version table exists
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(version = schema::CURRENT_VERSION, "created schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })?;

        let tx = self.conn.transaction()?;
        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                tracing::info!(from_version, "applying migration");
                tx.execute_batch(sql)?;
            }
        }
        if current < schema::CURRENT_VERSION {
            tx.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&self, expense: &Expense) -> Result<Expense> {
        self.conn.execute(
            "INSERT INTO expenses (user_id, title, amount, category, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                expense.user_id.as_str(),
                expense.title,
                expense.amount.to_string(),
                expense.category,
                format_timestamp(&expense.date),
            ],
        )?;
        Ok(Expense {
            id: Some(self.conn.last_insert_rowid()),
            ..expense.clone()
        })
    }

    pub(crate) fn get_expense(&self, user: &UserId, id: i64) -> Result<Option<Expense>> {
        let result = self.conn.query_row(
            "SELECT id, user_id, title, amount, category, date FROM expenses
             WHERE id = ?1 AND user_id = ?2",
            params![id, user.as_str()],
            ExpenseRow::from_row,
        );
        match result {
            Ok(row) => Ok(Some(row.into_expense()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Newest first.
    pub(crate) fn get_expenses(&self, user: &UserId, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut query = Query::new(
            "SELECT id, user_id, title, amount, category, date FROM expenses WHERE user_id = ?1",
            user,
        );
        query.window("date", &filter.window);
        if let Some(category) = &filter.category {
            query.push(" AND category = ?", category.clone());
        }
        query.sql.push_str(" ORDER BY date DESC, id DESC");

        let mut stmt = self.conn.prepare(&query.sql)?;
        let rows = stmt.query_map(query.params().as_slice(), ExpenseRow::from_row)?;
        let expenses = rows
            .map(|row| row.map_err(TrackerError::from).and_then(ExpenseRow::into_expense))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(user = %user, count = expenses.len(), "fetched expenses");
        Ok(expenses)
    }

    /// Returns the updated record, or `None` when the id is not the user's.
    pub(crate) fn update_expense(
        &self,
        user: &UserId,
        id: i64,
        update: &ExpenseUpdate,
    ) -> Result<Option<Expense>> {
        let Some(mut expense) = self.get_expense(user, id)? else {
            return Ok(None);
        };
        update.apply(&mut expense);
        self.conn.execute(
            "UPDATE expenses SET title = ?1, amount = ?2, category = ?3, date = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![
                expense.title,
                expense.amount.to_string(),
                expense.category,
                format_timestamp(&expense.date),
                id,
                user.as_str(),
            ],
        )?;
        Ok(Some(expense))
    }

    /// Returns whether a record was removed.
    pub(crate) fn delete_expense(&self, user: &UserId, id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
            params![id, user.as_str()],
        )?;
        Ok(removed > 0)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn insert_budget(&self, budget: &Budget) -> Result<Budget> {
        self.conn.execute(
            "INSERT INTO budgets (user_id, category, limit_amount, period, start_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                budget.user_id.as_str(),
                budget.category,
                budget.limit.to_string(),
                budget.period.as_str(),
                format_timestamp(&budget.start_date),
            ],
        )?;
        Ok(Budget {
            id: Some(self.conn.last_insert_rowid()),
            ..budget.clone()
        })
    }

    pub(crate) fn get_budget(&self, user: &UserId, id: i64) -> Result<Option<Budget>> {
        let result = self.conn.query_row(
            "SELECT id, user_id, category, limit_amount, period, start_date FROM budgets
             WHERE id = ?1 AND user_id = ?2",
            params![id, user.as_str()],
            BudgetRow::from_row,
        );
        match result {
            Ok(row) => Ok(Some(row.into_budget()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// In insertion order.
    pub(crate) fn get_budgets(&self, user: &UserId, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        let mut query = Query::new(
            "SELECT id, user_id, category, limit_amount, period, start_date FROM budgets
             WHERE user_id = ?1",
            user,
        );
        if let Some(period) = filter.period {
            query.push(" AND period = ?", period.as_str().to_string());
        }
        query.window("start_date", &filter.window);
        if let Some(category) = &filter.category {
            query.push(" AND category = ?", category.clone());
        }
        query.sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&query.sql)?;
        let rows = stmt.query_map(query.params().as_slice(), BudgetRow::from_row)?;
        let budgets = rows
            .map(|row| row.map_err(TrackerError::from).and_then(BudgetRow::into_budget))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(user = %user, count = budgets.len(), "fetched budgets");
        Ok(budgets)
    }

    pub(crate) fn update_budget(
        &self,
        user: &UserId,
        id: i64,
        update: &BudgetUpdate,
    ) -> Result<Option<Budget>> {
        let Some(mut budget) = self.get_budget(user, id)? else {
            return Ok(None);
        };
        update.apply(&mut budget);
        self.conn.execute(
            "UPDATE budgets SET category = ?1, limit_amount = ?2, period = ?3, start_date = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![
                budget.category,
                budget.limit.to_string(),
                budget.period.as_str(),
                format_timestamp(&budget.start_date),
                id,
                user.as_str(),
            ],
        )?;
        Ok(Some(budget))
    }

    pub(crate) fn delete_budget(&self, user: &UserId, id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM budgets WHERE id = ?1 AND user_id = ?2",
            params![id, user.as_str()],
        )?;
        Ok(removed > 0)
    }

    /// Distinct "Month Year" labels of the user's budgets, oldest first.
    pub(crate) fn get_budget_months(&self, user: &UserId) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT substr(start_date, 1, 7) AS month FROM budgets
             WHERE user_id = ?1 ORDER BY month",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| row.get::<_, String>(0))?;
        rows.map(|month| {
            let month = month?;
            NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
                .map(|first| month_year_label(&midnight(first)))
                .map_err(|_| corrupt("budgets", "start_date", month))
        })
        .collect()
    }
}

impl RecordSource for Database {
    fn find_expenses(&self, user: &UserId, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        self.get_expenses(user, filter)
    }

    fn find_budgets(&self, user: &UserId, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        self.get_budgets(user, filter)
    }
}

/// SQL text plus positional parameters, always scoped by user as `?1`.
struct Query {
    sql: String,
    values: Vec<Box<dyn rusqlite::types::ToSql>>,
}

impl Query {
    fn new(base: &str, user: &UserId) -> Self {
        Self {
            sql: base.to_string(),
            values: vec![Box::new(user.as_str().to_string())],
        }
    }

    /// Append a clause ending in `?`; the placeholder index is filled in.
    fn push(&mut self, clause: &str, value: String) {
        self.values.push(Box::new(value));
        self.sql.push_str(clause);
        self.sql.push_str(&self.values.len().to_string());
    }

    fn window(&mut self, column: &str, window: &DateWindow) {
        if let Some(start) = window.start {
            self.push(&format!(" AND {column} >= ?"), format_timestamp(&start));
        }
        if let Some(end) = window.end {
            self.push(&format!(" AND {column} < ?"), format_timestamp(&end));
        }
    }

    fn params(&self) -> Vec<&dyn rusqlite::types::ToSql> {
        self.values.iter().map(|p| p.as_ref()).collect()
    }
}

struct ExpenseRow {
    id: i64,
    user_id: String,
    title: String,
    amount: String,
    category: String,
    date: String,
}

impl ExpenseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            date: row.get(5)?,
        })
    }

    fn into_expense(self) -> Result<Expense> {
        Ok(Expense {
            id: Some(self.id),
            user_id: UserId::new(&self.user_id)
                .ok_or_else(|| corrupt("expenses", "user_id", self.user_id.clone()))?,
            amount: Decimal::from_str(&self.amount)
                .map_err(|_| corrupt("expenses", "amount", self.amount.clone()))?,
            date: parse_timestamp(&self.date)
                .ok_or_else(|| corrupt("expenses", "date", self.date.clone()))?,
            title: self.title,
            category: self.category,
        })
    }
}

struct BudgetRow {
    id: i64,
    user_id: String,
    category: String,
    limit_amount: String,
    period: String,
    start_date: String,
}

impl BudgetRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category: row.get(2)?,
            limit_amount: row.get(3)?,
            period: row.get(4)?,
            start_date: row.get(5)?,
        })
    }

    fn into_budget(self) -> Result<Budget> {
        Ok(Budget {
            id: Some(self.id),
            user_id: UserId::new(&self.user_id)
                .ok_or_else(|| corrupt("budgets", "user_id", self.user_id.clone()))?,
            limit: Decimal::from_str(&self.limit_amount)
                .map_err(|_| corrupt("budgets", "limit_amount", self.limit_amount.clone()))?,
            period: Period::parse(&self.period)
                .ok_or_else(|| corrupt("budgets", "period", self.period.clone()))?,
            start_date: parse_timestamp(&self.start_date)
                .ok_or_else(|| corrupt("budgets", "start_date", self.start_date.clone()))?,
            category: self.category,
        })
    }
}

fn corrupt(table: &'static str, column: &'static str, value: String) -> TrackerError {
    TrackerError::CorruptRecord {
        table,
        column,
        value,
    }
}

#[cfg(test)]
mod tests;
