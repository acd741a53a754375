use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::calendar::month_year_label;
use super::{require_text, UserId};
use crate::error::{Result, TrackerError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expense {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDateTime,
}

impl Expense {
    /// Display label derived from `date`; recomputed on every read.
    pub(crate) fn month_year(&self) -> String {
        month_year_label(&self.date)
    }
}

impl Serialize for Expense {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Expense", 7)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("userId", &self.user_id)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("amount", &self.amount)?;
        s.serialize_field("category", &self.category)?;
        s.serialize_field("date", &self.date)?;
        s.serialize_field("monthYear", &self.month_year())?;
        s.end()
    }
}

/// Fields supplied when adding an expense, before validation.
#[derive(Debug, Clone, Default)]
pub(crate) struct NewExpense {
    pub title: String,
    pub amount: Option<Decimal>,
    pub category: String,
    pub date: Option<NaiveDateTime>,
}

impl NewExpense {
    /// Validate and build the record. `now` is used when no date was given.
    pub(crate) fn into_expense(self, user_id: &UserId, now: NaiveDateTime) -> Result<Expense> {
        let title = self.title.trim();
        let category = self.category.trim();
        let amount = match self.amount {
            Some(amount) if !title.is_empty() && !category.is_empty() => amount,
            _ => {
                return Err(TrackerError::validation(
                    "title, numeric amount, and category are required",
                ))
            }
        };
        Ok(Expense {
            id: None,
            user_id: user_id.clone(),
            title: title.to_string(),
            amount,
            category: category.to_string(),
            date: self.date.unwrap_or(now),
        })
    }
}

/// Partial update: only the supplied fields overwrite the stored record.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ExpenseUpdate {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub date: Option<NaiveDateTime>,
}

impl ExpenseUpdate {
    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
    }

    /// Trim text fields and reject blanks, field by field.
    pub(crate) fn validate(self) -> Result<Self> {
        if self.is_empty() {
            return Err(TrackerError::validation(
                "at least one of title, amount, category or date is required",
            ));
        }
        Ok(Self {
            title: self.title.map(|t| require_text("title", &t)).transpose()?,
            amount: self.amount,
            category: self.category.map(|c| require_text("category", &c)).transpose()?,
            date: self.date,
        })
    }

    pub(crate) fn apply(&self, expense: &mut Expense) {
        if let Some(title) = &self.title {
            expense.title = title.clone();
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(category) = &self.category {
            expense.category = category.clone();
        }
        if let Some(date) = self.date {
            expense.date = date;
        }
    }
}
