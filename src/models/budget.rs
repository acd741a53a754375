use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::calendar::month_year_label;
use super::{require_text, Period, UserId};
use crate::error::{Result, TrackerError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Budget {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub category: String,
    pub limit: Decimal,
    pub period: Period,
    pub start_date: NaiveDateTime,
}

impl Budget {
    /// Display label derived from `start_date`.
    pub(crate) fn month_year(&self) -> String {
        month_year_label(&self.start_date)
    }
}

impl Serialize for Budget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Budget", 7)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("userId", &self.user_id)?;
        s.serialize_field("category", &self.category)?;
        s.serialize_field("limit", &self.limit)?;
        s.serialize_field("period", &self.period)?;
        s.serialize_field("startDate", &self.start_date)?;
        s.serialize_field("monthYear", &self.month_year())?;
        s.end()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NewBudget {
    pub category: String,
    pub limit: Option<Decimal>,
    pub period: Option<Period>,
    pub start_date: Option<NaiveDateTime>,
}

impl NewBudget {
    pub(crate) fn into_budget(self, user_id: &UserId, now: NaiveDateTime) -> Result<Budget> {
        let category = self.category.trim();
        let limit = match self.limit {
            Some(limit) if !category.is_empty() => limit,
            _ => return Err(TrackerError::validation("limit and category are required")),
        };
        Ok(Budget {
            id: None,
            user_id: user_id.clone(),
            category: category.to_string(),
            limit,
            period: self.period.unwrap_or_default(),
            start_date: self.start_date.unwrap_or(now),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BudgetUpdate {
    pub category: Option<String>,
    pub limit: Option<Decimal>,
    pub period: Option<Period>,
    pub start_date: Option<NaiveDateTime>,
}

impl BudgetUpdate {
    pub(crate) fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.limit.is_none()
            && self.period.is_none()
            && self.start_date.is_none()
    }

    pub(crate) fn validate(self) -> Result<Self> {
        if self.is_empty() {
            return Err(TrackerError::validation(
                "at least one of category, limit, period or start date is required",
            ));
        }
        Ok(Self {
            category: self.category.map(|c| require_text("category", &c)).transpose()?,
            ..self
        })
    }

    pub(crate) fn apply(&self, budget: &mut Budget) {
        if let Some(category) = &self.category {
            budget.category = category.clone();
        }
        if let Some(limit) = self.limit {
            budget.limit = limit;
        }
        if let Some(period) = self.period {
            budget.period = period;
        }
        if let Some(start_date) = self.start_date {
            budget.start_date = start_date;
        }
    }
}
