use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::models::calendar::{first_of_month, midnight, month_year_range};
use crate::models::Period;

/// Half-open local-time interval `[start, end)`. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DateWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateWindow {
    pub(crate) fn unbounded() -> Self {
        Self::default()
    }

    pub(crate) fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub(crate) fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start.map_or(true, |start| *ts >= start) && self.end.map_or(true, |end| *ts < end)
    }
}

/// What the caller asked for. Resolved against "now" by [`WindowSpec::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WindowSpec {
    pub period: Option<Period>,
    pub month_year: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl WindowSpec {
    /// Precedence: period, then monthYear label, then explicit dates.
    /// Explicit end dates include the whole end day.
    pub(crate) fn resolve(&self, now: NaiveDateTime) -> Result<DateWindow> {
        if let Some(period) = self.period {
            return Ok(period_window(period, now.date()));
        }
        if let Some(label) = &self.month_year {
            let (start, end) = month_year_range(label)?;
            return Ok(DateWindow::between(start, end));
        }
        Ok(explicit_window(self.start_date, self.end_date))
    }
}

/// Window for the period containing `today`, on local calendar days.
pub(crate) fn period_window(period: Period, today: NaiveDate) -> DateWindow {
    let (start, end) = match period {
        Period::Daily => (today, next_day(today)),
        Period::Weekly => {
            let since_sunday = u64::from(today.weekday().num_days_from_sunday());
            let sunday = today.checked_sub_days(Days::new(since_sunday)).unwrap_or(today);
            let end = sunday.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX);
            (sunday, end)
        }
        Period::Monthly => {
            let first = first_of_month(today);
            let next = first.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
            (first, next)
        }
        Period::Yearly => {
            let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
            let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap_or(NaiveDate::MAX);
            (first, next)
        }
    };
    DateWindow::between(midnight(start), midnight(end))
}

pub(crate) fn explicit_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DateWindow {
    DateWindow {
        start: start.map(midnight),
        end: end.map(|day| midnight(next_day(day))),
    }
}

fn next_day(day: NaiveDate) -> NaiveDate {
    day.succ_opt().unwrap_or(NaiveDate::MAX)
}
