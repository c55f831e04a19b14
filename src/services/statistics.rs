//! Calendar aggregation of the work log

use chrono::{Datelike, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::work_log::LogEntry;
use crate::utils::format_clock;

/// Worked time on one day of a month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotal {
    pub day: u32,
    pub total_seconds: u64,
    /// `HH:MM:SS`, absent when nothing was logged that day
    pub label: Option<String>,
}

/// A year and month pair, used for calendar navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

impl MonthRef {
    /// `delta` months away from this one
    pub fn shifted(self, delta: i32) -> Self {
        let (year, month) = shift_month(self.year, self.month, delta);
        Self { year, month }
    }
}

/// Month grid ready for a Sunday-first calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st (Sunday = 0)
    pub leading_blank_days: u32,
    pub days: Vec<DayTotal>,
    pub total_seconds: u64,
    pub total_label: String,
    pub previous: MonthRef,
    pub next: MonthRef,
}

fn local_date<Tz: TimeZone>(entry: &LogEntry, tz: &Tz) -> NaiveDate {
    entry.occurred_at.with_timezone(tz).date_naive()
}

/// Total seconds logged on `date` as seen in `tz`
pub fn daily_total<Tz: TimeZone>(entries: &[LogEntry], date: NaiveDate, tz: &Tz) -> u64 {
    entries
        .iter()
        .filter(|entry| local_date(entry, tz) == date)
        .map(|entry| entry.duration_seconds)
        .sum()
}

/// Per-day totals for one month. Returns `None` for an invalid month.
pub fn monthly_calendar<Tz: TimeZone>(
    entries: &[LogEntry],
    year: i32,
    month: u32,
    tz: &Tz,
) -> Option<MonthCalendar> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;
    let day_count = next_first.signed_duration_since(first).num_days() as usize;

    let mut totals = vec![0u64; day_count];
    for entry in entries {
        let date = local_date(entry, tz);
        if date.year() == year && date.month() == month {
            totals[date.day0() as usize] += entry.duration_seconds;
        }
    }

    let days: Vec<DayTotal> = totals
        .iter()
        .enumerate()
        .map(|(index, &total_seconds)| DayTotal {
            day: index as u32 + 1,
            total_seconds,
            label: (total_seconds > 0).then(|| format_clock(total_seconds)),
        })
        .collect();
    let total_seconds: u64 = totals.iter().sum();
    let current = MonthRef { year, month };

    Some(MonthCalendar {
        year,
        month,
        leading_blank_days: first.weekday().num_days_from_sunday(),
        days,
        total_seconds,
        total_label: format_clock(total_seconds),
        previous: current.shifted(-1),
        next: current.shifted(1),
    })
}

/// Move `delta` months from `year`/`month`, wrapping across years
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}
