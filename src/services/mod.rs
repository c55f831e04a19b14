//! Work log persistence and read-side statistics

pub mod statistics;
pub mod work_log;

// Re-export main types
pub use statistics::{daily_total, monthly_calendar, shift_month, DayTotal, MonthCalendar, MonthRef};
pub use work_log::{JsonFileStore, LogEntry, MemoryStore, WorkLogStore};
