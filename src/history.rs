use crate::errors::AppError;
use crate::models::{DailyWaterLog, HistoryEntry, HistoryQuery, HistoryResponse, HistorySummary};
use crate::progress::{date_key, parse_date_key};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 366;

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryWindow {
    pub fn total_days(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn start_key(&self) -> String {
        date_key(self.start)
    }

    pub fn end_key(&self) -> String {
        date_key(self.end)
    }
}

/// Explicit dates win over `days`. A missing end means today and a missing
/// start counts `days` back from the end.
pub fn resolve_window(query: &HistoryQuery, today: NaiveDate) -> Result<HistoryWindow, AppError> {
    let end = match query.end_date.as_deref() {
        Some(raw) => parse_date_key(raw)?,
        None => today,
    };
    let start = match query.start_date.as_deref() {
        Some(raw) => parse_date_key(raw)?,
        None => {
            let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
            if !(1..=MAX_HISTORY_DAYS).contains(&days) {
                return Err(AppError::bad_request(format!(
                    "days must be between 1 and {MAX_HISTORY_DAYS}"
                )));
            }
            end - Duration::days(i64::from(days) - 1)
        }
    };

    if start > end {
        return Err(AppError::bad_request("startDate must not be after endDate"));
    }
    if (end - start).num_days() >= i64::from(MAX_HISTORY_DAYS) {
        return Err(AppError::bad_request(format!(
            "History window cannot exceed {MAX_HISTORY_DAYS} days"
        )));
    }

    Ok(HistoryWindow { start, end })
}

/// Walks every date of the window, taking persisted logs where they exist
/// and synthesizing empty days at `standing_goal` otherwise.
pub fn build_history(
    window: HistoryWindow,
    logs: &[DailyWaterLog],
    standing_goal: u32,
) -> HistoryResponse {
    let by_date: BTreeMap<&str, &DailyWaterLog> =
        logs.iter().map(|log| (log.date.as_str(), log)).collect();

    let total_days = window.total_days();
    let mut history = Vec::with_capacity(total_days as usize);
    let mut days_with_data = 0u32;
    let mut completed_days = 0u32;
    let mut total_glasses = 0u64;
    let mut logged_glasses = 0u64;

    for offset in 0..total_days {
        let date = window.start + Duration::days(i64::from(offset));
        let key = date_key(date);
        let entry = match by_date.get(key.as_str()) {
            Some(log) => {
                days_with_data += 1;
                logged_glasses += u64::from(log.count);
                HistoryEntry::from_log(log)
            }
            None => HistoryEntry::empty(key, standing_goal),
        };

        if entry.completed {
            completed_days += 1;
        }
        total_glasses += u64::from(entry.count);
        history.push(entry);
    }

    let completion_rate = if total_days == 0 {
        0
    } else {
        (f64::from(completed_days) / f64::from(total_days) * 100.0).round() as u32
    };

    // Days without a log are left out of the average rather than counted as zero.
    let average_per_day = if days_with_data == 0 {
        0.0
    } else {
        (logged_glasses as f64 / f64::from(days_with_data) * 10.0).round() / 10.0
    };

    HistoryResponse {
        history,
        summary: HistorySummary {
            total_days,
            days_with_data,
            completed_days,
            completion_rate,
            total_glasses,
            average_per_day,
        },
    }
}
