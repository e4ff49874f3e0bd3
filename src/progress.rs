use crate::errors::AppError;
use crate::models::{DailyWaterLog, HistoryEntry, WaterProgress, MAX_WATER_GOAL, MIN_WATER_GOAL};
use chrono::{Local, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a strict `YYYY-MM-DD` key. Chrono alone would accept unpadded
/// fields, so the shape is checked first.
pub fn parse_date_key(raw: &str) -> Result<NaiveDate, AppError> {
    let shaped = raw.len() == 10
        && raw.bytes().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => byte == b'-',
            _ => byte.is_ascii_digit(),
        });
    if !shaped {
        return Err(AppError::bad_request("Invalid date format. Use YYYY-MM-DD"));
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| AppError::bad_request(format!("Invalid date: {raw}")))
}

pub fn percentage(count: u32, goal: u32) -> u32 {
    if goal == 0 {
        return 0;
    }
    let pct = (f64::from(count) / f64::from(goal) * 100.0).round();
    pct.min(100.0) as u32
}

pub fn remaining(count: u32, goal: u32) -> u32 {
    goal.saturating_sub(count)
}

pub fn completed(count: u32, goal: u32) -> bool {
    count >= goal
}

pub fn validate_goal(raw: f64) -> Result<u32, AppError> {
    let goal = raw.round();
    if !goal.is_finite() || goal < f64::from(MIN_WATER_GOAL) || goal > f64::from(MAX_WATER_GOAL) {
        return Err(AppError::bad_request(format!(
            "Goal must be between {MIN_WATER_GOAL} and {MAX_WATER_GOAL}"
        )));
    }
    Ok(goal as u32)
}

pub fn validate_count(raw: f64) -> Result<u32, AppError> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(AppError::bad_request("Count must be a non-negative number"));
    }
    let count = raw.round();
    if count > f64::from(u32::MAX) {
        return Err(AppError::bad_request(format!("Count must not exceed {}", u32::MAX)));
    }
    Ok(count as u32)
}

impl WaterProgress {
    pub fn new(date: String, count: u32, goal: u32) -> Self {
        Self {
            date,
            count,
            goal,
            percentage: percentage(count, goal),
            remaining: remaining(count, goal),
            completed: completed(count, goal),
        }
    }
}

impl From<&DailyWaterLog> for WaterProgress {
    fn from(log: &DailyWaterLog) -> Self {
        Self::new(log.date.clone(), log.count, log.goal)
    }
}

impl HistoryEntry {
    pub fn from_log(log: &DailyWaterLog) -> Self {
        Self {
            date: log.date.clone(),
            count: log.count,
            goal: log.goal,
            percentage: percentage(log.count, log.goal),
            completed: completed(log.count, log.goal),
        }
    }

    pub fn empty(date: String, goal: u32) -> Self {
        Self {
            date,
            count: 0,
            goal,
            percentage: 0,
            completed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_stays_within_bounds() {
        for goal in 0..=20 {
            for count in 0..=50 {
                let pct = percentage(count, goal);
                assert!(pct <= 100, "count={count} goal={goal} pct={pct}");
            }
        }
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(30, 8), 100);
        assert_eq!(percentage(3, 8), 38);
        assert_eq!(percentage(1, 3), 33);
    }

    #[test]
    fn completed_iff_count_reaches_goal() {
        for goal in 1..=20 {
            for count in 0..=25 {
                assert_eq!(completed(count, goal), count >= goal);
            }
        }
        assert!(completed(8, 8));
        assert!(!completed(7, 8));
    }

    #[test]
    fn remaining_floors_at_zero() {
        assert_eq!(remaining(3, 8), 5);
        assert_eq!(remaining(8, 8), 0);
        assert_eq!(remaining(12, 8), 0);
    }

    #[test]
    fn goal_bounds_are_enforced_after_rounding() {
        for goal in 1..=20 {
            assert_eq!(validate_goal(f64::from(goal)).unwrap(), goal);
        }
        assert_eq!(validate_goal(7.6).unwrap(), 8);
        assert_eq!(validate_goal(0.6).unwrap(), 1);
        assert!(validate_goal(0.0).is_err());
        assert!(validate_goal(0.4).is_err());
        assert!(validate_goal(21.0).is_err());
        assert!(validate_goal(-3.0).is_err());
        assert!(validate_goal(f64::NAN).is_err());
        assert!(validate_goal(f64::INFINITY).is_err());
    }

    #[test]
    fn count_rejects_negatives_and_rounds() {
        assert_eq!(validate_count(0.0).unwrap(), 0);
        assert_eq!(validate_count(4.5).unwrap(), 5);
        assert_eq!(validate_count(4.4).unwrap(), 4);
        assert!(validate_count(-1.0).is_err());
        assert!(validate_count(-0.2).is_err());
        assert!(validate_count(f64::NAN).is_err());
        assert!(validate_count(1e12).is_err());
        assert_eq!(validate_count(f64::from(u32::MAX)).unwrap(), u32::MAX);
    }

    #[test]
    fn date_keys_must_be_strict() {
        let date = parse_date_key("2026-02-28").unwrap();
        assert_eq!(date_key(date), "2026-02-28");
        assert!(parse_date_key("2026-2-28").is_err());
        assert!(parse_date_key("2026/02/28").is_err());
        assert!(parse_date_key("2026-02-30").is_err());
        assert!(parse_date_key("20260228").is_err());
        assert!(parse_date_key("").is_err());
    }

    #[test]
    fn progress_derives_all_fields() {
        let progress = WaterProgress::new("2026-01-05".into(), 8, 8);
        assert_eq!(progress.percentage, 100);
        assert_eq!(progress.remaining, 0);
        assert!(progress.completed);
    }
}
