//! Water intake operations behind the `/api/water` routes.
//!
//! Every mutation works on today's log only, creating it on first touch, and
//! then schedules the `currentWater` mirror without waiting for it.

use crate::errors::{AppError, AppResult};
use crate::history::{build_history, resolve_window};
use crate::models::{
    DailyWaterLog, DateLookupResponse, HistoryQuery, HistoryResponse, User, WaterGoalResponse,
    WaterProgress,
};
use crate::progress::{date_key, parse_date_key, today, validate_count, validate_goal};
use crate::state::AppState;
use crate::storage::Store;
use crate::sync::spawn_current_water_sync;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountChange {
    Increment,
    Decrement,
    Set(u32),
}

impl CountChange {
    pub fn apply(self, count: u32) -> u32 {
        match self {
            Self::Increment => count.saturating_add(1),
            Self::Decrement => count.saturating_sub(1),
            Self::Set(value) => value,
        }
    }
}

pub async fn load_user(store: &Store, user_id: Uuid) -> AppResult<User> {
    store
        .find_user(user_id)
        .await
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn get_or_create_today_log(
    store: &Store,
    user_id: Uuid,
    fallback_goal: Option<u32>,
) -> AppResult<DailyWaterLog> {
    let date = date_key(today());
    Ok(store.get_or_create_log(user_id, &date, fallback_goal).await?)
}

pub async fn get_goal(state: &AppState, user_id: Uuid) -> AppResult<WaterGoalResponse> {
    let user = load_user(&state.store, user_id).await?;
    Ok(WaterGoalResponse {
        water_goal: user.standing_goal(),
    })
}

pub async fn set_goal(state: &AppState, user_id: Uuid, requested: f64) -> AppResult<WaterGoalResponse> {
    let goal = validate_goal(requested)?;
    let date = date_key(today());
    let user = state
        .store
        .set_water_goal(user_id, goal, &date)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    info!(%user_id, goal, "water goal updated");
    Ok(WaterGoalResponse {
        water_goal: user.standing_goal(),
    })
}

pub async fn today_progress(state: &AppState, user_id: Uuid) -> AppResult<WaterProgress> {
    let user = load_user(&state.store, user_id).await?;
    let log = get_or_create_today_log(&state.store, user_id, user.water_goal).await?;
    Ok(WaterProgress::from(&log))
}

pub async fn drink(state: &AppState, user_id: Uuid) -> AppResult<WaterProgress> {
    apply_change(state, user_id, CountChange::Increment).await
}

pub async fn undo_drink(state: &AppState, user_id: Uuid) -> AppResult<WaterProgress> {
    apply_change(state, user_id, CountChange::Decrement).await
}

pub async fn set_today(state: &AppState, user_id: Uuid, requested: f64) -> AppResult<WaterProgress> {
    let count = validate_count(requested)?;
    apply_change(state, user_id, CountChange::Set(count)).await
}

async fn apply_change(
    state: &AppState,
    user_id: Uuid,
    change: CountChange,
) -> AppResult<WaterProgress> {
    let user = load_user(&state.store, user_id).await?;
    let date = date_key(today());
    let log = state
        .store
        .update_log_count(user_id, &date, user.water_goal, |count| change.apply(count))
        .await?;

    spawn_current_water_sync(state.store.clone(), user_id, &log);
    Ok(WaterProgress::from(&log))
}

pub async fn history(
    state: &AppState,
    user_id: Uuid,
    query: &HistoryQuery,
) -> AppResult<HistoryResponse> {
    let window = resolve_window(query, today())?;
    let user = load_user(&state.store, user_id).await?;
    let logs = state
        .store
        .logs_between(user_id, &window.start_key(), &window.end_key())
        .await;
    Ok(build_history(window, &logs, user.standing_goal()))
}

/// Read-only: a missing log yields a zero record and is never created.
pub async fn by_date(state: &AppState, user_id: Uuid, raw_date: &str) -> AppResult<DateLookupResponse> {
    let date = date_key(parse_date_key(raw_date)?);
    let user = load_user(&state.store, user_id).await?;

    let response = match state.store.find_log(user_id, &date).await {
        Some(log) => DateLookupResponse {
            progress: WaterProgress::from(&log),
            exists: true,
        },
        None => DateLookupResponse {
            progress: WaterProgress::new(date, 0, user.standing_goal()),
            exists: false,
        },
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::tests::temp_data_path;

    async fn state_with_user(goal: Option<u32>) -> (AppState, Uuid) {
        let store = Store::open(temp_data_path()).await;
        let user = store
            .insert_user(User::new("Grace".into(), None, goal))
            .await
            .unwrap();
        (AppState::new(Config::default(), store), user.id)
    }

    #[test]
    fn count_changes_floor_at_zero() {
        assert_eq!(CountChange::Increment.apply(0), 1);
        assert_eq!(CountChange::Decrement.apply(1), 0);
        assert_eq!(CountChange::Decrement.apply(0), 0);
        assert_eq!(CountChange::Set(5).apply(9), 5);
        assert_eq!(CountChange::Increment.apply(u32::MAX), u32::MAX);
    }

    #[tokio::test]
    async fn goal_round_trips_for_every_valid_value() {
        let (state, user_id) = state_with_user(None).await;
        assert_eq!(get_goal(&state, user_id).await.unwrap().water_goal, 8);
        for goal in 1..=20 {
            set_goal(&state, user_id, f64::from(goal)).await.unwrap();
            assert_eq!(get_goal(&state, user_id).await.unwrap().water_goal, goal);
        }
        assert!(matches!(set_goal(&state, user_id, 0.0).await, Err(AppError::Validation(_))));
        assert!(matches!(set_goal(&state, user_id, 21.0).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn goal_change_updates_todays_log() {
        let (state, user_id) = state_with_user(None).await;
        today_progress(&state, user_id).await.unwrap();
        set_goal(&state, user_id, 4.0).await.unwrap();
        let progress = today_progress(&state, user_id).await.unwrap();
        assert_eq!(progress.goal, 4);
    }

    #[tokio::test]
    async fn drink_then_undo_restores_count() {
        let (state, user_id) = state_with_user(None).await;
        let before = today_progress(&state, user_id).await.unwrap();
        assert_eq!(before.count, 0);

        assert_eq!(drink(&state, user_id).await.unwrap().count, 1);
        assert_eq!(undo_drink(&state, user_id).await.unwrap().count, 0);
        assert_eq!(undo_drink(&state, user_id).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn eight_drinks_complete_a_goal_of_eight() {
        let (state, user_id) = state_with_user(Some(8)).await;
        let mut progress = today_progress(&state, user_id).await.unwrap();
        for _ in 0..8 {
            assert!(!progress.completed);
            progress = drink(&state, user_id).await.unwrap();
        }
        assert_eq!(progress.count, 8);
        assert!(progress.completed);
        assert_eq!(progress.percentage, 100);
        assert_eq!(progress.remaining, 0);

        let progress = drink(&state, user_id).await.unwrap();
        assert_eq!(progress.count, 9);
        assert_eq!(progress.percentage, 100);
    }

    #[tokio::test]
    async fn set_today_is_visible_on_read() {
        let (state, user_id) = state_with_user(Some(10)).await;
        set_today(&state, user_id, 5.0).await.unwrap();
        let progress = today_progress(&state, user_id).await.unwrap();
        assert_eq!(progress.count, 5);
        assert_eq!(progress.percentage, 50);
        assert_eq!(progress.remaining, 5);
        assert!(!progress.completed);

        assert!(matches!(set_today(&state, user_id, -1.0).await, Err(AppError::Validation(_))));
        assert_eq!(today_progress(&state, user_id).await.unwrap().count, 5);
    }

    #[tokio::test]
    async fn date_lookup_never_creates_logs() {
        let (state, user_id) = state_with_user(Some(6)).await;
        let lookup = by_date(&state, user_id, "2020-02-29").await.unwrap();
        assert!(!lookup.exists);
        assert_eq!(lookup.progress.count, 0);
        assert_eq!(lookup.progress.goal, 6);
        assert_eq!(lookup.progress.date, "2020-02-29");

        let query = HistoryQuery {
            start_date: Some("2020-02-29".into()),
            end_date: Some("2020-02-29".into()),
            days: None,
        };
        let report = history(&state, user_id, &query).await.unwrap();
        assert_eq!(report.summary.days_with_data, 0);
        assert!(state.store.find_log(user_id, "2020-02-29").await.is_none());

        assert!(matches!(
            by_date(&state, user_id, "29-02-2020").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn date_lookup_reports_existing_logs() {
        let (state, user_id) = state_with_user(None).await;
        drink(&state, user_id).await.unwrap();
        let key = date_key(today());
        let lookup = by_date(&state, user_id, &key).await.unwrap();
        assert!(lookup.exists);
        assert_eq!(lookup.progress.count, 1);
    }

    #[tokio::test]
    async fn history_includes_today() {
        let (state, user_id) = state_with_user(None).await;
        set_today(&state, user_id, 3.0).await.unwrap();
        let report = history(&state, user_id, &HistoryQuery::default()).await.unwrap();
        assert_eq!(report.history.len(), 30);
        assert_eq!(report.summary.days_with_data, 1);
        assert_eq!(report.summary.total_glasses, 3);
        assert_eq!(report.summary.average_per_day, 3.0);
        assert_eq!(report.history.last().unwrap().date, date_key(today()));
    }

    #[tokio::test]
    async fn mutations_mirror_onto_user() {
        let (state, user_id) = state_with_user(None).await;
        let log = state
            .store
            .update_log_count(user_id, &date_key(today()), None, |count| count + 2)
            .await
            .unwrap();
        spawn_current_water_sync(state.store.clone(), user_id, &log)
            .await
            .unwrap();

        let user = state.store.find_user(user_id).await.unwrap();
        let current = user.current_water.unwrap();
        assert_eq!(current.count, 2);
        assert_eq!(current.date, date_key(today()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_drinks_lose_no_increments() {
        let (state, user_id) = state_with_user(None).await;
        let tasks: Vec<_> = (0..25)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move { drink(&state, user_id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(today_progress(&state, user_id).await.unwrap().count, 25);
        let logs = state
            .store
            .logs_between(user_id, &date_key(today()), &date_key(today()))
            .await;
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (state, _) = state_with_user(None).await;
        let stranger = Uuid::new_v4();
        assert!(matches!(get_goal(&state, stranger).await, Err(AppError::NotFound(_))));
        assert!(matches!(drink(&state, stranger).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            history(&state, stranger, &HistoryQuery::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(state.store.find_log(stranger, &date_key(today())).await.is_none());
    }
}
