use crate::models::{AppData, CurrentWater, DailyWaterLog, User, DEFAULT_WATER_GOAL};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode data file: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("user {0} does not exist")]
    UnknownUser(Uuid),
}

/// JSON-file backed store. The whole dataset lives behind one lock, so every
/// read-modify-write of a log is serialized.
pub struct Store {
    path: PathBuf,
    data: Mutex<AppData>,
}

impl Store {
    pub fn new(path: PathBuf, data: AppData) -> Self {
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self::new(path, data)
    }

    pub async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut data = self.data.lock().await;
        data.users.insert(user.id, user.clone());
        if let Err(err) = persist_data(&self.path, &data).await {
            data.users.remove(&user.id);
            return Err(err);
        }
        Ok(user)
    }

    pub async fn find_user(&self, user_id: Uuid) -> Option<User> {
        self.data.lock().await.users.get(&user_id).cloned()
    }

    /// Updates the standing goal and, if a log for `today` already exists,
    /// that log's goal. Returns `None` when the user is unknown.
    pub async fn set_water_goal(
        &self,
        user_id: Uuid,
        goal: u32,
        today: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut data = self.data.lock().await;
        let Some(user) = data.users.get_mut(&user_id) else {
            return Ok(None);
        };
        let previous_user = user.clone();
        user.water_goal = Some(goal);
        user.updated_at = Utc::now();
        let updated = user.clone();

        let previous_log = match data
            .water_logs
            .get_mut(&user_id)
            .and_then(|logs| logs.get_mut(today))
        {
            Some(log) => {
                let previous = log.clone();
                log.goal = goal;
                log.updated_at = Utc::now();
                Some(previous)
            }
            None => None,
        };

        if let Err(err) = persist_data(&self.path, &data).await {
            data.users.insert(user_id, previous_user);
            if let Some(log) = previous_log {
                restore_log(&mut data, log);
            }
            return Err(err);
        }

        Ok(Some(updated))
    }

    /// Returns the log for (`user_id`, `date`), creating it with
    /// `fallback_goal` (or the default) when absent.
    pub async fn get_or_create_log(
        &self,
        user_id: Uuid,
        date: &str,
        fallback_goal: Option<u32>,
    ) -> Result<DailyWaterLog, StoreError> {
        let mut data = self.data.lock().await;
        if let Some(log) = find_in(&data, user_id, date) {
            return Ok(log.clone());
        }

        let log = DailyWaterLog::new(
            user_id,
            date.to_string(),
            fallback_goal.unwrap_or(DEFAULT_WATER_GOAL),
        );
        data.water_logs
            .entry(user_id)
            .or_default()
            .insert(log.date.clone(), log.clone());

        if let Err(err) = persist_data(&self.path, &data).await {
            remove_log(&mut data, user_id, date);
            return Err(err);
        }

        Ok(log)
    }

    /// Get-or-create followed by `change` on the count, all under one lock.
    pub async fn update_log_count<F>(
        &self,
        user_id: Uuid,
        date: &str,
        fallback_goal: Option<u32>,
        change: F,
    ) -> Result<DailyWaterLog, StoreError>
    where
        F: FnOnce(u32) -> u32,
    {
        let mut data = self.data.lock().await;
        let previous = find_in(&data, user_id, date).cloned();

        let updated = {
            let entry = data
                .water_logs
                .entry(user_id)
                .or_default()
                .entry(date.to_string())
                .or_insert_with(|| {
                    DailyWaterLog::new(
                        user_id,
                        date.to_string(),
                        fallback_goal.unwrap_or(DEFAULT_WATER_GOAL),
                    )
                });
            entry.count = change(entry.count);
            entry.updated_at = Utc::now();
            entry.clone()
        };

        if let Err(err) = persist_data(&self.path, &data).await {
            match previous {
                Some(log) => restore_log(&mut data, log),
                None => remove_log(&mut data, user_id, date),
            }
            return Err(err);
        }

        Ok(updated)
    }

    pub async fn find_log(&self, user_id: Uuid, date: &str) -> Option<DailyWaterLog> {
        let data = self.data.lock().await;
        find_in(&data, user_id, date).cloned()
    }

    /// Logs with `start <= date <= end`, ascending by date.
    pub async fn logs_between(&self, user_id: Uuid, start: &str, end: &str) -> Vec<DailyWaterLog> {
        if start > end {
            return Vec::new();
        }
        let data = self.data.lock().await;
        data.water_logs
            .get(&user_id)
            .map(|logs| {
                logs.range(start.to_string()..=end.to_string())
                    .map(|(_, log)| log.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Writes the user's `currentWater` from the log as it stands under the
    /// lock, so a late task can never restore an older count. Snapshots for a
    /// day older than the one already mirrored are dropped.
    pub async fn mirror_current_water(
        &self,
        user_id: Uuid,
        mut current: CurrentWater,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        if let Some(log) = find_in(&data, user_id, &current.date) {
            current.count = log.count;
        }
        let user = data
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UnknownUser(user_id))?;
        let stale = user
            .current_water
            .as_ref()
            .is_some_and(|mirrored| mirrored.date > current.date);
        if stale || user.current_water.as_ref() == Some(&current) {
            return Ok(());
        }
        let previous = user.current_water.replace(current);
        if let Err(err) = persist_data(&self.path, &data).await {
            if let Some(user) = data.users.get_mut(&user_id) {
                user.current_water = previous;
            }
            return Err(err);
        }
        Ok(())
    }
}

fn find_in<'a>(data: &'a AppData, user_id: Uuid, date: &str) -> Option<&'a DailyWaterLog> {
    data.water_logs.get(&user_id).and_then(|logs| logs.get(date))
}

fn restore_log(data: &mut AppData, log: DailyWaterLog) {
    data.water_logs
        .entry(log.user)
        .or_default()
        .insert(log.date.clone(), log);
}

fn remove_log(data: &mut AppData, user_id: Uuid, date: &str) {
    if let Some(logs) = data.water_logs.get_mut(&user_id) {
        logs.remove(date);
        if logs.is_empty() {
            data.water_logs.remove(&user_id);
        }
    }
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    // Replace the data file in one rename so a failed write leaves the old file intact.
    if let Err(err) = fs::write(&staging, payload).await {
        let _ = fs::remove_file(&staging).await;
        return Err(err.into());
    }
    fs::rename(&staging, path).await?;
    Ok(())
}
