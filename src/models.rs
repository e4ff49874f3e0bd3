use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const DEFAULT_WATER_GOAL: u32 = 8;
pub const MIN_WATER_GOAL: u32 = 1;
pub const MAX_WATER_GOAL: u32 = 20;

/// Snapshot of today's log kept on the user record. Never authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentWater {
    pub date: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub water_goal: Option<u32>,
    #[serde(default)]
    pub current_water: Option<CurrentWater>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: Option<String>, water_goal: Option<u32>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            water_goal,
            current_water: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The goal new daily logs start from.
    pub fn standing_goal(&self) -> u32 {
        self.water_goal.unwrap_or(DEFAULT_WATER_GOAL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyWaterLog {
    pub user: Uuid,
    pub date: String,
    pub count: u32,
    pub goal: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyWaterLog {
    pub fn new(user: Uuid, date: String, goal: u32) -> Self {
        let now = Utc::now();
        Self {
            user,
            date,
            count: 0,
            goal,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Everything the service persists, keyed so that a (user, date) pair can
/// hold at most one log.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub users: BTreeMap<Uuid, User>,
    #[serde(default)]
    pub water_logs: BTreeMap<Uuid, BTreeMap<String, DailyWaterLog>>,
}

#[derive(Debug, Deserialize)]
pub struct SetGoalRequest {
    pub goal: f64,
}

#[derive(Debug, Deserialize)]
pub struct SetCountRequest {
    pub count: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: Option<String>,
    pub water_goal: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterGoalResponse {
    pub water_goal: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WaterProgress {
    pub date: String,
    pub count: u32,
    pub goal: u32,
    pub percentage: u32,
    pub remaining: u32,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct DateLookupResponse {
    #[serde(flatten)]
    pub progress: WaterProgress,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: String,
    pub count: u32,
    pub goal: u32,
    pub percentage: u32,
    pub completed: bool,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_days: u32,
    pub days_with_data: u32,
    pub completed_days: u32,
    pub completion_rate: u32,
    pub total_glasses: u64,
    pub average_per_day: f64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
    pub summary: HistorySummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub water_goal: u32,
    pub current_water: Option<CurrentWater>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            water_goal: user.standing_goal(),
            id: user.id,
            name: user.name,
            email: user.email,
            current_water: user.current_water,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub token: String,
}
