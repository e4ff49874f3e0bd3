use crate::auth::{issue_token, AuthUser};
use crate::errors::{AppError, AppResult};
use crate::models::{
    DateLookupResponse, HistoryQuery, HistoryResponse, RegisterRequest, RegisterResponse,
    SetCountRequest, SetGoalRequest, User, UserProfile, WaterGoalResponse, WaterProgress,
};
use crate::progress::validate_goal;
use crate::state::AppState;
use crate::water;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(body) = payload?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Name is required"));
    }
    let water_goal = body.water_goal.map(validate_goal).transpose()?;
    let email = body
        .email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty());

    let user = state
        .store
        .insert_user(User::new(name.to_string(), email, water_goal))
        .await?;
    let token = issue_token(user.id, &state.config)?;
    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            token,
        }),
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = water::load_user(&state.store, auth_user.id).await?;
    Ok(Json(user.into()))
}

pub async fn get_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<WaterGoalResponse>> {
    Ok(Json(water::get_goal(&state, auth_user.id).await?))
}

pub async fn set_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<SetGoalRequest>, JsonRejection>,
) -> AppResult<Json<WaterGoalResponse>> {
    let Json(body) = payload?;
    Ok(Json(water::set_goal(&state, auth_user.id, body.goal).await?))
}

pub async fn get_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<WaterProgress>> {
    Ok(Json(water::today_progress(&state, auth_user.id).await?))
}

pub async fn set_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<SetCountRequest>, JsonRejection>,
) -> AppResult<Json<WaterProgress>> {
    let Json(body) = payload?;
    Ok(Json(water::set_today(&state, auth_user.id, body.count).await?))
}

pub async fn drink(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<WaterProgress>> {
    Ok(Json(water::drink(&state, auth_user.id).await?))
}

pub async fn undo_drink(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<WaterProgress>> {
    Ok(Json(water::undo_drink(&state, auth_user.id).await?))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<Json<HistoryResponse>> {
    let Query(query) = query?;
    Ok(Json(water::history(&state, auth_user.id, &query).await?))
}

pub async fn get_by_date(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    date: Result<Path<String>, PathRejection>,
) -> AppResult<Json<DateLookupResponse>> {
    let Path(date) = date?;
    Ok(Json(water::by_date(&state, auth_user.id, &date).await?))
}
