use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{
    DailyLogQuery, LogDetailsQuery, SubmitMoodRequest, SubmitSatisfactionRequest,
    UpdateTrackerRequest,
};
use crate::error::AppResult;
use crate::models::daily_log::DailyLog;
use crate::services::daily_logs::{LogDetails, TrackedLog};
use crate::services::insights::{LabeledLog, WeeklyMoodSummary};
use crate::AppState;

pub async fn submit_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<SubmitMoodRequest>,
) -> AppResult<(StatusCode, Json<DailyLog>)> {
    body.validate()?;

    let log = state
        .daily_logs
        .submit_mood(auth_user.id, body.mood.as_deref(), body.thoughts)
        .await?;

    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn submit_satisfaction(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(log_id): Path<Uuid>,
    Json(body): Json<SubmitSatisfactionRequest>,
) -> AppResult<Json<DailyLog>> {
    let log = state
        .daily_logs
        .submit_satisfaction(auth_user.id, log_id, body.satisfaction.as_deref())
        .await?;

    Ok(Json(log))
}

pub async fn update_tracker(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(log_id): Path<Uuid>,
    Json(body): Json<UpdateTrackerRequest>,
) -> AppResult<Json<TrackedLog>> {
    body.validate()?;

    let log = state
        .daily_logs
        .update_tracker(auth_user.id, log_id, body.into())
        .await?;

    Ok(Json(log))
}

pub async fn weekly_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<LabeledLog>>> {
    let logs = state.insights.weekly_labeled_logs(auth_user.id).await?;
    Ok(Json(logs))
}

/// `null` when the user logged no mood in the last week.
pub async fn weekly_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Option<WeeklyMoodSummary>>> {
    let summary = state.insights.weekly_mode_summary(auth_user.id).await?;
    Ok(Json(summary))
}

pub async fn log_details(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<LogDetailsQuery>,
) -> AppResult<Json<LogDetails>> {
    let details = state
        .daily_logs
        .log_details(auth_user.id, query.lookup()?)
        .await?;

    Ok(Json(details))
}

pub async fn list_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DailyLogQuery>,
) -> AppResult<Json<Vec<DailyLog>>> {
    let range = query.range(state.daily_logs.window())?;
    let logs = state.daily_logs.list_logs(auth_user.id, range).await?;
    Ok(Json(logs))
}
