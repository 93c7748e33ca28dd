use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreateNotificationRequest, MessageResponse};
use crate::error::{AppError, AppResult};
use crate::models::notification::{NewNotification, Notification};
use crate::AppState;

pub async fn create_notification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateNotificationRequest>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    body.validate()?;

    let notification = state
        .notifications
        .create(NewNotification {
            user_id: auth_user.id,
            title: body.title.trim().to_string(),
            body: body.body.trim().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn list_unread(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state.notifications.list_unread(auth_user.id).await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if !state
        .notifications
        .mark_read(auth_user.id, notification_id)
        .await?
    {
        return Err(AppError::NotFound("Notification not found".into()));
    }

    Ok(Json(MessageResponse {
        message: "Notification marked as read".into(),
    }))
}
