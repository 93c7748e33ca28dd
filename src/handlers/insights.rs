use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::services::insights::{MonthlyInsights, TimelinePoint};
use crate::AppState;

/// Oldest first, one point per logged day.
pub async fn seven_days(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<TimelinePoint>>> {
    let points = state.insights.seven_day_timeline(auth_user.id).await?;
    Ok(Json(points))
}

pub async fn monthly(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<MonthlyInsights>> {
    let insights = state.insights.monthly_histogram(auth_user.id).await?;
    Ok(Json(insights))
}
