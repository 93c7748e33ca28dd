use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::jwt::{verify_token, TokenType};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let token_data = verify_token(token, &state.config)?;

    if token_data.claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized);
    }

    let auth_user = AuthUser {
        id: token_data.claims.sub,
    };

    // Provisions the user's row on first sight and feeds the reminder sweep.
    // A failed stamp is retried by the next request.
    let email = Some(token_data.claims.email.as_str()).filter(|e| !e.is_empty());
    if let Err(e) = state
        .users
        .record_activity(auth_user.id, email, chrono::Utc::now())
        .await
    {
        tracing::warn!(user_id = %auth_user.id, error = %e, "Failed to update last activity");
    }

    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}
