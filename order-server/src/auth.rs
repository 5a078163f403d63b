use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use models::{Role, User};

use crate::error::AppError;
use crate::state::AppState;

/// The user behind the request's `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn require_role(&self, role: Role, action: &str) -> Result<(), AppError> {
        if self.0.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("only {role}s can {action}")))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let user = boost_db::find_user_by_token(&state.db_pool, token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid or revoked token".to_string()))?;

        tracing::debug!(user_id = user.id, role = %user.role, "authenticated");
        Ok(Self(user))
    }
}
