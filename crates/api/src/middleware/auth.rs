//! Authentication middleware for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::{AppState, error::ApiError};
use khata_shared::{AppError, JwtError, OwnerKey};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Resolves the subject to an owner key
/// 4. Stores the authenticated user in request extensions for handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return unauthorized(
            "MISSING_TOKEN",
            "Authorization header with Bearer token is required",
        );
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => return unauthorized("TOKEN_EXPIRED", "Token has expired"),
        Err(e) => {
            debug!(error = %e, "Rejected bearer token");
            return unauthorized("INVALID_TOKEN", "Invalid or malformed token");
        }
    };

    let owner = match claims.owner_key() {
        Ok(owner) => owner,
        Err(e) => {
            debug!(error = %e, "Token subject is not an owner key");
            return unauthorized("INVALID_SUBJECT", "Token subject is not a valid email");
        }
    };

    request.extensions_mut().insert(AuthUser { owner });
    next.run(request).await
}

/// Extractor for the authenticated owner.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let owner = auth.owner_key();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    owner: OwnerKey,
}

impl AuthUser {
    /// Returns the owner whose documents this request may touch.
    #[must_use]
    pub const fn owner_key(&self) -> &OwnerKey {
        &self.owner
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            ApiError(AppError::Unauthorized(
                "no authenticated owner on this request".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn test_auth_user_without_middleware_is_unauthorized() {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.0.status_code(), 401);
        assert_eq!(err.0.error_code(), "UNAUTHORIZED");
    }
}
