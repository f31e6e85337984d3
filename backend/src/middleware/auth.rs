//! Authentication middleware
//!
//! Bearer token validation for team-scoped requests. Token issuing (login,
//! registration, invites) happens outside this service; the middleware only
//! verifies signatures and extracts the user/team identity.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorResponse;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub team_id: uuid::Uuid,
}

/// Authentication middleware that validates JWT tokens
/// Note: the token is validated inline against the secret from the
/// environment to avoid state dependency issues in `from_fn` middleware.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    // Decode and validate JWT token
    let jwt_secret = std::env::var("SPM__JWT__SECRET")
        .or_else(|_| std::env::var("SPM_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string());

    let claims = match decode_jwt(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    // Parse UUIDs from claims
    let user_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    let team_id = match uuid::Uuid::parse_str(&claims.team_id) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid team ID in token"),
    };

    // Create AuthUser and insert into request extensions
    let auth_user = AuthUser { user_id, team_id };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    team_id: String,
    exp: i64,
    iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message_en: message.to_string(),
            message_ja: "認証に失敗しました".to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: crate::error::ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message_en: "Authentication required".to_string(),
                        message_ja: "ログインが必要です".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
