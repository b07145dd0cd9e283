// handlers/protected/auth/refresh.rs - POST /api/refresh

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::auth::issue_token;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Reissue a token for the caller with a fresh expiry
pub async fn refresh(State(state): State<AppState>, Extension(auth_user): Extension<AuthUser>) -> ApiResult<Value> {
    let token = issue_token(auth_user.profile(), state.security())?;
    tracing::debug!("Refreshed token for '{}'", auth_user.username);

    Ok(ApiResponse::success(json!({ "authToken": token })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::auth::validate_jwt;
    use crate::config::AppConfig;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn refresh_issues_a_new_valid_token() {
        let ctx = TestContext::new();
        let token = ctx.signed_up("alice").await;

        let res = ctx.request(Method::POST, "/api/refresh", Some(&token), None).await;

        assert_eq!(res.status, StatusCode::OK);
        let fresh = res.body["authToken"].as_str().unwrap();
        let claims = validate_jwt(fresh, &AppConfig::testing().security).unwrap();
        assert_eq!(claims.user.username, "alice");
    }

    #[tokio::test]
    async fn refresh_requires_a_token() {
        let ctx = TestContext::new();

        let missing = ctx.request(Method::POST, "/api/refresh", None, None).await;
        let forged = ctx.request(Method::POST, "/api/refresh", Some("not.a.token"), None).await;

        assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
        assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    }
}
