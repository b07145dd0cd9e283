// handlers/public/auth/login.rs - POST /api/login

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crate::auth::{issue_token, verify_password};
use crate::database::models::PublicUser;
use crate::error::ApiError;
use crate::handlers::input::json_object;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Incorrect username or password";

/// POST /api/login - exchange a username and password for a bearer token
///
/// ```json
/// { "username": "alice", "password": "password1" }
/// ```
///
/// Responds `{ "authToken": "eyJhbGciOi..." }`.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_object(body)?;

    let (username, password) = match (
        body.get("username").and_then(Value::as_str),
        body.get("password").and_then(Value::as_str),
    ) {
        (Some(username), Some(password)) => (username.to_string(), password.to_string()),
        _ => return Err(ApiError::bad_request("Missing credentials")),
    };

    let Some(user) = state.store.users.find_by_username(&username).await? else {
        tracing::warn!("Login failed for unknown user '{}'", username);
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    };

    if !verify_password(password, user.password.clone()).await? {
        tracing::warn!("Login failed for '{}': password mismatch", username);
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let token = issue_token(PublicUser::from(&user), state.security())?;
    tracing::info!("User '{}' logged in", user.username);

    Ok(ApiResponse::success(json!({ "authToken": token })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::auth::validate_jwt;
    use crate::config::AppConfig;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn login_returns_token_with_user_claim() {
        let ctx = TestContext::new();
        let user = ctx.register("alice", "password1").await;

        let res = ctx
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({"username": "alice", "password": "password1"})),
            )
            .await;

        assert_eq!(res.status, StatusCode::OK);
        let token = res.body["authToken"].as_str().unwrap();
        let claims = validate_jwt(token, &AppConfig::testing().security).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user.id.to_string(), user["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_401() {
        let ctx = TestContext::new();
        ctx.register("alice", "password1").await;

        for body in [
            json!({"username": "alice", "password": "password2"}),
            json!({"username": "bob", "password": "password1"}),
        ] {
            let res = ctx.request(Method::POST, "/api/login", None, Some(body)).await;
            assert_eq!(res.status, StatusCode::UNAUTHORIZED);
            assert_eq!(res.body["message"], "Incorrect username or password");
        }
    }

    #[tokio::test]
    async fn missing_credentials_are_400() {
        let ctx = TestContext::new();

        let res = ctx
            .request(Method::POST, "/api/login", None, Some(json!({"username": "alice"})))
            .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["message"], "Missing credentials");
    }
}
