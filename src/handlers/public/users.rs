// POST /api/users - register a new account

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{Map, Value};

use crate::auth::hash_password;
use crate::database::models::{NewUser, PublicUser};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::input::json_object;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const REQUIRED_FIELDS: [&str; 2] = ["username", "password"];
const STRING_FIELDS: [&str; 3] = ["username", "password", "fullname"];
const TRIMMED_FIELDS: [&str; 2] = ["username", "password"];

const USERNAME_MIN: usize = 1;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 72;

/// Registration fields that passed every rule
#[derive(Debug, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub fullname: Option<String>,
}

/// Apply the registration rules in order; the first failure is reported.
pub fn validate_registration(body: &Map<String, Value>) -> Result<Registration, ApiError> {
    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !body.contains_key(**f)) {
        return Err(ApiError::field_error(*field, "Missing field"));
    }

    if let Some(field) = STRING_FIELDS
        .iter()
        .find(|f| body.get(**f).is_some_and(|v| !v.is_string()))
    {
        return Err(ApiError::field_error(*field, "Incorrect field type: expected string"));
    }

    let text = |field: &str| body.get(field).and_then(Value::as_str).unwrap_or_default().to_string();
    let username = text("username");
    let password = text("password");

    if let Some(field) = TRIMMED_FIELDS.iter().find(|f| {
        let value = if **f == "username" { &username } else { &password };
        value.trim() != value
    }) {
        return Err(ApiError::field_error(*field, "Cannot start or end with whitespace"));
    }

    if username.chars().count() < USERNAME_MIN {
        return Err(ApiError::field_error(
            "username",
            format!("Must be at least {} characters long", USERNAME_MIN),
        ));
    }

    if password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::field_error(
            "password",
            format!("Must be at least {} characters long", PASSWORD_MIN),
        ));
    }
    // bcrypt reads at most 72 bytes, so the upper bound is in bytes
    if password.len() > PASSWORD_MAX {
        return Err(ApiError::field_error(
            "password",
            format!("Must be at most {} characters long", PASSWORD_MAX),
        ));
    }

    Ok(Registration {
        username,
        password,
        fullname: body.get("fullname").and_then(Value::as_str).map(str::to_string),
    })
}

/// POST /api/users
///
/// Body: `{ "username": string, "password": string, "fullname"?: string }`.
/// Responds 201 with the sanitized user and `Location: /api/users/{id}`.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<PublicUser> {
    let body = json_object(body)?;
    let registration = validate_registration(&body).map_err(|e| {
        tracing::debug!("Registration rejected: {}", e);
        e
    })?;

    let password_hash = hash_password(registration.password, state.security().bcrypt_cost).await?;

    let user = state
        .store
        .users
        .insert(NewUser {
            username: registration.username,
            password_hash,
            fullname: registration.fullname,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::UniqueViolation(_) => ApiError::duplicate_key("The username already exists"),
            other => other.into(),
        })?;

    tracing::info!("Registered user '{}' ({})", user.username, user.id);

    let location = format!("/api/users/{}", user.id);
    Ok(ApiResponse::created(PublicUser::from(&user), location))
}
