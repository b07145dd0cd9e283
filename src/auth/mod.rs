use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::user::PublicUser;

pub mod password;

pub use password::{hash_password, verify_password};

/// Token payload: the sanitized user rides along as the `user` claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: PublicUser,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Fails when `expiry_hours` puts `exp` past what a timestamp can hold
    pub fn new(user: PublicUser, expiry_hours: u64) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::TokenGeneration(format!("expiry of {} hours is out of range", expiry_hours)))?;

        Ok(Self {
            sub: user.username.clone(),
            user,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("{0}")]
    InvalidToken(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Sign a fresh token for `user` using the configured expiry
pub fn issue_token(user: PublicUser, security: &SecurityConfig) -> Result<String, AuthError> {
    let claims = Claims::new(user, security.jwt_expiry_hours)?;
    generate_jwt(&claims, security)
}

/// Verify signature and expiry, returning the embedded claims
pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| AuthError::InvalidToken(format!("Invalid JWT token: {}", e)))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use uuid::Uuid;

    fn alice() -> PublicUser {
        PublicUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            fullname: Some("Alice Liddell".to_string()),
        }
    }

    #[test]
    fn issued_token_carries_user_claim() {
        let security = AppConfig::testing().security;
        let user = alice();

        let token = issue_token(user.clone(), &security).unwrap();
        let claims = validate_jwt(&token, &security).unwrap();

        assert_eq!(claims.user, user);
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let security = AppConfig::testing().security;
        let mut other = security.clone();
        other.jwt_secret = "someone-else".to_string();

        let token = issue_token(alice(), &other).unwrap();
        assert!(matches!(validate_jwt(&token, &security), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let security = AppConfig::testing().security;
        let mut claims = Claims::new(alice(), 1).unwrap();
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;

        let token = generate_jwt(&claims, &security).unwrap();
        assert!(matches!(validate_jwt(&token, &security), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn oversized_expiry_is_an_error() {
        let mut security = AppConfig::testing().security;
        security.jwt_expiry_hours = u64::MAX;
        assert!(matches!(issue_token(alice(), &security), Err(AuthError::TokenGeneration(_))));

        security.jwt_expiry_hours = i64::MAX as u64;
        assert!(matches!(issue_token(alice(), &security), Err(AuthError::TokenGeneration(_))));
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        let mut security = AppConfig::testing().security;
        security.jwt_secret.clear();

        assert!(matches!(issue_token(alice(), &security), Err(AuthError::InvalidSecret)));
    }
}
