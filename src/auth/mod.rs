use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod password;

pub use password::{hash_password, verify_password};

/// Payload carried by every bearer token. The gate middleware only inspects
/// `username` and `is_admin`; the timestamps belong to the token lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(username: impl Into<String>, is_admin: bool, ttl_hours: u64) -> Self {
        let now = Utc::now();

        Self {
            username: username.into(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + Duration::hours(ttl_hours as i64)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("token generation failed: {0}")]
    Generation(String),

    #[error("token verification failed: {0}")]
    Verification(String),
}

/// Sign a token for the given claims with an explicitly supplied secret.
pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::Generation(e.to_string()))
}

/// Verify a token's signature and expiry and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| JwtError::Verification(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn sign_and_verify_round_trip() {
        let claims = Claims::new("u1", false, 1);
        let token = sign_token(&claims, SECRET).unwrap();

        let decoded = verify_token(&token, SECRET).unwrap();
        assert_eq!(decoded.username, "u1");
        assert!(!decoded.is_admin);
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = sign_token(&Claims::new("u1", true, 1), SECRET).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(JwtError::Verification(_))
        ));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            username: "u1".to_string(),
            is_admin: false,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = sign_token(&claims, SECRET).unwrap();
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(JwtError::Verification(_))
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(verify_token("not-a-token", SECRET).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            sign_token(&Claims::new("u1", false, 1), ""),
            Err(JwtError::MissingSecret)
        ));
    }
}
