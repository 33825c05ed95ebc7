//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if e.to_string().contains("ExpiredSignature") {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

/// Rejects with 403 unless the user carries the required role
pub fn require_role(claims: &Claims, required_role: &str) -> Result<(), ApiError> {
    if has_role(claims, required_role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Missing required role: {required_role}"
        )))
    }
}

/// Permission definitions
pub mod permissions {
    pub const INVOICE_READ: &str = "invoice:read";
    pub const PAYMENT_WRITE: &str = "payment:write";
    pub const PAYMENT_REVERSE: &str = "payment:reverse";
    pub const UTILITY_READ: &str = "utility:read";
    pub const UTILITY_WRITE: &str = "utility:write";
    pub const UTILITY_POST: &str = "utility:post";
    pub const READING_WRITE: &str = "reading:write";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_preserves_claims() {
        let token = create_token("user-1", vec!["payment:write".into()], "secret", 60).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(has_role(&claims, "payment:write"));
        assert!(!has_role(&claims, "payment:reverse"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("user-1", vec![], "secret", 60).unwrap();
        assert!(validate_token(&token, "other").is_err());
    }

    #[test]
    fn admin_passes_any_role_check() {
        let token = create_token("ops", vec!["admin".into()], "secret", 60).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert!(require_role(&claims, permissions::UTILITY_POST).is_ok());
    }
}
