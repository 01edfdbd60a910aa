//! Password hashing and bearer-token handling.
//!
//! Tokens are HS256 JWTs carrying the member id and role; verification
//! yields [`Claims`] which the API layer resolves into a full `Caller`
//! against the membership store.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;

/// Token lifetime, matching the original 7-day expiry.
const TOKEN_TTL_DAYS: i64 = 7;

/// Auth errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),
}

/// JWT payload: subject member id, role, expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for a member.
    pub fn issue(&self, member_id: i64, role: Role) -> Result<String, AuthError> {
        let claims = Claims {
            sub: member_id,
            role,
            exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a token and return its claims. Expired or tampered tokens
    /// fail here.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Check a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    Ok(bcrypt::verify(password, hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify_round_trip() {
        let keys = TokenKeys::new("test-secret");
        let token = keys.issue(42, Role::Member).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Member);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn wrong_secret_rejected() {
        let keys = TokenKeys::new("secret-a");
        let token = keys.issue(1, Role::Admin).unwrap();

        let other = TokenKeys::new("secret-b");
        assert!(matches!(other.verify(&token), Err(AuthError::Token(_))));
    }

    #[test]
    fn garbage_token_rejected() {
        let keys = TokenKeys::new("secret");
        assert!(keys.verify("not-a-jwt").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }
}
