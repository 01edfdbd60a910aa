//! Request authorization.
//!
//! The bearer token is resolved once per request into a [`Caller`] carrying
//! identity, role, and approval state; handlers then assert the policy they
//! need (`require_admin`, `require_approved`) instead of stacking
//! middleware.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::error::ApiError;
use crate::models::Role;

use super::ApiState;

/// The authenticated principal behind a request. Role and approval come
/// from the membership store, not the token, so revocations and approvals
/// take effect immediately.
#[derive(Debug, Clone)]
pub struct Caller {
    pub member_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub approved: bool,
}

impl Caller {
    /// Admin-gated routes.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role != Role::Admin {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }

    /// Borrow-related member routes: any valid identity, but only after an
    /// admin has accepted the registration.
    pub fn require_approved(&self) -> Result<(), ApiError> {
        if !self.approved {
            return Err(ApiError::PendingApproval);
        }
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("Unauthorized".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthenticated("Unauthorized".into()))?;

        let claims = state
            .tokens
            .verify(token)
            .map_err(|_| ApiError::Unauthenticated("Invalid token".into()))?;

        let member = state
            .store
            .member_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthenticated("User not found".into()))?;

        Ok(Caller {
            member_id: member.id,
            username: member.username,
            email: member.email,
            role: member.role,
            approved: member.approved,
        })
    }
}
