//! Registration and login handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::{ApiState, Caller};
use crate::auth;
use crate::error::ApiError;
use crate::models::{NewMember, Role};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub message: String,
}

/// Create a member account. New registrations start unapproved and cannot
/// log in until an admin accepts them.
pub async fn register(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidInput("Missing fields".into()));
    }

    let password_hash =
        auth::hash_password(&req.password).map_err(|e| ApiError::Internal(e.into()))?;

    let id = state
        .store
        .insert_member(&NewMember {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash,
            role: Role::Member,
            approved: false,
        })
        .await?;

    Ok(Json(RegisterResponse {
        id,
        message: "Registration successful. Waiting for admin approval.".into(),
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub username: String,
}

/// Exchange credentials for a bearer token. Unapproved accounts get the
/// pending-approval error rather than a token.
pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidInput("Missing fields".into()));
    }

    // Identical error for unknown email and wrong password.
    let member = state
        .store
        .member_by_email(req.email.trim())
        .await?
        .ok_or_else(|| ApiError::InvalidInput("Invalid credentials".into()))?;

    let ok = auth::verify_password(&req.password, &member.password_hash)
        .map_err(|e| ApiError::Internal(e.into()))?;
    if !ok {
        return Err(ApiError::InvalidInput("Invalid credentials".into()));
    }

    if !member.approved {
        return Err(ApiError::PendingApproval);
    }

    let token = state
        .tokens
        .issue(member.id, member.role)
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Json(LoginResponse {
        token,
        role: member.role,
        username: member.username,
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub role: Role,
}

/// Identity echo for the frontend.
pub async fn me(caller: Caller) -> Json<MeResponse> {
    Json(MeResponse {
        id: caller.member_id,
        role: caller.role,
    })
}
