use axum::{extract::FromRequestParts, http::request::Parts};
use common::Role;
use sea_orm::{ColumnTrait, Condition};

use crate::entity::student;
use crate::error::AppError;
use crate::permissions;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Permission checks happen via `require_permission()` in the handler body.
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub permissions: &'static [&'static str],
}

impl AuthUser {
    /// Returns `Ok(())` if the user has the given permission, `Err(PermissionDenied)` otherwise.
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.permissions.contains(&permission) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Returns `Ok(())` if the user has ANY of the given permissions.
    pub fn require_any_permission(&self, permissions: &[&str]) -> Result<(), AppError> {
        if permissions.iter().any(|perm| self.permissions.contains(perm)) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Filter on `student` limiting reads to the caller's own records.
    ///
    /// Students see the record linked to their account and parents see their
    /// children. `None` for every other role.
    pub fn own_students(&self) -> Option<Condition> {
        match self.role {
            Role::Student => Some(Condition::all().add(student::Column::UserId.eq(self.user_id))),
            Role::Parent => {
                Some(Condition::all().add(student::Column::ParentUserId.eq(self.user_id)))
            }
            _ => None,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;
        let role: Role = claims.role.parse().map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            username: claims.sub,
            role,
            permissions: permissions::for_role(role),
        })
    }
}
