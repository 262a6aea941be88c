use crate::error::AppError;
use crate::models::{RoleFlags, SessionContext};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLES_HEADER: &str = "x-user-roles";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// 从请求头构建会话上下文
#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = header(&parts.headers, AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("bearer token required".into()))?;
        let user_id = header(&parts.headers, USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("X-User-Id required".into()))?;
        let roles = header(&parts.headers, ROLES_HEADER)
            .map(RoleFlags::parse)
            .unwrap_or_default();

        Ok(SessionContext {
            token: token.to_string(),
            user_id: user_id.to_string(),
            roles,
        })
    }
}
