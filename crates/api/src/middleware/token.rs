//! # 租户 Token 提取
//!
//! 每个请求通过 `X-Manager-Token` 头携带租户 Token。
//! Token 是否已配置由 `SessionRegistry` 判定，这里只负责把它从请求头中取出。

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// 租户 Token 请求头
pub const TOKEN_HEADER: &str = "x-manager-token";

/// 缺少 Token 与未知 Token 对调用方给出同一条提示
pub const MISSING_TOKEN_MESSAGE: &str = "ManagerToken not found, check token";

/// 当前请求的租户 Token
#[derive(Debug, Clone)]
pub struct ManagerToken(pub String);

impl<S> FromRequestParts<S> for ManagerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                tracing::warn!(path = %parts.uri.path(), "missing manager token header");
                ApiError::Unauthorized(MISSING_TOKEN_MESSAGE.to_string())
            })?;
        Ok(ManagerToken(token.to_string()))
    }
}
