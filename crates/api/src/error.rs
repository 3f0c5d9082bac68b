//! # API 统一错误处理
//!
//! - 业务结果的 `FailureKind` 映射到 HTTP 状态码，作为可机器判定的错误信号。
//! - 传输层自身的拒绝 (缺少 Token、请求体无法解析) 以同样的 `{code, message}` 结构返回。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mtgate_core::common::{FailureKind, OperationResult};
use thiserror::Error;

use crate::types::AckResponse;

/// API 层传输错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 缺少或无法解析租户 Token (401)
    #[error("{0}")]
    Unauthorized(String),

    /// 请求参数错误 (400)
    #[error("{0}")]
    BadRequest(String),
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        tracing::warn!(status = %status, error = %self, "request rejected");
        (status, Json(AckResponse::failure(self.to_string()))).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<axum::extract::rejection::PathRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// 业务失败分类 -> HTTP 状态码
pub fn status_for(failure: Option<FailureKind>) -> StatusCode {
    match failure {
        None => StatusCode::OK,
        Some(FailureKind::UnknownToken) => StatusCode::UNAUTHORIZED,
        Some(FailureKind::InvalidRequest) => StatusCode::BAD_REQUEST,
        Some(FailureKind::InsufficientFreeMargin) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(FailureKind::SessionUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
        Some(FailureKind::BackendOperationFailed) => StatusCode::BAD_GATEWAY,
    }
}

/// 将统一结果转换为 (HTTP 状态码, JSON 响应体)
pub fn reply<T, R>(result: OperationResult<T>) -> (StatusCode, Json<R>)
where
    R: From<OperationResult<T>>,
{
    (status_for(result.failure), Json(R::from(result)))
}
