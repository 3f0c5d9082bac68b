/// # Summary
/// 对外契约中的操作状态码。线上只有两种取值：`0` 失败，`100` 成功。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Failure,
    Success,
}

impl StatusCode {
    /// 线上传输使用的整型值
    pub fn code(self) -> i32 {
        match self {
            StatusCode::Failure => 0,
            StatusCode::Success => 100,
        }
    }
}

/// # Summary
/// 失败原因分类，传输层据此生成可机器判定的错误信号 (HTTP 状态码等)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Token 不在租户配置中
    UnknownToken,
    /// 会话无法建立或注册表已关闭
    SessionUnavailable,
    /// 后端操作本身失败
    BackendOperationFailed,
    /// 出金金额超过可用保证金
    InsufficientFreeMargin,
    /// 请求参数在本地校验失败
    InvalidRequest,
}

impl FailureKind {
    /// 用于日志与指标标签的稳定名称
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::UnknownToken => "unknown_token",
            FailureKind::SessionUnavailable => "session_unavailable",
            FailureKind::BackendOperationFailed => "backend_operation_failed",
            FailureKind::InsufficientFreeMargin => "insufficient_free_margin",
            FailureKind::InvalidRequest => "invalid_request",
        }
    }
}

/// # Summary
/// 每个请求产出的统一结果。
///
/// # Invariants
/// - `code == Success` 时 `failure` 必为 `None`；`code == Failure` 时必为 `Some`。
/// - 后端调用失败时 `payload` 只允许携带调用前已确知的数据，不得推测。
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult<T> {
    pub code: StatusCode,
    pub message: String,
    pub payload: Option<T>,
    pub failure: Option<FailureKind>,
}

impl<T> OperationResult<T> {
    /// 构建成功结果
    pub fn success(message: impl Into<String>, payload: T) -> Self {
        Self {
            code: StatusCode::Success,
            message: message.into(),
            payload: Some(payload),
            failure: None,
        }
    }

    /// 构建不带载荷的成功结果
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Success,
            message: message.into(),
            payload: None,
            failure: None,
        }
    }

    /// 构建失败结果
    pub fn failure(kind: FailureKind, message: impl Into<String>, payload: Option<T>) -> Self {
        Self {
            code: StatusCode::Failure,
            message: message.into(),
            payload,
            failure: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_wire_values() {
        assert_eq!(StatusCode::Failure.code(), 0);
        assert_eq!(StatusCode::Success.code(), 100);
    }

    #[test]
    fn test_result_constructors() {
        let ok = OperationResult::success("Added", 1001);
        assert!(ok.is_success());
        assert_eq!(ok.failure, None);
        assert_eq!(ok.payload, Some(1001));

        let failed: OperationResult<i32> =
            OperationResult::failure(FailureKind::UnknownToken, "nope", None);
        assert!(!failed.is_success());
        assert_eq!(failed.failure, Some(FailureKind::UnknownToken));
    }
}
