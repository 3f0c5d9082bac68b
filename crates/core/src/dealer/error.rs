use thiserror::Error;

/// # Summary
/// 后端 Dealer 会话返回的错误。
///
/// # Invariants
/// - `Operation` 的内容是交易服务器返回的原始错误文本，向上透传时不得改写。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DealerError {
    /// 后端执行账户操作失败
    #[error("{0}")]
    Operation(String),
    /// 建立管理员连接失败
    #[error("failed to connect dealer: {0}")]
    Connect(String),
    /// 会话已关闭
    #[error("dealer session closed")]
    Closed,
}
