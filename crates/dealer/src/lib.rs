//! # `mtgate-dealer` - 模拟交易服务器会话
//!
//! 内存实现的 `BackendSession`，用于本地运行、演示与集成测试。
//! 不实现任何真实交易服务器的网络协议。

pub mod account;
pub mod simulated;
