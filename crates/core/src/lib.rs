//! # `mtgate-core` - 领域核心
//!
//! 定义账户实体、Dealer 会话端口 (Port)、统一结果类型与配置结构。
//! 本 crate 不包含任何 I/O 实现，所有具体实现通过 Trait 注入。

pub mod account {
    pub mod entity;
}
pub mod common;
pub mod config;
pub mod dealer {
    pub mod error;
    pub mod port;
}

#[cfg(feature = "test-utils")]
pub mod test_utils;
