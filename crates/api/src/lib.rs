//! # `mtgate-api` - HTTP API 网关
//!
//! 本 crate 是 mtgate 交易服务器管理员网关的对外服务入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 接收 HTTP / WebSocket 请求，从 `X-Manager-Token` 头或帧中取出租户 Token
//! - 调用下层 `AccountService` 完成账户用例
//! - 将统一的 `OperationResult` 转换为 DTO 返回，并记录 Prometheus 指标

pub mod types;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
