//! # `mtgate-manager` - 应用服务层
//!
//! - [`registry::SessionRegistry`]：租户 Token 到后端会话的惰性注册表。
//! - [`account::AccountService`]：账户管理用例的请求分发器。

pub mod account;
pub mod registry;
