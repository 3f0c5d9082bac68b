//! # DTO (Data Transfer Object) 层
//!
//! 将领域请求/结果转化为面向调用方的 JSON 结构体。
//! 所有响应都遵循统一契约：`code` (0 失败 / 100 成功) + `message` + 各用例载荷字段。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use mtgate_core::account::entity::{
    AccountInfo, AccountUpdate, FundsRequest, FundsSnapshot, Login, NewAccount, PasswordReset,
};
use mtgate_core::common::OperationResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================
//  请求 DTO
// ============================================================

/// 开户请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// 账户显示名
    #[schema(example = "Alice")]
    pub name: String,
    /// 主密码
    #[schema(example = "Secret123")]
    pub password: String,
    /// 投资者 (只读) 密码
    #[schema(example = "Invest123")]
    pub password_investor: String,
    /// 账户组
    #[schema(example = "demoforex")]
    pub group: String,
    #[serde(default)]
    #[schema(example = "Berlin")]
    pub city: String,
    #[serde(default)]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "+49 30 1234567")]
    pub phone: String,
}

impl From<CreateUserRequest> for NewAccount {
    fn from(r: CreateUserRequest) -> Self {
        Self {
            name: r.name,
            password: r.password,
            password_investor: r.password_investor,
            group: r.group,
            city: r.city,
            email: r.email,
            phone: r.phone,
        }
    }
}

/// 修改账户资料请求体，空字段由交易服务器决定是否保留原值
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateUserRequest {
    #[schema(example = "Alice B.")]
    pub name: String,
    pub password: String,
    pub password_investor: String,
    #[schema(example = "realforex")]
    pub group: String,
    pub city: String,
    pub email: String,
    pub phone: String,
}

impl UpdateUserRequest {
    pub fn into_update(self, login: i32) -> AccountUpdate {
        AccountUpdate {
            login: Login(login),
            name: self.name,
            password: self.password,
            password_investor: self.password_investor,
            group: self.group,
            city: self.city,
            email: self.email,
            phone: self.phone,
        }
    }
}

/// 重置密码请求体。主密码非空时优先重置主密码
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ResetPasswordRequest {
    #[schema(example = "NewSecret1")]
    pub password: String,
    #[schema(example = "")]
    pub password_investor: String,
}

impl ResetPasswordRequest {
    pub fn into_reset(self, login: i32) -> PasswordReset {
        PasswordReset {
            login: Login(login),
            password: self.password,
            password_investor: self.password_investor,
        }
    }
}

/// 出入金请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FundsBody {
    /// 金额
    #[schema(value_type = f64, example = 100.0)]
    pub amount: Decimal,
    /// 备注
    #[serde(default)]
    #[schema(example = "bank transfer")]
    pub comment: String,
    /// 信用额标志：`1` 表示信用额操作，其余均为余额操作
    #[serde(default)]
    #[schema(example = 0)]
    pub is_credit: i32,
}

impl FundsBody {
    pub fn into_request(self, login: i32) -> FundsRequest {
        FundsRequest {
            login: Login(login),
            amount: self.amount,
            comment: self.comment,
            is_credit: self.is_credit,
        }
    }
}

// ============================================================
//  响应 DTO
// ============================================================

/// 仅含确认信息的响应 (修改、删除、重置密码、错误)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    /// 0 失败 / 100 成功
    #[schema(example = 100)]
    pub code: i32,
    #[schema(example = "Updated")]
    pub message: String,
}

impl AckResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
        }
    }
}

impl From<OperationResult<()>> for AckResponse {
    fn from(r: OperationResult<()>) -> Self {
        Self {
            code: r.code.code(),
            message: r.message,
        }
    }
}

/// 开户响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddUserResponse {
    #[schema(example = 100)]
    pub code: i32,
    #[schema(example = "Added")]
    pub message: String,
    /// 新账户登录号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 1001)]
    pub login: Option<i32>,
}

impl From<OperationResult<Login>> for AddUserResponse {
    fn from(r: OperationResult<Login>) -> Self {
        Self {
            code: r.code.code(),
            message: r.message,
            login: r.payload.map(|l| l.0),
        }
    }
}

/// 账户信息 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    #[schema(example = "demoforex")]
    pub group: String,
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = true)]
    pub enabled: bool,
    #[schema(example = 100)]
    pub leverage: i32,
    #[schema(value_type = f64, example = 1500.25)]
    pub balance: Decimal,
    #[schema(value_type = f64, example = 0.0)]
    pub credit: Decimal,
    #[schema(example = 0)]
    pub agent_account: i32,
}

impl From<AccountInfo> for UserInfo {
    fn from(a: AccountInfo) -> Self {
        Self {
            group: a.group,
            name: a.name,
            enabled: a.enabled,
            leverage: a.leverage,
            balance: a.balance,
            credit: a.credit,
            agent_account: a.agent_account,
        }
    }
}

/// 账户信息响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfoResponse {
    #[schema(example = 100)]
    pub code: i32,
    #[schema(example = "OK")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

impl From<OperationResult<AccountInfo>> for UserInfoResponse {
    fn from(r: OperationResult<AccountInfo>) -> Self {
        Self {
            code: r.code.code(),
            message: r.message,
            user: r.payload.map(Into::into),
        }
    }
}

/// 出入金响应，回显操作后的余额与信用额
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FundsResponse {
    #[schema(example = 100)]
    pub code: i32,
    #[schema(example = "Deposited")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>, example = 1600.25)]
    pub balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>, example = 0.0)]
    pub credit: Option<Decimal>,
}

impl From<OperationResult<FundsSnapshot>> for FundsResponse {
    fn from(r: OperationResult<FundsSnapshot>) -> Self {
        Self {
            code: r.code.code(),
            message: r.message,
            balance: r.payload.map(|s| s.balance),
            credit: r.payload.map(|s| s.credit),
        }
    }
}
