use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// # Summary
/// 交易服务器上的账户登录号，由后端 Dealer 在开户时分配。
///
/// # Invariants
/// - 同一个交易服务器内全局唯一。
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Login(pub i32);

impl std::fmt::Display for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// # Summary
/// 开户请求所携带的账户资料。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub password: String,
    pub password_investor: String,
    pub group: String,
    pub city: String,
    pub email: String,
    pub phone: String,
}

/// # Summary
/// 修改账户资料的请求，字段语义与 [`NewAccount`] 一致，额外指定目标登录号。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub login: Login,
    pub name: String,
    pub password: String,
    pub password_investor: String,
    pub group: String,
    pub city: String,
    pub email: String,
    pub phone: String,
}

/// # Summary
/// 后端返回的账户完整快照，仅在单次请求内短暂持有，不做跨请求缓存。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub login: Login,
    pub name: String,
    pub group: String,
    pub leverage: i32,
    pub enabled: bool,
    pub balance: Decimal,
    pub credit: Decimal,
    /// 可用保证金，出金前的偿付能力校验依据
    pub free_margin: Decimal,
    pub agent_account: i32,
}

impl Account {
    /// 提取资金快照 (余额 + 信用额)
    pub fn funds(&self) -> FundsSnapshot {
        FundsSnapshot {
            balance: self.balance,
            credit: self.credit,
        }
    }
}

/// # Summary
/// GetAccountInfo 对外暴露的账户信息视图。
/// 不包含 `free_margin`，与对外契约保持一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub group: String,
    pub name: String,
    pub enabled: bool,
    pub leverage: i32,
    pub balance: Decimal,
    pub credit: Decimal,
    pub agent_account: i32,
}

impl From<Account> for AccountInfo {
    fn from(a: Account) -> Self {
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

/// # Summary
/// 密码类型：主密码 (交易) 或投资者密码 (只读)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordKind {
    Master,
    Investor,
}

/// # Summary
/// 重置密码请求。`password` 与 `password_investor` 中非空的主密码优先。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordReset {
    pub login: Login,
    pub password: String,
    pub password_investor: String,
}

impl PasswordReset {
    /// # Summary
    /// 选择本次需要重置的密码及其类型。
    ///
    /// # Logic
    /// 1. 主密码非空时，重置主密码。
    /// 2. 否则投资者密码非空时，重置投资者密码。
    /// 3. 两者皆空返回 `None`，由调用方拒绝该请求。
    pub fn target(&self) -> Option<(&str, PasswordKind)> {
        if !self.password.is_empty() {
            Some((&self.password, PasswordKind::Master))
        } else if !self.password_investor.is_empty() {
            Some((&self.password_investor, PasswordKind::Investor))
        } else {
            None
        }
    }
}

/// # Summary
/// 资金变动方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundsDirection {
    Deposit,
    Withdraw,
}

/// # Summary
/// 出入金请求。
///
/// # Invariants
/// - `is_credit` 为三态整型标志：仅当值为 `1` 时视为信用额操作，其余一律为余额操作。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsRequest {
    pub login: Login,
    pub amount: Decimal,
    pub comment: String,
    pub is_credit: i32,
}

impl FundsRequest {
    /// 三态标志折叠为布尔值：`1` 为真，其它均为假
    pub fn credit(&self) -> bool {
        self.is_credit == 1
    }
}

/// # Summary
/// 下发给后端的资金变动指令。
#[derive(Debug, Clone, PartialEq)]
pub struct FundsAdjustment {
    pub login: Login,
    pub direction: FundsDirection,
    pub amount: Decimal,
    pub comment: String,
    pub is_credit: bool,
}

/// # Summary
/// 出入金后回显给调用方的资金快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsSnapshot {
    pub balance: Decimal,
    pub credit: Decimal,
}
