use mtgate_core::account::entity::{
    Account, AccountUpdate, FundsAdjustment, FundsDirection, FundsSnapshot, Login, NewAccount,
    PasswordKind,
};
use mtgate_core::dealer::error::DealerError;
use rust_decimal::Decimal;

/// 新开账户的默认杠杆
pub const DEFAULT_LEVERAGE: i32 = 100;

/// # Summary
/// 模拟交易服务器上单个账户的内部状态。
/// 由 `SimulatedDealer` 包裹在 `RwLock` 中，保证单户读写一致。
///
/// # Invariants
/// - `balance` 与 `credit` 均不会因出金变为负数。
/// - 模拟盘不持有仓位，可用保证金恒等于 `balance + credit`。
pub struct AccountState {
    pub login: Login,
    pub name: String,
    pub group: String,
    pub city: String,
    pub email: String,
    pub phone: String,
    pub leverage: i32,
    pub enabled: bool,
    pub balance: Decimal,
    pub credit: Decimal,
    pub agent_account: i32,
    password: String,
    password_investor: String,
}

impl AccountState {
    pub fn new(login: Login, req: &NewAccount) -> Self {
        Self {
            login,
            name: req.name.clone(),
            group: req.group.clone(),
            city: req.city.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            leverage: DEFAULT_LEVERAGE,
            enabled: true,
            balance: Decimal::ZERO,
            credit: Decimal::ZERO,
            agent_account: 0,
            password: req.password.clone(),
            password_investor: req.password_investor.clone(),
        }
    }

    /// # Logic
    /// 覆盖非空字段，空字符串表示保持原值。
    pub fn apply_update(&mut self, update: &AccountUpdate) {
        overwrite(&mut self.name, &update.name);
        overwrite(&mut self.group, &update.group);
        overwrite(&mut self.city, &update.city);
        overwrite(&mut self.email, &update.email);
        overwrite(&mut self.phone, &update.phone);
        overwrite(&mut self.password, &update.password);
        overwrite(&mut self.password_investor, &update.password_investor);
    }

    pub fn set_password(&mut self, secret: &str, kind: PasswordKind) {
        match kind {
            PasswordKind::Master => self.password = secret.to_string(),
            PasswordKind::Investor => self.password_investor = secret.to_string(),
        }
    }

    /// 校验密码 (仅供测试与诊断)
    pub fn check_password(&self, secret: &str, kind: PasswordKind) -> bool {
        match kind {
            PasswordKind::Master => self.password == secret,
            PasswordKind::Investor => self.password_investor == secret,
        }
    }

    /// # Logic
    /// 1. 金额必须为正。
    /// 2. 信用额操作作用于 `credit`，否则作用于 `balance`。
    /// 3. 出金超过对应科目余额时拒绝，状态不变。
    pub fn apply_funds(&mut self, adjustment: &FundsAdjustment) -> Result<FundsSnapshot, DealerError> {
        if adjustment.amount <= Decimal::ZERO {
            return Err(DealerError::Operation("Invalid amount".to_string()));
        }

        let target = if adjustment.is_credit {
            &mut self.credit
        } else {
            &mut self.balance
        };

        match adjustment.direction {
            FundsDirection::Deposit => *target += adjustment.amount,
            FundsDirection::Withdraw => {
                if *target < adjustment.amount {
                    return Err(DealerError::Operation("Not enough money".to_string()));
                }
                *target -= adjustment.amount;
            }
        }

        Ok(FundsSnapshot {
            balance: self.balance,
            credit: self.credit,
        })
    }

    /// 获取对外透明的只读快照
    pub fn to_account(&self) -> Account {
        Account {
            login: self.login,
            name: self.name.clone(),
            group: self.group.clone(),
            leverage: self.leverage,
            enabled: self.enabled,
            balance: self.balance,
            credit: self.credit,
            free_margin: self.balance + self.credit,
            agent_account: self.agent_account,
        }
    }
}

fn overwrite(field: &mut String, value: &str) {
    if !value.is_empty() {
        *field = value.to_string();
    }
}
