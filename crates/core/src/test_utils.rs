//! # 测试替身
//!
//! 提供 `BackendSession` 与 `SessionFactory` 的内存假实现，
//! 供 manager / api 等 crate 在不连接真实交易服务器的情况下进行测试。
//! 仅在开启 `test-utils` feature 时编译。

use crate::account::entity::{
    Account, AccountUpdate, FundsAdjustment, FundsDirection, FundsSnapshot, Login, NewAccount,
    PasswordKind,
};
use crate::config::DealerConfig;
use crate::dealer::error::DealerError;
use crate::dealer::port::{BackendSession, SessionFactory};
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// FakeDealer 收到的一次调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    Create(String),
    Get(Login),
    Update(Login),
    Delete(Login),
    ResetPassword {
        login: Login,
        secret: String,
        kind: PasswordKind,
    },
    AdjustFunds(FundsAdjustment),
}

/// 可编程的失败点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    Create,
    Get,
    Update,
    Delete,
    ResetPassword,
    AdjustFunds,
}

/// # Summary
/// 内存中的假 Dealer 会话。
///
/// # Invariants
/// - 记录每一次调用，便于断言 "是否触达了后端"。
/// - 通过 `fail` 注入的错误会持续生效，直到 `clear_failure`。
/// - 通过 `fail_nth` 注入的错误只在该操作的第 N 次调用时生效一次。
pub struct FakeDealer {
    accounts: Mutex<HashMap<Login, Account>>,
    failures: Mutex<HashMap<FakeOp, String>>,
    nth_failures: Mutex<HashMap<FakeOp, (usize, String)>>,
    op_counts: Mutex<HashMap<FakeOp, usize>>,
    calls: Mutex<Vec<FakeCall>>,
    next_login: AtomicI32,
    report_funds: AtomicBool,
    close_count: AtomicUsize,
}

impl Default for FakeDealer {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDealer {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            nth_failures: Mutex::new(HashMap::new()),
            op_counts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            next_login: AtomicI32::new(1001),
            report_funds: AtomicBool::new(false),
            close_count: AtomicUsize::new(0),
        }
    }

    /// 指定下一个开户分配的登录号
    pub fn with_next_login(self, login: i32) -> Self {
        self.next_login.store(login, Ordering::SeqCst);
        self
    }

    /// 出入金成功后是否直接回报余额快照
    pub fn with_funds_report(self, enabled: bool) -> Self {
        self.report_funds.store(enabled, Ordering::SeqCst);
        self
    }

    /// 预置一个账户
    pub async fn insert_account(&self, account: Account) {
        self.accounts.lock().await.insert(account.login, account);
    }

    /// 让指定操作从现在起返回给定错误文本
    pub async fn fail(&self, op: FakeOp, message: impl Into<String>) {
        self.failures.lock().await.insert(op, message.into());
    }

    /// 让指定操作的第 `nth` 次调用 (从 1 开始计数) 返回给定错误文本
    pub async fn fail_nth(&self, op: FakeOp, nth: usize, message: impl Into<String>) {
        self.nth_failures
            .lock()
            .await
            .insert(op, (nth, message.into()));
    }

    pub async fn clear_failure(&self, op: FakeOp) {
        self.failures.lock().await.remove(&op);
    }

    pub async fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().await.clone()
    }

    /// 是否发生过资金变动调用
    pub async fn funds_touched(&self) -> bool {
        self.calls
            .lock()
            .await
            .iter()
            .any(|c| matches!(c, FakeCall::AdjustFunds(_)))
    }

    pub async fn account(&self, login: Login) -> Option<Account> {
        self.accounts.lock().await.get(&login).cloned()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    async fn record(&self, call: FakeCall, op: FakeOp) -> Result<(), DealerError> {
        self.calls.lock().await.push(call);
        let count = {
            let mut counts = self.op_counts.lock().await;
            let count = counts.entry(op).or_insert(0);
            *count += 1;
            *count
        };
        if let Some((nth, msg)) = self.nth_failures.lock().await.get(&op)
            && *nth == count
        {
            return Err(DealerError::Operation(msg.clone()));
        }
        match self.failures.lock().await.get(&op) {
            Some(msg) => Err(DealerError::Operation(msg.clone())),
            None => Ok(()),
        }
    }
}

/// 生成一个测试账户，可用保证金等于余额
pub fn sample_account(login: i32, balance: Decimal, free_margin: Decimal) -> Account {
    Account {
        login: Login(login),
        name: "Alice".to_string(),
        group: "demo".to_string(),
        leverage: 100,
        enabled: true,
        balance,
        credit: Decimal::ZERO,
        free_margin,
        agent_account: 0,
    }
}

#[async_trait]
impl BackendSession for FakeDealer {
    async fn create_account(&self, account: &NewAccount) -> Result<Login, DealerError> {
        self.record(FakeCall::Create(account.name.clone()), FakeOp::Create)
            .await?;
        let login = Login(self.next_login.fetch_add(1, Ordering::SeqCst));
        let mut created = sample_account(login.0, Decimal::ZERO, Decimal::ZERO);
        created.name = account.name.clone();
        created.group = account.group.clone();
        self.accounts.lock().await.insert(login, created);
        Ok(login)
    }

    async fn get_account(&self, login: Login) -> Result<Account, DealerError> {
        self.record(FakeCall::Get(login), FakeOp::Get).await?;
        self.accounts
            .lock()
            .await
            .get(&login)
            .cloned()
            .ok_or_else(|| DealerError::Operation(format!("account {} not found", login)))
    }

    async fn update_account(&self, update: &AccountUpdate) -> Result<(), DealerError> {
        self.record(FakeCall::Update(update.login), FakeOp::Update)
            .await?;
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&update.login)
            .ok_or_else(|| DealerError::Operation(format!("account {} not found", update.login)))?;
        account.name = update.name.clone();
        account.group = update.group.clone();
        Ok(())
    }

    async fn delete_account(&self, login: Login) -> Result<(), DealerError> {
        self.record(FakeCall::Delete(login), FakeOp::Delete).await?;
        self.accounts.lock().await.remove(&login);
        Ok(())
    }

    async fn reset_password(
        &self,
        login: Login,
        secret: &str,
        kind: PasswordKind,
    ) -> Result<(), DealerError> {
        self.record(
            FakeCall::ResetPassword {
                login,
                secret: secret.to_string(),
                kind,
            },
            FakeOp::ResetPassword,
        )
        .await
    }

    async fn adjust_funds(
        &self,
        adjustment: &FundsAdjustment,
    ) -> Result<Option<FundsSnapshot>, DealerError> {
        self.record(FakeCall::AdjustFunds(adjustment.clone()), FakeOp::AdjustFunds)
            .await?;
        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(&adjustment.login).ok_or_else(|| {
            DealerError::Operation(format!("account {} not found", adjustment.login))
        })?;
        let delta = match adjustment.direction {
            FundsDirection::Deposit => adjustment.amount,
            FundsDirection::Withdraw => -adjustment.amount,
        };
        if adjustment.is_credit {
            account.credit += delta;
        } else {
            account.balance += delta;
        }
        account.free_margin += delta;

        if self.report_funds.load(Ordering::SeqCst) {
            Ok(Some(account.funds()))
        } else {
            Ok(None)
        }
    }

    async fn close(&self) -> Result<(), DealerError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// # Summary
/// 假会话工厂，统计构建次数并支持注入延迟、阻塞与失败。
pub struct FakeDealerFactory {
    prototype: Option<Arc<FakeDealer>>,
    delay: Option<Duration>,
    constructions: AtomicUsize,
    held: DashMap<String, Arc<Notify>>,
    failing: DashMap<String, String>,
    created: Mutex<Vec<Arc<FakeDealer>>>,
}

impl Default for FakeDealerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDealerFactory {
    /// 每次构建都产出一个新的 FakeDealer
    pub fn new() -> Self {
        Self {
            prototype: None,
            delay: None,
            constructions: AtomicUsize::new(0),
            held: DashMap::new(),
            failing: DashMap::new(),
            created: Mutex::new(Vec::new()),
        }
    }

    /// 每次构建都返回同一个预置的会话，便于测试直接操控后端状态
    pub fn with_session(mut self, dealer: Arc<FakeDealer>) -> Self {
        self.prototype = Some(dealer);
        self
    }

    /// 每次构建前等待一段时间，放大并发窗口
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 指定 Token 的构建将失败
    pub fn failing(self, token: &str, message: &str) -> Self {
        self.failing.insert(token.to_string(), message.to_string());
        self
    }

    /// 让指定 Token 的构建挂起，直到返回的 `Notify` 被触发
    pub fn hold(&self, token: &str) -> Arc<Notify> {
        self.held
            .entry(token.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    pub async fn created(&self) -> Vec<Arc<FakeDealer>> {
        self.created.lock().await.clone()
    }

    pub fn clear_failure(&self, token: &str) {
        self.failing.remove(token);
    }
}

#[async_trait]
impl SessionFactory for FakeDealerFactory {
    async fn connect(
        &self,
        token: &str,
        _config: &DealerConfig,
    ) -> Result<Arc<dyn BackendSession>, DealerError> {
        self.constructions.fetch_add(1, Ordering::SeqCst);

        let gate = self.held.get(token).map(|g| g.value().clone());
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = self.failing.get(token) {
            return Err(DealerError::Connect(msg.value().clone()));
        }

        let dealer = match &self.prototype {
            Some(p) => p.clone(),
            None => Arc::new(FakeDealer::new()),
        };
        self.created.lock().await.push(dealer.clone());
        Ok(dealer)
    }
}
