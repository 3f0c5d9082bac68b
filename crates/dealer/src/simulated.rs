use crate::account::AccountState;
use async_trait::async_trait;
use dashmap::DashMap;
use mtgate_core::account::entity::{
    Account, AccountUpdate, FundsAdjustment, FundsSnapshot, Login, NewAccount, PasswordKind,
};
use mtgate_core::config::DealerConfig;
use mtgate_core::dealer::error::DealerError;
use mtgate_core::dealer::port::{BackendSession, SessionFactory};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 模拟服务器分配的第一个登录号
pub const FIRST_LOGIN: i32 = 1000;

/// # Summary
/// 内存中的模拟交易服务器管理员会话。
///
/// # Invariants
/// - 账户表使用 DashMap 分段锁，单户状态再由 RwLock 保护。
/// - 登录号单调递增，永不复用。
/// - 关闭后所有操作返回 `DealerError::Closed`，重复关闭无副作用。
pub struct SimulatedDealer {
    server_addr: String,
    accounts: DashMap<Login, Arc<RwLock<AccountState>>>,
    next_login: AtomicI32,
    closed: AtomicBool,
}

impl SimulatedDealer {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self::with_first_login(server_addr, FIRST_LOGIN)
    }

    pub fn with_first_login(server_addr: impl Into<String>, first_login: i32) -> Self {
        Self {
            server_addr: server_addr.into(),
            accounts: DashMap::new(),
            next_login: AtomicI32::new(first_login),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 校验密码 (仅供测试与诊断)
    pub async fn check_password(&self, login: Login, secret: &str, kind: PasswordKind) -> bool {
        match self.account(login) {
            Ok(lock) => lock.read().await.check_password(secret, kind),
            Err(_) => false,
        }
    }

    fn ensure_open(&self) -> Result<(), DealerError> {
        if self.is_closed() {
            Err(DealerError::Closed)
        } else {
            Ok(())
        }
    }

    fn account(&self, login: Login) -> Result<Arc<RwLock<AccountState>>, DealerError> {
        self.ensure_open()?;
        self.accounts
            .get(&login)
            .map(|kv| kv.value().clone())
            .ok_or_else(|| DealerError::Operation("Invalid account".to_string()))
    }
}

#[async_trait]
impl BackendSession for SimulatedDealer {
    async fn create_account(&self, account: &NewAccount) -> Result<Login, DealerError> {
        self.ensure_open()?;
        if account.name.trim().is_empty() {
            return Err(DealerError::Operation("Invalid parameters".to_string()));
        }

        let login = Login(self.next_login.fetch_add(1, Ordering::SeqCst));
        let state = AccountState::new(login, account);
        self.accounts.insert(login, Arc::new(RwLock::new(state)));
        debug!(server = %self.server_addr, login = %login, "simulated account created");
        Ok(login)
    }

    async fn get_account(&self, login: Login) -> Result<Account, DealerError> {
        let lock = self.account(login)?;
        let state = lock.read().await;
        Ok(state.to_account())
    }

    async fn update_account(&self, update: &AccountUpdate) -> Result<(), DealerError> {
        let lock = self.account(update.login)?;
        lock.write().await.apply_update(update);
        Ok(())
    }

    async fn delete_account(&self, login: Login) -> Result<(), DealerError> {
        self.ensure_open()?;
        self.accounts
            .remove(&login)
            .map(|_| ())
            .ok_or_else(|| DealerError::Operation("Invalid account".to_string()))
    }

    async fn reset_password(
        &self,
        login: Login,
        secret: &str,
        kind: PasswordKind,
    ) -> Result<(), DealerError> {
        let lock = self.account(login)?;
        lock.write().await.set_password(secret, kind);
        Ok(())
    }

    async fn adjust_funds(
        &self,
        adjustment: &FundsAdjustment,
    ) -> Result<Option<FundsSnapshot>, DealerError> {
        let lock = self.account(adjustment.login)?;
        let snapshot = lock.write().await.apply_funds(adjustment)?;
        Ok(Some(snapshot))
    }

    async fn close(&self) -> Result<(), DealerError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.accounts.clear();
            info!(server = %self.server_addr, "simulated dealer session closed");
        }
        Ok(())
    }
}

/// # Summary
/// 模拟会话工厂，为每个租户建立一个独立的 `SimulatedDealer`。
#[derive(Default)]
pub struct SimulatedDealerFactory;

impl SimulatedDealerFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionFactory for SimulatedDealerFactory {
    async fn connect(
        &self,
        token: &str,
        config: &DealerConfig,
    ) -> Result<Arc<dyn BackendSession>, DealerError> {
        if config.server_addr.trim().is_empty() {
            return Err(DealerError::Connect("server address is empty".to_string()));
        }
        info!(
            token = %token,
            server = %config.server_addr,
            account = config.account,
            "opening simulated dealer session"
        );
        Ok(Arc::new(SimulatedDealer::new(config.server_addr.clone())))
    }
}
