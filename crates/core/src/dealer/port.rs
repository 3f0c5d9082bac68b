use crate::account::entity::{
    Account, AccountUpdate, FundsAdjustment, FundsSnapshot, Login, NewAccount, PasswordKind,
};
use crate::config::DealerConfig;
use crate::dealer::error::DealerError;
use async_trait::async_trait;
use std::sync::Arc;

/// # Summary
/// 后端交易服务器的管理员会话能力接口 (Port)。
/// 一个实例对应一条到某个交易服务器的管理员连接，由 `SessionRegistry` 独占持有。
///
/// # Invariants
/// - 实现类必须保证线程安全 (`Send` + `Sync`)，构造完成后会被任意多个请求并发调用。
/// - 每次调用要么成功要么失败，且只执行一次；本接口的调用方不做重试。
/// - 实现类需自行限制阻塞时长。
#[async_trait]
pub trait BackendSession: Send + Sync {
    /// 开户，返回交易服务器分配的登录号
    async fn create_account(&self, account: &NewAccount) -> Result<Login, DealerError>;

    /// 查询账户快照 (含可用保证金)
    async fn get_account(&self, login: Login) -> Result<Account, DealerError>;

    /// 修改账户资料
    async fn update_account(&self, update: &AccountUpdate) -> Result<(), DealerError>;

    /// 删除账户
    async fn delete_account(&self, login: Login) -> Result<(), DealerError>;

    /// 重置主密码或投资者密码
    async fn reset_password(
        &self,
        login: Login,
        secret: &str,
        kind: PasswordKind,
    ) -> Result<(), DealerError>;

    /// # Summary
    /// 出金或入金。
    ///
    /// # Returns
    /// * `Ok(Some(snapshot))` - 后端回报了操作后的余额与信用额。
    /// * `Ok(None)` - 操作成功，但后端未回报余额。
    /// * `Err(DealerError)` - 操作失败，资金未发生变动。
    async fn adjust_funds(
        &self,
        adjustment: &FundsAdjustment,
    ) -> Result<Option<FundsSnapshot>, DealerError>;

    /// # Summary
    /// 释放会话持有的全部资源。仅由 `SessionRegistry::shutdown` 调用。
    ///
    /// # Invariants
    /// - 幂等：重复关闭不得报错。
    async fn close(&self) -> Result<(), DealerError>;
}

/// # Summary
/// 会话构建接口。
/// 由具体的 Dealer 实现 crate 提供，通过 `crates/app` 注入到 `SessionRegistry`，
/// 使 manager 无需编译期依赖任何具体的交易服务器协议实现。
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// # Summary
    /// 根据租户配置建立一条新的管理员会话。
    ///
    /// # Arguments
    /// * `token` - 租户 Token，仅用于日志与诊断。
    /// * `config` - 该租户的交易服务器连接参数。
    async fn connect(
        &self,
        token: &str,
        config: &DealerConfig,
    ) -> Result<Arc<dyn BackendSession>, DealerError>;
}
