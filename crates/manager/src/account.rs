use crate::registry::{RegistryError, SessionRegistry};
use mtgate_core::account::entity::{
    AccountInfo, AccountUpdate, FundsAdjustment, FundsDirection, FundsRequest, FundsSnapshot,
    Login, NewAccount, PasswordReset,
};
use mtgate_core::common::{FailureKind, OperationResult};
use mtgate_core::dealer::error::DealerError;
use mtgate_core::dealer::port::BackendSession;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// # Summary
/// 账户操作的统一错误类型。
#[derive(Error, Debug)]
pub enum AccountError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// 后端返回的错误，消息原样透传
    #[error(transparent)]
    Backend(#[from] DealerError),
    /// 出金金额超过可用保证金，未触达后端
    #[error("Failed withdraw more than free margin")]
    InsufficientFreeMargin {
        requested: Decimal,
        free_margin: Decimal,
    },
    #[error("{0}")]
    InvalidRequest(String),
}

impl AccountError {
    /// 映射为对外的失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            AccountError::Registry(RegistryError::UnknownToken) => FailureKind::UnknownToken,
            AccountError::Registry(_) => FailureKind::SessionUnavailable,
            AccountError::Backend(DealerError::Operation(_)) => {
                FailureKind::BackendOperationFailed
            }
            AccountError::Backend(_) => FailureKind::SessionUnavailable,
            AccountError::InsufficientFreeMargin { .. } => FailureKind::InsufficientFreeMargin,
            AccountError::InvalidRequest(_) => FailureKind::InvalidRequest,
        }
    }

    fn into_result<T>(self, payload: Option<T>) -> OperationResult<T> {
        OperationResult::failure(self.kind(), self.to_string(), payload)
    }
}

/// # Summary
/// 账户管理请求分发器，系统的应用服务层门面 (Facade)。
/// 每个用例一个入口：解析租户会话 -> 业务校验 -> 调用后端 -> 统一结果 + 审计日志。
///
/// # Invariants
/// - 只通过 `SessionRegistry` 获取会话，从不直接访问映射表。
/// - 每个操作只以自身的后端调用结果作为成败依据。
/// - 任何错误都会被记录并转换为 `OperationResult`，调用方不会拿到原始后端错误对象。
pub struct AccountService {
    registry: Arc<SessionRegistry>,
}

impl AccountService {
    /// # Summary
    /// 创建 AccountService 实例。
    ///
    /// # Arguments
    /// * `registry` - 由外部构造并注入的会话注册表。
    pub fn new(registry: Arc<SessionRegistry>) -> Arc<Self> {
        Arc::new(Self { registry })
    }

    async fn session(&self, token: &str) -> Result<Arc<dyn BackendSession>, AccountError> {
        Ok(self.registry.resolve(token).await?)
    }

    /// # Summary
    /// 开户。
    ///
    /// # Returns
    /// * 成功时载荷为交易服务器分配的登录号，消息为 "Added"。
    pub async fn add_account(&self, token: &str, account: NewAccount) -> OperationResult<Login> {
        let result: Result<Login, AccountError> = async {
            let session = self.session(token).await?;
            Ok(session.create_account(&account).await?)
        }
        .await;

        match result {
            Ok(login) => {
                info!(
                    token = %token,
                    login = %login,
                    name = %account.name,
                    email = %account.email,
                    "user added"
                );
                OperationResult::success("Added", login)
            }
            Err(e) => {
                error!(
                    token = %token,
                    name = %account.name,
                    email = %account.email,
                    error = %e,
                    "failed to add user"
                );
                e.into_result(None)
            }
        }
    }

    /// 查询账户信息
    pub async fn get_account_info(&self, token: &str, login: Login) -> OperationResult<AccountInfo> {
        let result: Result<AccountInfo, AccountError> = async {
            let session = self.session(token).await?;
            Ok(session.get_account(login).await?.into())
        }
        .await;

        match result {
            Ok(info) => {
                info!(token = %token, login = %login, "user info fetched");
                OperationResult::success("OK", info)
            }
            Err(e) => {
                error!(token = %token, login = %login, error = %e, "failed to get user");
                e.into_result(None)
            }
        }
    }

    /// 修改账户资料
    pub async fn update_account(&self, token: &str, update: AccountUpdate) -> OperationResult<()> {
        let result: Result<(), AccountError> = async {
            let session = self.session(token).await?;
            Ok(session.update_account(&update).await?)
        }
        .await;

        match result {
            Ok(()) => {
                info!(
                    token = %token,
                    login = %update.login,
                    name = %update.name,
                    email = %update.email,
                    "user updated"
                );
                OperationResult::success("Updated", ())
            }
            Err(e) => {
                error!(
                    token = %token,
                    login = %update.login,
                    name = %update.name,
                    email = %update.email,
                    error = %e,
                    "failed to update user"
                );
                e.into_result(None)
            }
        }
    }

    /// 删除账户
    pub async fn delete_account(&self, token: &str, login: Login) -> OperationResult<()> {
        let result: Result<(), AccountError> = async {
            let session = self.session(token).await?;
            Ok(session.delete_account(login).await?)
        }
        .await;

        match result {
            Ok(()) => {
                info!(token = %token, login = %login, "user removed");
                OperationResult::success("Deleted", ())
            }
            Err(e) => {
                error!(token = %token, login = %login, error = %e, "failed to delete user");
                e.into_result(None)
            }
        }
    }

    /// # Summary
    /// 重置密码。
    ///
    /// # Logic
    /// 1. 主密码非空则重置主密码，否则重置投资者密码。
    /// 2. 两者皆空时在本地拒绝，不解析会话也不触达后端。
    pub async fn reset_password(&self, token: &str, reset: PasswordReset) -> OperationResult<()> {
        let result: Result<(), AccountError> = async {
            let (secret, kind) = reset.target().ok_or_else(|| {
                AccountError::InvalidRequest("password or investor password required".to_string())
            })?;
            let session = self.session(token).await?;
            Ok(session.reset_password(reset.login, secret, kind).await?)
        }
        .await;

        match result {
            Ok(()) => {
                info!(token = %token, login = %reset.login, "user password reset");
                OperationResult::success("Reset", ())
            }
            Err(e) => {
                error!(token = %token, login = %reset.login, error = %e, "failed to reset password");
                e.into_result(None)
            }
        }
    }

    /// # Summary
    /// 入金 (或增加信用额)。
    ///
    /// # Logic
    /// 1. 调用后端入金。
    /// 2. 后端回报了余额则直接使用，否则立即重新查询账户。
    /// 3. 入金成功但重新查询失败时仍然报告成功，只是不带余额载荷。
    pub async fn deposit(&self, token: &str, req: FundsRequest) -> OperationResult<FundsSnapshot> {
        let adjustment = adjustment(&req, FundsDirection::Deposit);

        let session = match self.session(token).await {
            Ok(session) => session,
            Err(e) => {
                error!(token = %token, login = %req.login, error = %e, "failed to load dealer");
                return e.into_result(None);
            }
        };

        let reported = match session.adjust_funds(&adjustment).await {
            Ok(reported) => reported,
            Err(e) => {
                error!(
                    token = %token,
                    login = %req.login,
                    amount = %req.amount,
                    error = %e,
                    "failed to deposit user"
                );
                return AccountError::from(e).into_result(None);
            }
        };

        info!(
            token = %token,
            login = %req.login,
            amount = %req.amount,
            credit = adjustment.is_credit,
            "user deposited"
        );

        match reported {
            Some(snapshot) => OperationResult::success("Deposited", snapshot),
            None => match session.get_account(req.login).await {
                Ok(account) => OperationResult::success("Deposited", account.funds()),
                Err(e) => {
                    warn!(
                        token = %token,
                        login = %req.login,
                        error = %e,
                        "deposit applied but balance refresh failed"
                    );
                    OperationResult::success_empty("Deposited")
                }
            },
        }
    }

    /// # Summary
    /// 出金 (或扣减信用额)，带偿付能力校验。
    ///
    /// # Logic
    /// 1. 先查询账户快照。
    /// 2. 出金金额大于可用保证金时直接拒绝，不调用资金变动接口，回显查询到的余额。
    /// 3. 调用后端出金；失败时回显出金前的余额。
    /// 4. 成功时优先使用后端回报的余额，其次重新查询，最后回落到出金前快照。
    pub async fn withdraw(&self, token: &str, req: FundsRequest) -> OperationResult<FundsSnapshot> {
        let adjustment = adjustment(&req, FundsDirection::Withdraw);

        let session = match self.session(token).await {
            Ok(session) => session,
            Err(e) => {
                error!(token = %token, login = %req.login, error = %e, "failed to load dealer");
                return e.into_result(None);
            }
        };

        let before = match session.get_account(req.login).await {
            Ok(account) => account,
            Err(e) => {
                error!(token = %token, login = %req.login, error = %e, "failed to load user");
                return AccountError::from(e).into_result(None);
            }
        };

        if req.amount > before.free_margin {
            let e = AccountError::InsufficientFreeMargin {
                requested: req.amount,
                free_margin: before.free_margin,
            };
            error!(
                token = %token,
                login = %req.login,
                amount = %req.amount,
                free_margin = %before.free_margin,
                error = %e,
                "withdraw rejected"
            );
            return e.into_result(Some(before.funds()));
        }

        let reported = match session.adjust_funds(&adjustment).await {
            Ok(reported) => reported,
            Err(e) => {
                error!(
                    token = %token,
                    login = %req.login,
                    amount = %req.amount,
                    error = %e,
                    "failed to withdraw user"
                );
                return AccountError::from(e).into_result(Some(before.funds()));
            }
        };

        info!(
            token = %token,
            login = %req.login,
            amount = %req.amount,
            credit = adjustment.is_credit,
            "user withdrawn"
        );

        let after = match reported {
            Some(snapshot) => snapshot,
            None => match session.get_account(req.login).await {
                Ok(account) => account.funds(),
                Err(e) => {
                    warn!(
                        token = %token,
                        login = %req.login,
                        error = %e,
                        "withdraw applied but balance refresh failed, echoing pre-withdraw snapshot"
                    );
                    before.funds()
                }
            },
        };
        OperationResult::success("Withdrawn", after)
    }
}

fn adjustment(req: &FundsRequest, direction: FundsDirection) -> FundsAdjustment {
    FundsAdjustment {
        login: req.login,
        direction,
        amount: req.amount,
        comment: req.comment.clone(),
        is_credit: req.credit(),
    }
}
