use dashmap::DashMap;
use mtgate_core::config::DealerConfig;
use mtgate_core::dealer::error::DealerError;
use mtgate_core::dealer::port::{BackendSession, SessionFactory};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// # Summary
/// 会话注册表错误。
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Token 不在租户配置中
    #[error("ManagerToken not found, check token")]
    UnknownToken,
    /// 会话构建失败，注册表中不留下任何条目
    #[error("{source}")]
    Connect {
        token: String,
        #[source]
        source: DealerError,
    },
    /// 注册表已关闭
    #[error("session registry is shut down")]
    ShutDown,
}

type SessionSlot = Arc<OnceCell<Arc<dyn BackendSession>>>;

/// # Summary
/// 租户 Token 到后端会话的唯一映射。首次使用时惰性建立会话，此后一直复用到进程退出。
///
/// # Invariants
/// - 同一 Token 任意时刻至多存在一个存活会话，并发首次解析也只构建一次。
/// - 每个 Token 拥有独立的一次性初始化槽位，不同 Token 的构建互不阻塞。
/// - 构建失败时槽位保持未初始化，后续解析会重新尝试。
/// - 租户配置在构造后只读。
pub struct SessionRegistry {
    // 租户配置，Key 为 Token
    configs: HashMap<String, DealerConfig>,
    // 会话构建接口
    factory: Arc<dyn SessionFactory>,
    // 会话槽位，Key 为 Token
    sessions: DashMap<String, SessionSlot>,
    closed: AtomicBool,
}

impl SessionRegistry {
    /// # Summary
    /// 创建注册表。不会立即建立任何会话。
    ///
    /// # Arguments
    /// * `configs` - 租户 Token 到交易服务器连接参数的映射。
    /// * `factory` - 会话构建接口的具体实现。
    ///
    /// # Returns
    /// * `Arc<Self>` - 可在请求间共享的注册表。
    pub fn new(
        configs: HashMap<String, DealerConfig>,
        factory: Arc<dyn SessionFactory>,
    ) -> Arc<Self> {
        Arc::new(Self {
            configs,
            factory,
            sessions: DashMap::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// # Summary
    /// 解析 Token 对应的会话，必要时建立新会话。
    ///
    /// # Logic
    /// 1. 已有初始化完成的会话则直接返回。
    /// 2. Token 不在配置中返回 `UnknownToken`，不触发构建。
    /// 3. 取出 (或插入) 该 Token 的一次性槽位，释放分片锁后在槽位上执行构建。
    /// 4. 并发的同 Token 调用在槽位上等待同一次构建的结果。
    /// 5. 解析期间若注册表被关闭，则移除槽位、关闭刚建立的会话并返回 `ShutDown`。
    pub async fn resolve(&self, token: &str) -> Result<Arc<dyn BackendSession>, RegistryError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RegistryError::ShutDown);
        }

        if let Some(slot) = self.sessions.get(token)
            && let Some(session) = slot.get()
        {
            // 关闭可能与本次查找并发发生
            if self.closed.load(Ordering::Acquire) {
                return Err(RegistryError::ShutDown);
            }
            return Ok(session.clone());
        }

        let config = self.configs.get(token).ok_or(RegistryError::UnknownToken)?;

        let slot: SessionSlot = self.sessions.entry(token.to_string()).or_default().clone();

        let session = slot
            .get_or_try_init(|| async {
                debug!(token = %token, server = %config.server_addr, "connecting dealer session");
                let session = self.factory.connect(token, config).await?;
                info!(
                    token = %token,
                    server = %config.server_addr,
                    account = config.account,
                    "dealer session established"
                );
                Ok::<_, DealerError>(session)
            })
            .await
            .map_err(|source| {
                warn!(token = %token, error = %source, "failed to establish dealer session");
                RegistryError::Connect {
                    token: token.to_string(),
                    source,
                }
            })?
            .clone();

        if self.closed.load(Ordering::Acquire) {
            self.sessions.remove(token);
            if let Err(e) = session.close().await {
                warn!(token = %token, error = %e, "failed to close session created during shutdown");
            }
            return Err(RegistryError::ShutDown);
        }

        Ok(session)
    }

    /// # Summary
    /// 关闭注册表持有的全部会话。
    ///
    /// # Logic
    /// 1. 置位关闭标志，仅第一次调用继续执行。
    /// 2. 逐个移除槽位并关闭其中已建立的会话，关闭失败只记录日志。
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("session registry already shut down");
            return;
        }

        let tokens: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut closed = 0usize;
        for token in tokens {
            let Some((_, slot)) = self.sessions.remove(&token) else {
                continue;
            };
            if let Some(session) = slot.get() {
                match session.close().await {
                    Ok(()) => closed += 1,
                    Err(e) => warn!(token = %token, error = %e, "failed to close dealer session"),
                }
            }
        }

        info!(closed, "session registry shut down");
    }

    /// 配置中是否存在该 Token
    pub fn is_configured(&self, token: &str) -> bool {
        self.configs.contains_key(token)
    }

    /// 当前已建立的会话数量
    pub fn session_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|e| e.value().initialized())
            .count()
    }
}
