use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// 租户 Token -> 交易服务器连接参数，进程启动后只读
    #[serde(default)]
    pub dealers: HashMap<String, DealerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prometheus 指标端口，未配置时不启用
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl ServerConfig {
    /// REST 与 WebSocket 共用的监听地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_addr(&self) -> Option<String> {
        self.metrics_port.map(|port| format!("{}:{}", self.host, port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter 指令，例如 "info" 或 "mtgate_manager=debug"
    pub level: String,
    /// 滚动日志文件目录，未配置时只输出到 stdout
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub json: bool,
}

/// # Summary
/// 单个租户的交易服务器连接参数。
///
/// # Invariants
/// - `password` 不会出现在 `Debug` 输出中。
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DealerConfig {
    /// 交易服务器地址，例如 "10.0.0.5:443"
    pub server_addr: String,
    /// 管理员账号
    pub account: i32,
    /// 管理员密码
    pub password: String,
}

impl std::fmt::Debug for DealerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DealerConfig")
            .field("server_addr", &self.server_addr)
            .field("account", &self.account)
            .field("password", &"***")
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                metrics_port: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
                json: false,
            },
            dealers: HashMap::new(),
        }
    }
}
