//! # 配置加载
//!
//! 优先级由低到高：内置默认值 -> TOML 配置文件 -> `MTGATE__` 前缀的环境变量。
//! 例如 `MTGATE__SERVER__PORT=9000` 覆盖 `server.port`。

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use mtgate_core::config::AppConfig;
use thiserror::Error;
use tracing::{info, warn};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/mtgate.toml";
/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "MTGATE_CONFIG";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// 按默认规则加载配置。`MTGATE_CONFIG` 指定的文件必须存在，默认路径的文件可缺省。
pub fn load() -> Result<AppConfig, SettingsError> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_from(Path::new(&path), true),
        Err(_) => load_from(Path::new(DEFAULT_CONFIG_PATH), false),
    }
}

/// 从指定文件加载配置并叠加环境变量覆盖。
pub fn load_from(path: &Path, required: bool) -> Result<AppConfig, SettingsError> {
    let config: AppConfig = Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(
            File::from(PathBuf::from(path))
                .format(FileFormat::Toml)
                .required(required),
        )
        .add_source(
            Environment::with_prefix("MTGATE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    validate(&config)?;
    Ok(config)
}

/// 校验租户配置：Token 与服务器地址不能为空。
pub fn validate(config: &AppConfig) -> Result<(), SettingsError> {
    for (token, dealer) in &config.dealers {
        if token.trim().is_empty() {
            return Err(SettingsError::Invalid("dealer token must not be empty".to_string()));
        }
        if dealer.server_addr.trim().is_empty() {
            return Err(SettingsError::Invalid(format!(
                "dealer '{token}' has an empty server_addr"
            )));
        }
    }
    if config.server.metrics_port == Some(config.server.port) {
        return Err(SettingsError::Invalid(
            "metrics_port must differ from the API port".to_string(),
        ));
    }
    Ok(())
}

/// 启动时逐条记录租户配置 (不含密码)
pub fn log_dealers(config: &AppConfig) {
    if config.dealers.is_empty() {
        warn!("no dealers configured, every request will be rejected as unknown token");
        return;
    }
    for (token, dealer) in &config.dealers {
        info!(
            token = %token,
            server = %dealer.server_addr,
            account = dealer.account,
            "dealer configured"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_file_with_dealers() {
        let file = write_config(
            r#"
[server]
host = "127.0.0.1"
port = 9100
metrics_port = 9101

[logging]
level = "debug"
json = true

[dealers.tenant-a]
server_addr = "10.0.0.5:443"
account = 1001
password = "manager-secret"

[dealers.tenant-b]
server_addr = "10.0.0.6:443"
account = 1002
password = "other-secret"
"#,
        );

        let config = load_from(file.path(), true).unwrap();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:9100");
        assert_eq!(config.server.metrics_addr().as_deref(), Some("127.0.0.1:9101"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.dealers.len(), 2);
        let dealer = &config.dealers["tenant-a"];
        assert_eq!(dealer.server_addr, "10.0.0.5:443");
        assert_eq!(dealer.account, 1001);
        assert_eq!(dealer.password, "manager-secret");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let file = write_config(
            r#"
[dealers.tenant-a]
server_addr = "10.0.0.5:443"
account = 1
password = "p"
"#,
        );

        let config = load_from(file.path(), true).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.metrics_port, None);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.directory, None);
        assert_eq!(config.dealers.len(), 1);
    }

    #[test]
    fn test_optional_file_may_be_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("absent.toml"), false).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.dealers.is_empty());

        assert!(load_from(&dir.path().join("absent.toml"), true).is_err());
    }

    #[test]
    fn test_empty_server_addr_rejected() {
        let file = write_config(
            r#"
[dealers.tenant-a]
server_addr = ""
account = 1
password = "p"
"#,
        );

        let err = load_from(file.path(), true).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        assert!(err.to_string().contains("tenant-a"));
    }

    #[test]
    fn test_metrics_port_must_differ() {
        let mut config = AppConfig::default();
        config.server.metrics_port = Some(config.server.port);
        assert!(validate(&config).is_err());
    }
}
