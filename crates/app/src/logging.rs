//! # 日志初始化
//!
//! `EnvFilter` (可被 `RUST_LOG` 覆盖) + stdout 输出层，
//! 配置了 `logging.directory` 时追加按天滚动的非阻塞文件输出层。

use mtgate_core::config::LoggingConfig;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 滚动日志文件名前缀
const FILE_PREFIX: &str = "mtgate.log";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// 安装全局 subscriber。
///
/// # Returns
/// 文件输出的 `WorkerGuard`，必须持有到进程退出，否则缓冲中的日志会丢失。
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let (file_writer, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        let file_layer = file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w));
        registry
            .with(fmt::layer().json().with_target(true))
            .with(file_layer)
            .try_init()?;
    } else {
        let file_layer = file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w));
        registry
            .with(fmt::layer().with_target(true))
            .with(file_layer)
            .try_init()?;
    }

    tracing::info!(
        level = %config.level,
        json = config.json,
        directory = ?config.directory,
        "logging initialized"
    );
    Ok(guard)
}
