use std::sync::Arc;

use mtgate_api::metrics;
use mtgate_api::server::{self, AppState};
use mtgate_core::dealer::port::SessionFactory;
use mtgate_dealer::simulated::SimulatedDealerFactory;
use mtgate_manager::account::AccountService;
use mtgate_manager::registry::SessionRegistry;
use tokio::net::TcpListener;
use tracing::{error, info};

mod logging;
mod settings;

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化会话工厂与注册表并注入到 AccountService，再交给 API 层对外服务。
///
/// # Logic
/// 1. 加载配置并初始化全局日志。
/// 2. 实例化会话工厂与 SessionRegistry。
/// 3. 构造应用服务层 (AccountService)。
/// 4. 按需启动 Prometheus 指标端口。
/// 5. 启动 API 服务，收到退出信号后优雅停机并关闭所有租户会话。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志，guard 必须存活到进程退出
    let config = settings::load()?;
    let _log_guard = logging::init(&config.logging)?;
    info!("mtgate starting...");
    settings::log_dealers(&config);

    // 2. 会话工厂 + 注册表 (App 层知道具体实现，Manager 只依赖 SessionFactory)
    let factory: Arc<dyn SessionFactory> = Arc::new(SimulatedDealerFactory::new());
    let registry = SessionRegistry::new(config.dealers.clone(), factory);

    // 3. 应用服务层
    let accounts = AccountService::new(registry.clone());

    // 4. 指标端口
    if let Some(addr) = config.server.metrics_addr() {
        let handle = metrics::install_recorder()?;
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Prometheus metrics listening");
        tokio::spawn(async move {
            if let Err(e) = metrics::serve_metrics(listener, handle).await {
                error!(error = %e, "metrics server stopped");
            }
        });
    }

    // 5. API 服务
    let state = AppState { accounts };
    server::start_server(state, &config.server.bind_addr(), shutdown_signal()).await?;

    registry.shutdown().await;
    info!("mtgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received. Draining in-flight requests..."),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
