//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 的 DI 容器持有并调用。

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use mtgate_manager::account::AccountService;

use crate::middleware::token::TOKEN_HEADER;
use crate::routes::{user, ws};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - `accounts` 在服务启动前由 DI 容器注入，生命周期与进程等同。
#[derive(Clone)]
pub struct AppState {
    /// 账户管理请求分发器 (Facade)
    pub accounts: Arc<AccountService>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mtgate Manager API",
        version = "0.1.0",
        description = "交易服务器管理员网关。按租户 Token 路由到对应交易服务器，提供开户、资料维护、密码重置与出入金。",
        license(name = "MIT")
    ),
    tags(
        (name = "账户 (User)", description = "交易账户的增删改查、密码重置与出入金")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// 为 OpenAPI 文档注入租户 Token 请求头鉴权方案。
///
/// 注册后 Swagger UI 页面顶部将显示 Authorize 按钮，填入 Token 即可调试所有接口。
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "manager_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    TOKEN_HEADER,
                    "租户 Token，对应配置文件中 dealers 下的键",
                ))),
            );
        }
    }
}

// ============================================================
//  路由组装
// ============================================================

/// 构建完整的 axum 应用路由树 (REST + WebSocket + Swagger UI)。
pub fn build_router(state: AppState) -> Router {
    // 同一路径的多个方法必须在同一个 routes! 中注册
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(user::add_user))
        .routes(routes!(user::get_user, user::update_user, user::delete_user))
        .routes(routes!(user::reset_password))
        .routes(routes!(user::deposit))
        .routes(routes!(user::withdraw))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .split_for_parts();

    // 开发阶段允许所有来源
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .fallback(user::fallback)
        .layer(cors)
}

/// 在已绑定的监听器上提供服务，直到 `shutdown` 完成。
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// 绑定地址并启动 HTTP 监听。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:8080"`
/// * `shutdown` - 完成时停止接受新连接并等待在途请求结束
pub async fn start_server<F>(state: AppState, bind_addr: &str, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "mtgate API server listening");
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);
    serve(listener, state, shutdown).await
}
