//! # Prometheus 指标
//!
//! 记录每次账户操作的结果与耗时，并在独立端口上以 `/metrics` 暴露。
//!
//! - `mtgate_operations_total{operation, status}`: 操作计数，status 为 `success` 或失败分类
//! - `mtgate_operation_duration_seconds{operation}`: 操作耗时直方图

use std::future::Future;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use mtgate_core::common::OperationResult;
use tokio::net::TcpListener;

pub const OPERATIONS_TOTAL: &str = "mtgate_operations_total";
pub const OPERATION_DURATION: &str = "mtgate_operation_duration_seconds";

/// 安装全局 Prometheus recorder，整个进程只能调用一次
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_counter!(OPERATIONS_TOTAL, "Total number of account operations by outcome");
    describe_histogram!(OPERATION_DURATION, "Account operation latency in seconds");
    Ok(handle)
}

/// `/metrics` 路由
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// 在独立监听器上提供 `/metrics`
pub async fn serve_metrics(listener: TcpListener, handle: PrometheusHandle) -> std::io::Result<()> {
    axum::serve(listener, metrics_router(handle)).await
}

/// 执行一次操作并记录计数与耗时。未安装 recorder 时指标调用为空操作。
pub async fn observe<T, F>(operation: &'static str, fut: F) -> OperationResult<T>
where
    F: Future<Output = OperationResult<T>>,
{
    let started = Instant::now();
    let result = fut.await;
    let status = match result.failure {
        None => "success",
        Some(kind) => kind.as_str(),
    };
    counter!(OPERATIONS_TOTAL, "operation" => operation, "status" => status).increment(1);
    histogram!(OPERATION_DURATION, "operation" => operation)
        .record(started.elapsed().as_secs_f64());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtgate_core::common::FailureKind;

    #[tokio::test]
    async fn test_observe_records_outcome() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let ok = observe("deposit", async { OperationResult::success("Deposited", ()) }).await;
        assert!(ok.is_success());
        let failed = observe("deposit", async {
            OperationResult::<()>::failure(FailureKind::UnknownToken, "unknown", None)
        })
        .await;
        assert!(!failed.is_success());

        let text = handle.render();
        assert!(text.contains(OPERATIONS_TOTAL));
        assert!(text.contains(r#"status="success""#));
        assert!(text.contains(r#"status="unknown_token""#));
        assert!(text.contains(OPERATION_DURATION));
    }
}
