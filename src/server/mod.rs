//! HTTP 服务端模块
//!
//! 暴露三个端点：
//! - `GET /ping` 固定返回 `pong`
//! - `GET /discoveryClient` 解析目标服务并调用其 `/ping`
//! - `GET /health` 健康状态

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::client::ForwardingClient;
use crate::error::{DiscoveryError, Result};
use crate::health::{HealthReport, HealthService};

/// 路由共享状态
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: ForwardingClient,
    /// `/discoveryClient` 要调用的服务名
    pub target_service: String,
    pub health: HealthService,
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/discoveryClient", get(discovery_ping))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn ping() -> &'static str {
    "pong"
}

async fn discovery_ping(State(state): State<AppState>) -> std::result::Result<String, DiscoveryError> {
    state.client.call_ping(&state.target_service).await
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.health.report().await;
    let status = if report.status.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// HTTP 服务器
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// 绑定监听地址，端口为 0 时由系统分配
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DiscoveryError::config(format!("cannot bind {}: {}", addr, e)))?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| DiscoveryError::config(format!("listener has no local address: {}", e)))
    }

    /// 运行直到 `shutdown` 完成
    pub async fn serve<F>(self, router: Router, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "HTTP server listening");
        }
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientBuilder;
    use crate::discovery::{InstanceResolver, ServiceInstance, StaticBackend};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with(instances: Vec<ServiceInstance>) -> AppState {
        let resolver = InstanceResolver::new(Arc::new(StaticBackend::from_instances(instances)));
        AppState {
            client: ClientBuilder::new().build(resolver).unwrap(),
            target_service: "my-service".to_string(),
            health: HealthService::new("discovery-client", "0.1.0"),
        }
    }

    async fn get_path(app: Router, path: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn ping_returns_pong() {
        let (status, body) = get_path(router(state_with(vec![])), "/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn discovery_without_instances_is_503_with_code() {
        let (status, body) = get_path(router(state_with(vec![])), "/discoveryClient").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn discovery_forwards_upstream_body() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/ping").with_body("pong").create_async().await;
        let port = url::Url::parse(&server.url()).unwrap().port().unwrap();

        let state = state_with(vec![ServiceInstance::new("my-service", "127.0.0.1", port)]);
        let (status, body) = get_path(router(state), "/discoveryClient").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn failing_upstream_is_502() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/ping").with_status(503).create_async().await;
        let port = url::Url::parse(&server.url()).unwrap().port().unwrap();

        let state = state_with(vec![ServiceInstance::new("my-service", "127.0.0.1", port)]);
        let (status, body) = get_path(router(state), "/discoveryClient").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], "UPSTREAM_CALL_FAILED");
    }

    #[tokio::test]
    async fn unparsable_instance_address_is_503_registry_unavailable() {
        let state = state_with(vec![ServiceInstance::new("my-service", "bad host", 8081)]);
        let (status, body) = get_path(router(state), "/discoveryClient").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], "REGISTRY_UNAVAILABLE");
    }

    #[tokio::test]
    async fn health_follows_service_state() {
        let state = state_with(vec![]);
        let health = state.health.clone();
        let app = router(state);

        let (status, _) = get_path(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        health.set_serving().await;
        let (status, body) = get_path(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"UP\""));
    }
}
