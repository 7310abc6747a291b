//! 端到端测试
//!
//! 启动真实的 HTTP 服务：一个扮演 `my-service`，一个扮演发现客户端，
//! 注册中心用 static 后端或 mockito 模拟的 Consul。
//!
//! 大部分用例监听 `127.0.0.1:0`，由系统分配端口，避免并行测试抢占同一端口；
//! `fixed_port_scenario` 固定使用 `127.0.0.1:8081`，端口被占用时跳过。

use flare_discovery::{
    BackendType, Config, RunningService, RuntimeConfig, ServiceInstance, ServiceRuntime,
};
use mockito::Matcher;
use std::time::Duration;
use tokio::net::TcpListener;

fn base_config(name: &str) -> Config {
    let mut config = Config::default();
    config.service.name = name.to_string();
    config.server.address = "127.0.0.1".to_string();
    config.server.port = 0;
    config
}

async fn start(config: Config) -> RunningService {
    ServiceRuntime::new(config)
        .with_config(RuntimeConfig::new().with_shutdown_timeout(Duration::from_secs(2)))
        .start()
        .await
        .expect("failed to start service")
}

/// 被发现的一方：只需要 `/ping`
async fn start_my_service() -> RunningService {
    let mut config = base_config("my-service");
    config.registry.registry_type = BackendType::Static;
    start(config).await
}

async fn get(url: String) -> (reqwest::StatusCode, String) {
    let resp = reqwest::get(url).await.expect("request failed");
    let status = resp.status();
    (status, resp.text().await.unwrap())
}

#[tokio::test]
async fn discovery_call_returns_pong_from_registered_instance() {
    let my_service = start_my_service().await;
    let port = my_service.local_addr().port();

    let mut config = base_config("discovery-client");
    config.registry.registry_type = BackendType::Static;
    config.registry.instances = vec![ServiceInstance::new("my-service", "127.0.0.1", port)];
    let client = start(config).await;

    let (status, body) = get(format!("http://{}/discoveryClient", client.local_addr())).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, "pong");

    client.stop().await.unwrap();
    my_service.stop().await.unwrap();
}

#[tokio::test]
async fn empty_registry_yields_service_unavailable() {
    let mut config = base_config("discovery-client");
    config.registry.registry_type = BackendType::Static;
    let client = start(config).await;

    let (status, body) = get(format!("http://{}/discoveryClient", client.local_addr())).await;
    assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("SERVICE_UNAVAILABLE"), "body: {body}");

    client.stop().await.unwrap();
}

#[tokio::test]
async fn dead_registry_yields_registry_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let mut config = base_config("discovery-client");
    config.registry.endpoints = vec![format!("http://{}", dead)];
    config.registry.timeout_ms = 1_000;
    let client = start(config).await;

    let (status, body) = get(format!("http://{}/discoveryClient", client.local_addr())).await;
    assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("REGISTRY_UNAVAILABLE"), "body: {body}");

    client.stop().await.unwrap();
}

#[tokio::test]
async fn registered_service_is_discovered_through_consul() {
    let mut consul = mockito::Server::new_async().await;

    let register = consul
        .mock("PUT", "/v1/agent/service/register")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "Name": "my-service",
            "Address": "127.0.0.1"
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let deregister = consul
        .mock("PUT", Matcher::Regex(r"^/v1/agent/service/deregister/my-service-\d+-[0-9a-f]{8}$".to_string()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    // my-service 注册自己
    let mut config = base_config("my-service");
    config.registry.endpoints = vec![consul.url()];
    config.registry.register = true;
    let my_service = start(config).await;
    let port = my_service.local_addr().port();
    register.assert_async().await;

    consul
        .mock("GET", "/v1/health/service/my-service")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"[{{"Node": {{"Address": "127.0.0.1"}}, "Service": {{"ID": "my-service-{port}", "Service": "my-service", "Address": "127.0.0.1", "Port": {port}, "Tags": []}}}}]"#
        ))
        .create_async()
        .await;

    let mut config = base_config("discovery-client");
    config.registry.endpoints = vec![consul.url()];
    let client = start(config).await;

    let (status, body) = get(format!("http://{}/discoveryClient", client.local_addr())).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, "pong");

    client.stop().await.unwrap();
    my_service.stop().await.unwrap();
    deregister.assert_async().await;
}

#[tokio::test]
async fn health_reports_up_while_running() {
    let my_service = start_my_service().await;
    assert!(my_service.health().status().await.is_serving());

    let (status, body) = get(format!("http://{}/health", my_service.local_addr())).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert!(body.contains("\"UP\""));

    let health = my_service.health().clone();
    my_service.stop().await.unwrap();
    assert!(!health.status().await.is_serving());
}

#[tokio::test]
async fn fixed_port_scenario() {
    let mut config = base_config("my-service");
    config.registry.registry_type = BackendType::Static;
    config.server.port = 8081;
    let my_service = match ServiceRuntime::new(config).start().await {
        Ok(running) => running,
        Err(e) => {
            eprintln!("127.0.0.1:8081 unavailable, skipping: {e:#}");
            return;
        }
    };

    let mut config = base_config("discovery-client");
    config.registry.registry_type = BackendType::Static;
    config.registry.instances = vec![ServiceInstance::new("my-service", "127.0.0.1", 8081)];
    let client = start(config).await;

    let (status, body) = get(format!("http://{}/discoveryClient", client.local_addr())).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, "pong");

    client.stop().await.unwrap();
    my_service.stop().await.unwrap();
}

#[tokio::test]
async fn stuck_shutdown_is_reported_as_error() {
    // 接受连接但从不响应的上游
    let upstream = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = upstream.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = upstream.accept().await {
            held.push(socket);
        }
    });

    let mut config = base_config("discovery-client");
    config.registry.registry_type = BackendType::Static;
    config.registry.instances = vec![ServiceInstance::new("my-service", "127.0.0.1", port)];
    let client = start(config).await;

    let url = format!("http://{}/discoveryClient", client.local_addr());
    tokio::spawn(async move {
        let _ = reqwest::get(url).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let err = client
        .stop_within(Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("shutdown timed out"), "{err:#}");
}
