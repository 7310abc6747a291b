//! 服务运行时实现
//!
//! 把配置装配成完整的服务：
//! - 注册中心客户端 → 实例解析 → 转发客户端 → HTTP 路由
//! - 可选的一次性服务注册
//! - 优雅停机（健康状态置为 DOWN → 等待在途请求 → 注销）

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::client::{ClientConfig, ForwardingClient};
use crate::config::Config;
use crate::discovery::{
    DiscoveryFactory, InstanceResolver, ServiceRegistration, advertised_instance,
};
use crate::health::HealthService;
use crate::runtime::config::RuntimeConfig;
use crate::server::{AppState, HttpServer, router};

/// 服务运行时
///
/// # 使用示例
/// ```rust,no_run
/// use flare_discovery::{Config, ServiceRuntime};
///
/// # async fn run() -> anyhow::Result<()> {
/// let config = Config::load_from_file("discovery.toml")?;
/// ServiceRuntime::new(config).run().await?;
/// # Ok(())
/// # }
/// ```
pub struct ServiceRuntime {
    config: Config,
    runtime_config: RuntimeConfig,
}

/// 已启动的服务
pub struct RunningService {
    local_addr: SocketAddr,
    health: HealthService,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<Result<()>>,
}

impl ServiceRuntime {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// 设置运行时配置
    pub fn with_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }

    /// 按配置装配路由状态
    pub fn build_state(config: &Config) -> Result<AppState> {
        let registry = DiscoveryFactory::create_backend(&config.registry)?;
        let resolver = InstanceResolver::new(registry);
        let client = ForwardingClient::new(resolver, ClientConfig::from(&config.forward))?;

        Ok(AppState {
            client,
            target_service: config.forward.target_service.clone(),
            health: HealthService::new(&config.service.name, &config.service.version),
        })
    }

    /// 启动服务并立即返回
    pub async fn start(self) -> Result<RunningService> {
        let ServiceRuntime {
            config,
            runtime_config,
        } = self;
        config.validate()?;

        let state = Self::build_state(&config)?;
        let health = state.health.clone();

        let bind: SocketAddr = format!("{}:{}", config.server.address, config.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid server address {}:{}",
                    config.server.address, config.server.port
                )
            })?;
        let server = HttpServer::bind(bind).await?;
        let local_addr = server.local_addr()?;

        // 端口为 0 时注册实际分配的端口
        let registration = if config.registry.register {
            let registrar = DiscoveryFactory::create_registrar(&config.registry)?;
            let instance = advertised_instance(
                &config.service.name,
                &config.server.address,
                local_addr.port(),
            );
            Some(
                ServiceRegistration::register(registrar, instance, &config.registry.health_check)
                    .await?,
            )
        } else {
            None
        };

        health.set_serving().await;
        info!(
            service = %config.service.name,
            %local_addr,
            target = %config.forward.target_service,
            "🚀 Service started"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let shutdown_health = health.clone();
        let shutdown = async move {
            let _ = shutdown_rx.await;
            shutdown_health.set_not_serving().await;
            info!("Shutdown signal received");
        };

        let service_name = config.service.name.clone();
        let app = router(state);
        let join = tokio::spawn(async move {
            let served = server.serve(app, shutdown).await;
            if let Err(e) = &served {
                error!(error = %e, "❌ HTTP server failed");
            }

            if let Some(mut registration) = registration {
                match tokio::time::timeout(runtime_config.shutdown_timeout, registration.shutdown()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, "⚠️ Failed to shutdown service registration gracefully"),
                    Err(_) => warn!("⚠️ Deregistration timeout"),
                }
            }

            info!(service_name = %service_name, "Service runtime stopped");
            served.context("HTTP server failed")
        });

        Ok(RunningService {
            local_addr,
            health,
            shutdown_tx: Some(shutdown_tx),
            join,
        })
    }

    /// 启动服务，直到收到 Ctrl+C / SIGTERM
    pub async fn run(self) -> Result<()> {
        let handle_signals = self.runtime_config.handle_signals;
        let shutdown_timeout = self.runtime_config.shutdown_timeout;
        let running = self.start().await?;

        if handle_signals {
            wait_for_signal().await;
        } else {
            std::future::pending::<()>().await;
        }

        running.stop_within(shutdown_timeout).await
    }
}

impl RunningService {
    /// 实际监听地址
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn health(&self) -> &HealthService {
        &self.health
    }

    /// 触发优雅停机并等待结束
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.join.await.context("service task panicked")?
    }

    /// 停机，等待在途请求和注销；超过 `2 × timeout` 返回错误
    pub async fn stop_within(self, timeout: std::time::Duration) -> Result<()> {
        match tokio::time::timeout(timeout * 2, self.stop()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Shutdown timeout, forcing exit");
                anyhow::bail!("shutdown timed out after {:?}", timeout * 2)
            }
        }
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutdown signal received (Ctrl+C)"),
        _ = terminate => info!("Shutdown signal received (SIGTERM)"),
    }
}
