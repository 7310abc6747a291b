//! Flare Discovery Library
//!
//! 基于注册中心的服务解析与请求转发：把逻辑服务名解析为一个存活实例的地址，
//! 并对其发起 HTTP 调用；没有实例、注册中心不可达、上游调用失败三种失败各自独立。

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod health;
pub mod logging;
pub mod runtime;
pub mod server;

// Re-exports
pub use client::{ClientBuilder, ClientConfig, ForwardingClient};
pub use config::{Config, ForwardConfig, LogConfig, LogFormat, ServerConfig, ServiceConfig};
pub use discovery::{
    BackendType, ConsulBackend, DiscoveryFactory, FirstInstance, HealthCheckConfig,
    InstanceResolver, InstanceSelector, RegistryClient, RegistryConfig, ServiceInstance,
    ServiceRegistrar, ServiceRegistration, StaticBackend,
};
pub use error::{DiscoveryError, ErrorCategory, ErrorCode, Result};
pub use health::{HealthService, HealthStatus};
pub use logging::init_tracing;
pub use runtime::{RunningService, RuntimeConfig, ServiceRuntime};
pub use server::{AppState, HttpServer, router};
