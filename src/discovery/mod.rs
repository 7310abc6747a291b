//! 服务发现模块
//!
//! 注册中心客户端 → 实例解析 → 实例选择，外加一次性的服务注册。

pub mod backend;
pub mod config;
pub mod factory;
pub mod instance;
pub mod registration;
pub mod resolver;
pub mod selector;

pub use backend::{ConsulBackend, RegistryClient, StaticBackend};
pub use config::{BackendType, HealthCheckConfig, RegistryConfig};
pub use factory::DiscoveryFactory;
pub use instance::ServiceInstance;
pub use registration::{ServiceRegistrar, ServiceRegistration, advertised_instance};
pub use resolver::InstanceResolver;
pub use selector::{FirstInstance, InstanceSelector};
