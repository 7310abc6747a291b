//! 服务发现工厂
//!
//! 按配置构建注册中心客户端和注册器

use std::sync::Arc;

use tracing::info;

use crate::discovery::backend::{ConsulBackend, RegistryClient, StaticBackend};
use crate::discovery::config::{BackendType, RegistryConfig};
use crate::discovery::registration::ServiceRegistrar;
use crate::error::{DiscoveryError, Result};

/// 服务发现工厂
pub struct DiscoveryFactory;

impl DiscoveryFactory {
    /// 从配置创建注册中心客户端
    pub fn create_backend(config: &RegistryConfig) -> Result<Arc<dyn RegistryClient>> {
        match config.registry_type {
            BackendType::Consul => {
                let backend = ConsulBackend::new(config)?;
                info!(url = %backend.base_url(), "Using consul registry");
                Ok(Arc::new(backend))
            }
            BackendType::Static => {
                let backend = StaticBackend::from_instances(config.instances.iter().cloned());
                info!(instances = config.instances.len(), "Using static registry");
                Ok(Arc::new(backend))
            }
        }
    }

    /// 从配置创建注册器，只有 consul 支持注册
    pub fn create_registrar(config: &RegistryConfig) -> Result<Arc<dyn ServiceRegistrar>> {
        match config.registry_type {
            BackendType::Consul => Ok(Arc::new(ConsulBackend::new(config)?)),
            BackendType::Static => Err(DiscoveryError::config(
                "static registry does not accept registrations",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::instance::ServiceInstance;

    #[tokio::test]
    async fn static_backend_serves_configured_instances() {
        let config = RegistryConfig {
            registry_type: BackendType::Static,
            instances: vec![ServiceInstance::new("my-service", "127.0.0.1", 8081)],
            ..Default::default()
        };

        let backend = DiscoveryFactory::create_backend(&config).unwrap();
        let found = backend.lookup("my-service").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(DiscoveryFactory::create_registrar(&config).is_err());
    }

    #[test]
    fn consul_backend_needs_an_endpoint() {
        let config = RegistryConfig {
            endpoints: vec![],
            ..Default::default()
        };
        assert!(DiscoveryFactory::create_backend(&config).is_err());
        assert!(DiscoveryFactory::create_registrar(&config).is_err());
    }
}
