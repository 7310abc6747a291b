//! 服务名解析
//!
//! 把逻辑服务名解析成一个具体的基础地址。没有实例是正常结果（`Ok(None)`），
//! 注册中心不可达时原样返回错误。

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::discovery::backend::RegistryClient;
use crate::discovery::instance::ServiceInstance;
use crate::discovery::selector::{FirstInstance, InstanceSelector};
use crate::error::{DiscoveryError, Result};

#[derive(Clone)]
pub struct InstanceResolver {
    registry: Arc<dyn RegistryClient>,
    selector: Arc<dyn InstanceSelector>,
}

impl InstanceResolver {
    /// 使用默认的 [`FirstInstance`] 策略
    pub fn new(registry: Arc<dyn RegistryClient>) -> Self {
        Self::with_selector(registry, Arc::new(FirstInstance))
    }

    pub fn with_selector(registry: Arc<dyn RegistryClient>, selector: Arc<dyn InstanceSelector>) -> Self {
        Self { registry, selector }
    }

    /// 解析出被选中的实例
    pub async fn resolve_instance(&self, service_name: &str) -> Result<Option<ServiceInstance>> {
        let instances = self.registry.lookup(service_name).await?;
        let chosen = self.selector.select(&instances).cloned();

        match &chosen {
            Some(instance) => debug!(
                service = %service_name,
                candidates = instances.len(),
                instance_id = %instance.instance_id,
                "Instance selected"
            ),
            None => info!(service = %service_name, "No instance registered"),
        }
        Ok(chosen)
    }

    /// 解析出被选中实例的基础地址
    pub async fn resolve(&self, service_name: &str) -> Result<Option<Url>> {
        match self.resolve_instance(service_name).await? {
            // 地址无法解析是注册中心返回了不可用的数据
            Some(instance) => instance
                .uri()
                .map(Some)
                .map_err(|e| DiscoveryError::registry_unavailable(service_name, e)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for InstanceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceResolver").finish_non_exhaustive()
    }
}
