//! 静态（内存）注册中心后端
//!
//! 实例表来自配置文件，按插入顺序返回。适合本地联调和测试。

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::discovery::backend::{RegistryClient, ensure_service_name};
use crate::discovery::instance::ServiceInstance;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    services: HashMap<String, Vec<ServiceInstance>>,
}

impl StaticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从实例列表构建，按 `service_name` 分组
    pub fn from_instances(instances: impl IntoIterator<Item = ServiceInstance>) -> Self {
        instances
            .into_iter()
            .fold(Self::new(), |backend, instance| backend.with_instance(instance))
    }

    /// 添加实例；未设置实例 ID 时使用 `host:port`
    pub fn with_instance(mut self, mut instance: ServiceInstance) -> Self {
        if instance.instance_id.is_empty() {
            instance.instance_id = format!("{}:{}", instance.host, instance.port);
        }
        self.services
            .entry(instance.service_name.clone())
            .or_default()
            .push(instance);
        self
    }

    /// 已知的服务名
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

#[async_trait]
impl RegistryClient for StaticBackend {
    async fn lookup(&self, service_name: &str) -> Result<Vec<ServiceInstance>> {
        ensure_service_name(service_name)?;

        let instances = self.services.get(service_name).cloned().unwrap_or_default();
        debug!(service = %service_name, count = instances.len(), "Static lookup finished");
        Ok(instances)
    }
}
