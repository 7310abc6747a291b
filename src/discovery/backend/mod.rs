//! 注册中心客户端抽象和实现

pub mod consul;
pub mod memory;

use async_trait::async_trait;

use crate::discovery::instance::ServiceInstance;
use crate::error::{DiscoveryError, Result};

pub use consul::ConsulBackend;
pub use memory::StaticBackend;

/// 注册中心客户端 trait
///
/// 所有后端都需要实现这个 trait；调用链通过 `Arc<dyn RegistryClient>` 显式注入。
/// 由于需要动态分发（dyn），使用 async-trait
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// 查询某个服务名下当前已知的全部实例
    ///
    /// # 返回
    /// * `Ok(vec![])` - 注册中心可达但没有实例，这是正常结果
    /// * `Err(DiscoveryError::RegistryUnavailable)` - 注册中心本身不可达
    async fn lookup(&self, service_name: &str) -> Result<Vec<ServiceInstance>>;
}

/// 拒绝空服务名，在发起任何网络请求之前调用
pub(crate) fn ensure_service_name(service_name: &str) -> Result<()> {
    if service_name.trim().is_empty() {
        return Err(DiscoveryError::InvalidServiceName(service_name.to_string()));
    }
    Ok(())
}
