//! 服务注册
//!
//! 一次性注册：启动时把本进程注册到注册中心，由注册中心自己执行 HTTP 健康检查，
//! 优雅关闭时注销。不发送心跳。

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::discovery::config::HealthCheckConfig;
use crate::discovery::instance::ServiceInstance;
use crate::error::Result;

/// 服务注册器 trait
#[async_trait]
pub trait ServiceRegistrar: Send + Sync {
    /// 注册实例，并让注册中心按 `check` 探活
    async fn register(&self, instance: &ServiceInstance, check: &HealthCheckConfig) -> Result<()>;

    /// 注销实例
    async fn deregister(&self, instance_id: &str) -> Result<()>;
}

/// 生成对外公布的实例
///
/// 0.0.0.0 / :: 这类监听地址对其他进程不可达，替换为回环地址。
/// 实例 ID 格式：`{name}-{port}-{8 位随机}`
pub fn advertised_instance(service_name: &str, bind_address: &str, port: u16) -> ServiceInstance {
    let host = match bind_address.parse::<IpAddr>() {
        Ok(ip) if ip.is_unspecified() && ip.is_ipv4() => Ipv4Addr::LOCALHOST.to_string(),
        Ok(ip) if ip.is_unspecified() => Ipv6Addr::LOCALHOST.to_string(),
        _ => bind_address.to_string(),
    };
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let instance_id = format!("{}-{}-{}", service_name, port, &suffix[..8]);

    ServiceInstance::new(service_name, host, port).with_instance_id(instance_id)
}

/// 注册守卫
///
/// 持有一次成功的注册；应在服务关闭前显式调用 [`ServiceRegistration::shutdown`]，
/// 而不是依赖 Drop。
pub struct ServiceRegistration {
    registrar: Arc<dyn ServiceRegistrar>,
    instance: ServiceInstance,
    registered: bool,
}

impl ServiceRegistration {
    /// 注册实例并返回守卫
    pub async fn register(
        registrar: Arc<dyn ServiceRegistrar>,
        instance: ServiceInstance,
        check: &HealthCheckConfig,
    ) -> Result<Self> {
        registrar.register(&instance, check).await?;
        info!(
            service = %instance.service_name,
            instance_id = %instance.instance_id,
            host = %instance.host,
            port = instance.port,
            "✅ Service registered"
        );

        Ok(Self {
            registrar,
            instance,
            registered: true,
        })
    }

    /// 获取服务实例
    pub fn instance(&self) -> &ServiceInstance {
        &self.instance
    }

    /// 优雅关闭：注销服务，重复调用无副作用
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.registered {
            return Ok(());
        }
        self.registered = false;

        let instance_id = &self.instance.instance_id;
        match self.registrar.deregister(instance_id).await {
            Ok(()) => {
                info!(instance_id = %instance_id, "✅ Service deregistered");
                Ok(())
            }
            Err(e) => {
                warn!(instance_id = %instance_id, error = %e, "⚠️ Failed to deregister service");
                Err(e)
            }
        }
    }
}

impl Drop for ServiceRegistration {
    fn drop(&mut self) {
        if !self.registered {
            return;
        }
        // 没有显式 shutdown：尽力在当前 runtime 上注销
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let registrar = self.registrar.clone();
            let instance_id = self.instance.instance_id.clone();
            handle.spawn(async move {
                if let Err(e) = registrar.deregister(&instance_id).await {
                    warn!(
                        instance_id = %instance_id,
                        error = %e,
                        "⚠️ Failed to deregister service (from Drop)"
                    );
                }
            });
        } else {
            warn!(
                instance_id = %self.instance.instance_id,
                "⚠️ Cannot deregister service: tokio runtime not available"
            );
        }
    }
}
