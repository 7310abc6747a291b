//! 转发调用客户端
//!
//! 解析服务名 → 拼接固定路径 → GET，原样返回响应体

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::config::ForwardConfig;
use crate::discovery::InstanceResolver;
use crate::error::{DiscoveryError, Result};

/// 检查转发路径：必须是以单个 `/` 开头的绝对路径
///
/// `//host/...` 和 `/\\host/...` 会被当作协议相对地址，指向另一个主机。
pub fn check_path(path: &str) -> Result<()> {
    match path.strip_prefix('/') {
        Some(rest) if !rest.starts_with(['/', '\\']) => Ok(()),
        _ => Err(DiscoveryError::config(format!(
            "path must be absolute and start with a single '/': {:?}",
            path
        ))),
    }
}

/// 把路径拼到实例基础地址上，结果必须仍然指向该实例
pub fn target_url(base: &Url, path: &str) -> Result<Url> {
    check_path(path)?;
    let target = base
        .join(path)
        .map_err(|e| DiscoveryError::config(format!("cannot resolve {} against {}: {}", path, base, e)))?;
    if target.origin() != base.origin() {
        return Err(DiscoveryError::config(format!(
            "path {:?} escapes instance {}",
            path, base
        )));
    }
    Ok(target)
}

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `call_ping` 使用的固定路径
    pub path: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            path: "/ping".to_string(),
            connect_timeout: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ForwardConfig> for ClientConfig {
    fn from(config: &ForwardConfig) -> Self {
        Self {
            path: config.path.clone(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// 客户端构建器
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self, resolver: InstanceResolver) -> Result<ForwardingClient> {
        let http = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| DiscoveryError::config(format!("failed to build http client: {}", e)))?;

        Ok(ForwardingClient {
            resolver,
            http,
            config: self.config,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 转发客户端
///
/// 不持有可变状态，`Clone` 后可在多个请求间并发使用。
#[derive(Debug, Clone)]
pub struct ForwardingClient {
    resolver: InstanceResolver,
    http: reqwest::Client,
    config: ClientConfig,
}

impl ForwardingClient {
    pub fn new(resolver: InstanceResolver, config: ClientConfig) -> Result<Self> {
        ClientBuilder::new().config(config).build(resolver)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 对服务的固定路径（默认 `/ping`）发起 GET
    ///
    /// # 错误
    /// * `RegistryUnavailable` - 注册中心不可达，不会发起转发调用
    /// * `ServiceUnavailable` - 没有任何实例
    /// * `UpstreamCallFailed` - 实例存在但调用失败（连接失败、超时、非 2xx）
    pub async fn call_ping(&self, service_name: &str) -> Result<String> {
        self.call(service_name, &self.config.path).await
    }

    /// 对服务的任意路径发起 GET
    ///
    /// `path` 按绝对路径解析，会替换基础地址上已有的路径。
    pub async fn call(&self, service_name: &str, path: &str) -> Result<String> {
        check_path(path)?;
        let base = self
            .resolver
            .resolve(service_name)
            .await?
            .ok_or_else(|| DiscoveryError::service_unavailable(service_name))?;

        let target = target_url(&base, path)?;
        debug!(service = %service_name, target = %target, "Forwarding call");

        let resp = self
            .http
            .get(target.clone())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| {
                warn!(service = %service_name, target = %target, error = %e, "Upstream call failed");
                DiscoveryError::upstream_call_failed(target.as_str(), e)
            })?;

        resp.text()
            .await
            .map_err(|e| DiscoveryError::upstream_call_failed(target.as_str(), e))
    }
}
