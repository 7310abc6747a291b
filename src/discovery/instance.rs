//! 服务实例定义

use std::collections::HashMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DiscoveryError, Result};

/// 服务实例
///
/// 注册中心在查询时返回的不可变快照，每次查询都会重新创建。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    /// 服务名（如 "my-service"）
    pub service_name: String,

    /// 实例 ID
    #[serde(default)]
    pub instance_id: String,

    /// 主机名或 IP
    pub host: String,

    /// 端口
    pub port: u16,

    /// 是否使用 https
    #[serde(default)]
    pub secure: bool,

    /// 自定义标签
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl ServiceInstance {
    /// 创建新的服务实例，实例 ID 默认为 `host:port`
    pub fn new(service_name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            service_name: service_name.into(),
            instance_id: format!("{}:{}", host, port),
            host,
            port,
            secure: false,
            tags: HashMap::new(),
        }
    }

    /// 设置实例 ID
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    /// 添加标签
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// 设置是否使用 https
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    /// 基础地址，如 `http://127.0.0.1:8081/`
    pub fn uri(&self) -> Result<Url> {
        // IPv6 字面量需要方括号
        let host = match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{}]", v6),
            _ => self.host.clone(),
        };
        let raw = format!("{}://{}:{}", self.scheme(), host, self.port);
        Url::parse(&raw).map_err(|e| {
            DiscoveryError::config(format!(
                "instance {} has an invalid address {}: {}",
                self.instance_id, raw, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_is_scheme_host_port() {
        let inst = ServiceInstance::new("my-service", "127.0.0.1", 8081);
        assert_eq!(inst.uri().unwrap().as_str(), "http://127.0.0.1:8081/");
        assert_eq!(inst.instance_id, "127.0.0.1:8081");
    }

    #[test]
    fn secure_instances_use_https() {
        let inst = ServiceInstance::new("my-service", "svc.internal", 8443).with_secure(true);
        assert_eq!(inst.uri().unwrap().as_str(), "https://svc.internal:8443/");
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let inst = ServiceInstance::new("my-service", "::1", 8081);
        assert_eq!(inst.uri().unwrap().as_str(), "http://[::1]:8081/");
    }

    #[test]
    fn invalid_host_is_reported() {
        let inst = ServiceInstance::new("my-service", "bad host", 80);
        assert!(inst.uri().is_err());
    }
}
