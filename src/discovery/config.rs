//! 服务发现配置

use serde::{Deserialize, Serialize};

use crate::discovery::instance::ServiceInstance;

/// 后端类型：consul, static
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    #[default]
    Consul,
    Static,
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "consul" => Ok(BackendType::Consul),
            "static" | "memory" => Ok(BackendType::Static),
            _ => Err(format!("Unknown backend type: {}", s)),
        }
    }
}

/// 注册中心配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// 后端类型
    #[serde(default)]
    pub registry_type: BackendType,

    /// 注册中心地址（consul 只使用第一个）
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// 查询超时（毫秒）
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// 只返回通过健康检查的实例
    #[serde(default)]
    pub passing_only: bool,

    /// 按 tag 过滤（consul）
    #[serde(default)]
    pub tag: Option<String>,

    /// 数据中心（consul）
    #[serde(default)]
    pub datacenter: Option<String>,

    /// ACL token（consul，以 `X-Consul-Token` 头发送）
    #[serde(default)]
    pub token: Option<String>,

    /// 启动时是否把本进程注册到注册中心
    #[serde(default)]
    pub register: bool,

    /// 注册时附带的健康检查
    #[serde(default)]
    pub health_check: HealthCheckConfig,

    /// static 后端的实例表
    #[serde(default)]
    pub instances: Vec<ServiceInstance>,
}

fn default_endpoints() -> Vec<String> {
    vec!["http://127.0.0.1:8500".to_string()]
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_type: BackendType::default(),
            endpoints: default_endpoints(),
            timeout_ms: default_timeout_ms(),
            passing_only: false,
            tag: None,
            datacenter: None,
            token: None,
            register: false,
            health_check: HealthCheckConfig::default(),
            instances: Vec::new(),
        }
    }
}

impl RegistryConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    /// 第一个注册中心地址
    pub fn primary_endpoint(&self) -> Option<&str> {
        self.endpoints.first().map(|s| s.trim_end_matches('/'))
    }
}

/// 健康检查配置（由注册中心对本进程执行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// 检查路径（HTTP）
    #[serde(default = "default_check_path")]
    pub path: String,

    /// 检查间隔，Consul 时长格式
    #[serde(default = "default_check_interval")]
    pub interval: String,

    /// 检查超时
    #[serde(default = "default_check_timeout")]
    pub timeout: String,

    /// 持续 critical 多久后自动注销
    #[serde(default = "default_deregister_after")]
    pub deregister_after: String,
}

fn default_check_path() -> String {
    "/health".to_string()
}

fn default_check_interval() -> String {
    "10s".to_string()
}

fn default_check_timeout() -> String {
    "5s".to_string()
}

fn default_deregister_after() -> String {
    "90s".to_string()
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: default_check_path(),
            interval: default_check_interval(),
            timeout: default_check_timeout(),
            deregister_after: default_deregister_after(),
        }
    }
}
