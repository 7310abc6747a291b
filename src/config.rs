use serde::{Deserialize, Serialize};

use crate::discovery::config::RegistryConfig;
use crate::error::{DiscoveryError, Result};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "FLARE_DISCOVERY_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "discovery-client".to_string(),
            version: default_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 转发调用配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForwardConfig {
    /// 要发现并调用的服务名
    #[serde(default = "default_target_service")]
    pub target_service: String,
    /// 对目标实例调用的固定路径
    #[serde(default = "default_forward_path")]
    pub path: String,
    #[serde(default = "default_forward_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_target_service() -> String {
    "my-service".to_string()
}

fn default_forward_path() -> String {
    "/ping".to_string()
}

fn default_forward_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            target_service: default_target_service(),
            path: default_forward_path(),
            timeout_ms: default_forward_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DiscoveryError::config(format!("cannot read {}: {}", path, e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// 用 `FLARE_DISCOVERY_*` 环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// 按键名（不含前缀）查找覆盖值
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| DiscoveryError::config(format!("invalid PORT: {}", port)))?;
        }
        if let Some(kind) = lookup("REGISTRY_TYPE") {
            self.registry.registry_type = kind.parse().map_err(DiscoveryError::config)?;
        }
        if let Some(urls) = lookup("REGISTRY_URL") {
            self.registry.endpoints = urls
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(flag) = lookup("PASSING_ONLY") {
            self.registry.passing_only = flag == "true";
        }
        if let Some(target) = lookup("TARGET_SERVICE") {
            self.forward.target_service = target;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        use crate::discovery::config::BackendType;

        if self.service.name.trim().is_empty() {
            return Err(DiscoveryError::config("service.name must not be empty"));
        }
        if self.forward.target_service.trim().is_empty() {
            return Err(DiscoveryError::config("forward.target_service must not be empty"));
        }
        crate::client::check_path(&self.forward.path)?;
        match self.registry.registry_type {
            BackendType::Consul if self.registry.endpoints.is_empty() => {
                Err(DiscoveryError::config("consul registry needs at least one endpoint"))
            }
            BackendType::Static if self.registry.register => Err(DiscoveryError::config(
                "registry.register is only supported by the consul backend",
            )),
            _ => Ok(()),
        }
    }
}
