//! Consul 注册中心后端

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::discovery::backend::{RegistryClient, ensure_service_name};
use crate::discovery::config::{HealthCheckConfig, RegistryConfig};
use crate::discovery::instance::ServiceInstance;
use crate::discovery::registration::ServiceRegistrar;
use crate::error::{DiscoveryError, Result};

const TOKEN_HEADER: &str = "X-Consul-Token";

/// `/v1/health/service/:name` 返回的条目
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: NodeEntry,
    service: AgentService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeEntry {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AgentService {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(default)]
    service: String,
    #[serde(default)]
    address: String,
    port: u16,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    meta: Option<HashMap<String, String>>,
}

/// `/v1/agent/service/register` 请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceRegistration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    name: &'a str,
    address: &'a str,
    port: u16,
    tags: Vec<String>,
    meta: HashMap<&'a str, &'a str>,
    check: AgentServiceCheck,
}

#[derive(Debug, Serialize)]
struct AgentServiceCheck {
    #[serde(rename = "HTTP")]
    http: String,
    #[serde(rename = "Interval")]
    interval: String,
    #[serde(rename = "Timeout")]
    timeout: String,
    #[serde(rename = "DeregisterCriticalServiceAfter")]
    deregister_critical_service_after: String,
}

impl HealthEntry {
    fn into_instance(self, service_name: &str) -> ServiceInstance {
        let AgentService {
            id,
            service,
            address,
            port,
            tags,
            meta,
        } = self.service;

        // 服务未单独声明地址时使用节点地址
        let host = if address.is_empty() {
            self.node.address
        } else {
            address
        };
        let name = if service.is_empty() {
            service_name.to_string()
        } else {
            service
        };
        let secure = meta
            .as_ref()
            .and_then(|m| m.get("secure"))
            .map(|v| v == "true")
            .unwrap_or(false);

        let mut instance = ServiceInstance::new(name, host, port).with_secure(secure);
        if !id.is_empty() {
            instance = instance.with_instance_id(id);
        }
        for tag in tags.unwrap_or_default() {
            instance = match tag.split_once('=') {
                Some((key, value)) => instance.with_tag(key, value),
                None => instance.with_tag(tag, "true"),
            };
        }
        instance
    }
}

/// Consul 后端
///
/// 查询与注册都走 Consul HTTP API，持有的 `reqwest::Client` 内部带连接池，可并发使用。
#[derive(Debug, Clone)]
pub struct ConsulBackend {
    http_client: HttpClient,
    base_url: Url,
    passing_only: bool,
    tag: Option<String>,
    datacenter: Option<String>,
    token: Option<String>,
}

impl ConsulBackend {
    /// 创建新的 Consul 后端
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let endpoint = config
            .primary_endpoint()
            .ok_or_else(|| DiscoveryError::config("consul registry needs at least one endpoint"))?;
        let base_url = Url::parse(endpoint)
            .map_err(|e| DiscoveryError::config(format!("invalid consul url {}: {}", endpoint, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DiscoveryError::config(format!("invalid consul url {}", endpoint)));
        }

        let http_client = HttpClient::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DiscoveryError::config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            passing_only: config.passing_only,
            tag: config.tag.clone(),
            datacenter: config.datacenter.clone(),
            token: config.token.clone(),
        })
    }

    /// Consul 地址
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 拼接 API 路径，每个片段单独做百分号编码
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    fn lookup_query(&self) -> Vec<(&'static str, &str)> {
        let mut query = Vec::new();
        if self.passing_only {
            query.push(("passing", "true"));
        }
        if let Some(tag) = &self.tag {
            query.push(("tag", tag.as_str()));
        }
        if let Some(dc) = &self.datacenter {
            query.push(("dc", dc.as_str()));
        }
        query
    }
}

#[async_trait]
impl RegistryClient for ConsulBackend {
    async fn lookup(&self, service_name: &str) -> Result<Vec<ServiceInstance>> {
        ensure_service_name(service_name)?;

        let url = self.api_url(&["v1", "health", "service", service_name]);
        debug!(service = %service_name, url = %url, "Querying consul");

        let request = self.authorized(self.http_client.get(url).query(&self.lookup_query()));
        let resp = request
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| {
                warn!(service = %service_name, error = %e, "Consul query failed");
                DiscoveryError::registry_unavailable(service_name, e)
            })?;

        let entries: Vec<HealthEntry> = resp
            .json()
            .await
            .map_err(|e| DiscoveryError::registry_unavailable(service_name, e))?;

        let instances: Vec<ServiceInstance> = entries
            .into_iter()
            .map(|entry| entry.into_instance(service_name))
            .collect();
        debug!(service = %service_name, count = instances.len(), "Consul lookup finished");

        Ok(instances)
    }
}

#[async_trait]
impl ServiceRegistrar for ConsulBackend {
    async fn register(&self, instance: &ServiceInstance, check: &HealthCheckConfig) -> Result<()> {
        let check_url = instance
            .uri()?
            .join(&check.path)
            .map_err(|e| DiscoveryError::config(format!("invalid health check path: {}", e)))?;

        let mut tags: Vec<String> = instance
            .tags
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        tags.sort();

        let mut meta = HashMap::new();
        if instance.secure {
            meta.insert("secure", "true");
        }

        let payload = AgentServiceRegistration {
            id: &instance.instance_id,
            name: &instance.service_name,
            address: &instance.host,
            port: instance.port,
            tags,
            meta,
            check: AgentServiceCheck {
                http: check_url.to_string(),
                interval: check.interval.clone(),
                timeout: check.timeout.clone(),
                deregister_critical_service_after: check.deregister_after.clone(),
            },
        };

        let url = self.api_url(&["v1", "agent", "service", "register"]);
        self.authorized(self.http_client.put(url).json(&payload))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| DiscoveryError::registration(&instance.instance_id, e))?;

        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<()> {
        let url = self.api_url(&["v1", "agent", "service", "deregister", instance_id]);
        self.authorized(self.http_client.put(url))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| DiscoveryError::registration(instance_id, e))?;

        Ok(())
    }
}
