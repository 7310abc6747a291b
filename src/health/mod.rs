//! 健康检查模块
//!
//! `/health` 端点的状态来源，也是注册中心 HTTP 检查的目标

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    #[serde(rename = "UNKNOWN")]
    Unknown,
    #[serde(rename = "UP")]
    Serving,
    #[serde(rename = "DOWN")]
    NotServing,
}

impl HealthStatus {
    pub fn is_serving(&self) -> bool {
        matches!(self, HealthStatus::Serving)
    }
}

/// `/health` 响应体
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
}

/// 健康检查服务
#[derive(Debug, Clone)]
pub struct HealthService {
    service: String,
    version: String,
    status: Arc<RwLock<HealthStatus>>,
}

impl HealthService {
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            status: Arc::new(RwLock::new(HealthStatus::Unknown)),
        }
    }

    pub async fn set_status(&self, status: HealthStatus) {
        *self.status.write().await = status;
    }

    pub async fn status(&self) -> HealthStatus {
        *self.status.read().await
    }

    pub async fn set_serving(&self) {
        self.set_status(HealthStatus::Serving).await;
    }

    pub async fn set_not_serving(&self) {
        self.set_status(HealthStatus::NotServing).await;
    }

    pub async fn report(&self) -> HealthReport {
        HealthReport {
            status: self.status().await,
            service: self.service.clone(),
            version: self.version.clone(),
        }
    }
}
