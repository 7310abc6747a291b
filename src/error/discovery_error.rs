//! 服务发现统一错误类型

use super::code::ErrorCode;
use thiserror::Error;

/// 装箱的底层错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 服务发现调用链的统一错误类型
///
/// `RegistryUnavailable` 与 `ServiceUnavailable` 必须保持区分：
/// 前者表示注册中心本身不可达，后者表示注册中心可达但没有任何实例。
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// 注册中心不可达（传输失败、超时、非 2xx、响应无法解析）
    #[error("registry unavailable while looking up `{service}`: {source}")]
    RegistryUnavailable {
        service: String,
        #[source]
        source: BoxError,
    },

    /// 注册中心可达，但该服务名下没有任何实例
    #[error("no instance registered for service `{service}`")]
    ServiceUnavailable { service: String },

    /// 已解析到实例地址，但对其发起的调用失败
    #[error("call to upstream {uri} failed: {source}")]
    UpstreamCallFailed {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    /// 服务名不合法（例如为空）
    #[error("invalid service name: {0:?}")]
    InvalidServiceName(String),

    /// 服务注册/注销失败
    #[error("registration of `{instance_id}` failed: {source}")]
    Registration {
        instance_id: String,
        #[source]
        source: BoxError,
    },

    /// 配置错误
    #[error("configuration error: {0}")]
    Config(String),
}

/// 服务发现结果类型
pub type Result<T> = std::result::Result<T, DiscoveryError>;

impl DiscoveryError {
    /// 创建注册中心不可达错误
    pub fn registry_unavailable(service: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DiscoveryError::RegistryUnavailable {
            service: service.into(),
            source: source.into(),
        }
    }

    /// 创建服务不可用错误
    pub fn service_unavailable(service: impl Into<String>) -> Self {
        DiscoveryError::ServiceUnavailable {
            service: service.into(),
        }
    }

    /// 创建上游调用失败错误
    pub fn upstream_call_failed(uri: impl Into<String>, source: reqwest::Error) -> Self {
        DiscoveryError::UpstreamCallFailed {
            uri: uri.into(),
            source,
        }
    }

    /// 创建注册失败错误
    pub fn registration(instance_id: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DiscoveryError::Registration {
            instance_id: instance_id.into(),
            source: source.into(),
        }
    }

    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        DiscoveryError::Config(msg.into())
    }

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            DiscoveryError::RegistryUnavailable { .. } => ErrorCode::RegistryUnavailable,
            DiscoveryError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            DiscoveryError::UpstreamCallFailed { .. } => ErrorCode::UpstreamCallFailed,
            DiscoveryError::InvalidServiceName(_) => ErrorCode::InvalidParameter,
            DiscoveryError::Registration { .. } => ErrorCode::RegistrationFailed,
            DiscoveryError::Config(_) => ErrorCode::ConfigurationError,
        }
    }

    pub fn is_registry_unavailable(&self) -> bool {
        matches!(self, DiscoveryError::RegistryUnavailable { .. })
    }

    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, DiscoveryError::ServiceUnavailable { .. })
    }

    pub fn is_upstream_call_failed(&self) -> bool {
        matches!(self, DiscoveryError::UpstreamCallFailed { .. })
    }
}

impl From<toml::de::Error> for DiscoveryError {
    fn from(err: toml::de::Error) -> Self {
        DiscoveryError::Config(format!("invalid TOML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn registry_unavailable_keeps_its_cause() {
        let err = DiscoveryError::registry_unavailable(
            "my-service",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert!(err.is_registry_unavailable());
        assert!(!err.is_service_unavailable());
        assert_eq!(err.code(), ErrorCode::RegistryUnavailable);
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("refused"));
    }

    #[test]
    fn service_unavailable_names_the_service() {
        let err = DiscoveryError::service_unavailable("my-service");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert_eq!(err.to_string(), "no instance registered for service `my-service`");
        assert!(err.source().is_none());
    }

    #[test]
    fn string_sources_are_boxed() {
        let err = DiscoveryError::registration("svc-1", "agent said no");
        assert_eq!(err.code(), ErrorCode::RegistrationFailed);
        assert!(err.to_string().contains("agent said no"));
    }
}
