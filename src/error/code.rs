//! 错误代码和错误类别定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
///
/// 错误代码按类别分组，每个类别占用1000个代码范围：
/// - 1000-1999: 注册中心相关错误
/// - 2000-2999: 上游调用相关错误
/// - 9000-9999: 通用错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 注册中心相关错误 (1000-1999)
    // ============================================================
    RegistryUnavailable = 1000,
    ServiceUnavailable = 1001,
    RegistrationFailed = 1002,

    // ============================================================
    // 上游调用相关错误 (2000-2999)
    // ============================================================
    UpstreamCallFailed = 2000,

    // ============================================================
    // 通用错误 (9000-9999)
    // ============================================================
    InvalidParameter = 9001,
    ConfigurationError = 9002,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RegistryUnavailable => "REGISTRY_UNAVAILABLE",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::RegistrationFailed => "REGISTRATION_FAILED",
            ErrorCode::UpstreamCallFailed => "UPSTREAM_CALL_FAILED",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// 获取错误代码的类别
    pub fn category(&self) -> ErrorCategory {
        match self.as_u32() {
            1000..=1999 => ErrorCategory::Registry,
            2000..=2999 => ErrorCategory::Upstream,
            _ => ErrorCategory::General,
        }
    }

    /// 对应的 HTTP 状态码
    pub fn http_status(&self) -> http::StatusCode {
        match self {
            ErrorCode::RegistryUnavailable | ErrorCode::ServiceUnavailable => {
                http::StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorCode::UpstreamCallFailed | ErrorCode::RegistrationFailed => {
                http::StatusCode::BAD_GATEWAY
            }
            ErrorCode::InvalidParameter => http::StatusCode::BAD_REQUEST,
            ErrorCode::ConfigurationError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Registry,
    Upstream,
    General,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Registry => write!(f, "REGISTRY"),
            ErrorCategory::Upstream => write!(f, "UPSTREAM"),
            ErrorCategory::General => write!(f, "GENERAL"),
        }
    }
}
