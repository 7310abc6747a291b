//! Flare Discovery 错误处理模块
//!
//! 提供统一的错误类型、错误代码分类，以及到 HTTP 响应的转换

pub mod code;
pub mod discovery_error;

pub use code::{ErrorCategory, ErrorCode};
pub use discovery_error::{BoxError, DiscoveryError, Result};

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// HTTP 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&DiscoveryError> for ErrorBody {
    fn from(err: &DiscoveryError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for DiscoveryError {
    fn into_response(self) -> Response {
        let code = self.code();
        (code.http_status(), Json(ErrorBody::from(&self))).into_response()
    }
}
