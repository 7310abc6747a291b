//! 服务运行时
//!
//! 统一管理服务的生命周期：装配、可选注册、对外服务、优雅停机和注销。

pub mod config;
pub mod runtime;

pub use config::RuntimeConfig;
pub use runtime::{RunningService, ServiceRuntime};
