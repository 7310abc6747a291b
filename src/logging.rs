//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};

/// 构建过滤器：`RUST_LOG` 优先，其次是配置的级别
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化全局 tracing subscriber
///
/// 已经初始化过时返回 `false`，不会 panic。
pub fn init_tracing(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let config = LogConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }

    #[test]
    fn bad_level_falls_back() {
        let config = LogConfig {
            level: "not[a=filter".to_string(),
            ..Default::default()
        };
        // 只要不 panic 即可
        let _ = env_filter(&config);
    }
}
