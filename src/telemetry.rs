//! 日志初始化
//!
//! 基于 tracing-subscriber 安装全局 fmt 订阅者。过滤规则优先取 `RUST_LOG`，
//! 否则使用传入的默认值。

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 默认过滤规则
pub const DEFAULT_LOG_FILTER: &str = "cachefuse=info";

/// 初始化日志
///
/// # 返回
/// - `Ok(())`: 初始化成功
/// - `Err(_)`: 过滤规则无效或全局订阅者已存在
///
/// # 示例
/// ```rust
/// use cachefuse::telemetry::{init_logging, DEFAULT_LOG_FILTER};
///
/// init_logging(DEFAULT_LOG_FILTER).ok();
/// ```
pub fn init_logging(default_filter: &str) -> Result<(), String> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| format!("无效的日志过滤规则 {}: {}", default_filter, e))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| format!("日志初始化失败: {}", e))?;

    info!("日志系统初始化完成");
    Ok(())
}
