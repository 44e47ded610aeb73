//! 配置模块
//!
//! 定义熔断器与请求执行器的配置结构，支持从 YAML / TOML 加载。
//!
//! 时长字段在配置文件中以秒为单位（允许小数）：
//!
//! ```yaml
//! failure_threshold: 5
//! cold_period_secs: 10
//! request_timeout_secs: 60
//! cache_dir: /var/cache/myapp
//! ```

use crate::constants::{
    CACHE_DIR_NAME, DEFAULT_COLD_PERIOD_SECS, DEFAULT_FAILURE_THRESHOLD,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::FuseError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 熔断器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// 失败阈值（失败次数严格大于此值时熔断）
    pub failure_threshold: u32,
    /// 冷却期（打开状态后等待此时间再放行探测请求）
    #[serde(rename = "cold_period_secs", with = "duration_secs")]
    pub cold_period: Duration,
    /// 默认请求超时
    #[serde(rename = "request_timeout_secs", with = "duration_secs")]
    pub request_timeout: Duration,
    /// 磁盘缓存目录
    pub cache_dir: PathBuf,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cold_period: Duration::from_secs_f64(DEFAULT_COLD_PERIOD_SECS),
            request_timeout: Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_dir: default_cache_dir(),
        }
    }
}

impl BreakerConfig {
    /// 创建新的配置
    pub fn new(failure_threshold: u32, cold_period: Duration) -> Self {
        Self {
            failure_threshold,
            cold_period,
            ..Default::default()
        }
    }

    pub fn failure_threshold(mut self, failure_threshold: u32) -> Self {
        self.failure_threshold = failure_threshold;
        self
    }

    pub fn cold_period(mut self, cold_period: Duration) -> Self {
        self.cold_period = cold_period;
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout.is_zero() {
            return Err("请求超时必须大于0".to_string());
        }

        if self.cache_dir.as_os_str().is_empty() {
            return Err("缓存目录不能为空".to_string());
        }

        Ok(())
    }

    /// 从 YAML 字符串加载并校验
    pub fn from_yaml_str(content: &str) -> Result<Self, FuseError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate().map_err(FuseError::ConfigError)?;
        Ok(config)
    }

    /// 从 TOML 字符串加载并校验
    pub fn from_toml_str(content: &str) -> Result<Self, FuseError> {
        let config: Self = toml::from_str(content)?;
        config.validate().map_err(FuseError::ConfigError)?;
        Ok(config)
    }

    /// 从文件加载，根据扩展名选择格式
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FuseError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(FuseError::ConfigError(format!(
                "不支持的配置文件格式: {:?}",
                other
            ))),
        }
    }
}

/// 默认缓存目录：可执行文件所在目录下的 `_cache`
pub fn default_cache_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
}

/// 以秒（f64）序列化 `Duration`
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| serde::de::Error::custom(format!("无效的时长 {}: {}", secs, e)))
    }
}
