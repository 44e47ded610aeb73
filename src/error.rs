//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 错误类型定义
//!
//! 使用thiserror定义所有错误类型。`fetch` 本身从不向调用方返回错误，
//! 这些类型用于配置加载、存储层以及传输层内部。

use thiserror::Error;

/// CacheFuse 错误类型
#[derive(Error, Debug)]
pub enum FuseError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 存储错误
    #[error("存储错误: {0}")]
    StorageError(#[from] StorageError),

    /// 传输错误
    #[error("传输错误: {0}")]
    TransportError(#[from] TransportError),

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// YAML解析错误
    #[error("YAML解析错误: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML解析错误
    #[error("TOML解析错误: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// 存储错误
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// 目录创建失败
    #[error("目录创建失败: {0}")]
    CreateDirError(String),

    /// 写入失败
    #[error("写入失败: {0}")]
    WriteError(String),

    /// 读取失败
    #[error("读取失败: {0}")]
    ReadError(String),
}

/// 传输错误
///
/// 所有变体在执行器中都被视为一次失败，不做区分。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 非成功状态码
    #[error("HTTP状态错误: {0}")]
    Status(u16),

    /// 超时
    #[error("请求超时: {0:?}")]
    Timeout(std::time::Duration),

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 响应解码失败
    #[error("解码错误: {0}")]
    Decode(String),

    /// 响应体读取中断
    #[error("响应体读取错误: {0}")]
    Body(String),

    /// 请求无效（方法或URL）
    #[error("无效请求: {0}")]
    InvalidRequest(String),
}

/// 熔断器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CircuitState {
    /// 关闭状态（正常）
    Closed,
    /// 打开状态（熔断）
    Open,
    /// 半开状态（探测）
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        };
        f.write_str(name)
    }
}
