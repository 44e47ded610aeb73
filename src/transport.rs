//! 传输层抽象
//!
//! 执行器通过 [`Transport`] 发起实际的网络请求。启用 `http` 特性时提供基于
//! reqwest 的实现 [`ReqwestTransport`]；测试中可以替换为任意桩实现。

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 期望的响应类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// JSON 解码
    #[default]
    Json,
    /// 文本
    Text,
    /// 字节流（成功时写入磁盘缓存）
    Stream,
    /// 原始字节
    Bytes,
}

impl ResponseType {
    /// 解析响应类型，未知取值按原始字节处理
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => ResponseType::Json,
            "text" => ResponseType::Text,
            "stream" => ResponseType::Stream,
            _ => ResponseType::Bytes,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Json => "json",
            ResponseType::Text => "text",
            ResponseType::Stream => "stream",
            ResponseType::Bytes => "bytes",
        }
    }
}

/// 传输层请求
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub method: String,
    pub response_type: ResponseType,
    /// 本次调用的超时
    pub timeout: Duration,
}

/// 传输层响应体
pub enum TransportBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
    /// 可逐块读取的字节流
    Stream(BoxStream<'static, Result<Bytes, TransportError>>),
}

impl std::fmt::Debug for TransportBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            TransportBody::Text(text) => f.debug_tuple("Text").field(text).finish(),
            TransportBody::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            TransportBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// 传输层接口
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求
    async fn send(&self, request: &TransportRequest) -> Result<TransportBody, TransportError>;
}

#[cfg(feature = "http")]
pub use self::http::ReqwestTransport;

#[cfg(feature = "http")]
mod http {
    use super::{ResponseType, Transport, TransportBody, TransportRequest};
    use crate::error::TransportError;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::time::Duration;
    use tracing::trace;

    /// 基于 reqwest 的传输实现
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// 使用已有的 reqwest 客户端
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn map_error(err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if err.is_body() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: &TransportRequest) -> Result<TransportBody, TransportError> {
            let method = reqwest::Method::from_bytes(request.method.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            let timeout = request.timeout;

            trace!("发送请求: {} {}", request.method, request.url);
            let response = self
                .client
                .request(method, &request.url)
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| map_error(e, timeout))?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }

            let body = match request.response_type {
                ResponseType::Json => TransportBody::Json(
                    response
                        .json::<serde_json::Value>()
                        .await
                        .map_err(|e| map_error(e, timeout))?,
                ),
                ResponseType::Text => {
                    TransportBody::Text(response.text().await.map_err(|e| map_error(e, timeout))?)
                }
                ResponseType::Bytes => {
                    TransportBody::Bytes(response.bytes().await.map_err(|e| map_error(e, timeout))?)
                }
                ResponseType::Stream => TransportBody::Stream(
                    response
                        .bytes_stream()
                        .map(move |chunk| chunk.map_err(|e| map_error(e, timeout)))
                        .boxed(),
                ),
            };

            Ok(body)
        }
    }

}
