//! 请求执行器
//!
//! 通过熔断器执行单个请求，并在失败时回退到缓存。
//!
//! # 流程
//!
//! ```text
//! fetch(options)
//!     -> BreakerRegistry::can_attempt_within(method + url, timeout)   拒绝 => Blocked（不调用传输层）
//!     -> Transport::send（整体受超时约束，流式响应边接收边写入临时文件）
//!     -> 成功: record_success + 写缓存（流式提交到磁盘，其余写内存） => Fresh
//!     -> 失败: record_failure + 读缓存（磁盘优先）            => Stale / Unavailable
//! ```
//!
//! `fetch` 把结果折叠为 `Option<Response>`；需要区分结果来源时使用 `fetch_outcome`。

use crate::cache::{cache_key, request_id, ResponseCache, StagedFile};
use crate::circuit_breaker::BreakerRegistry;
use crate::config::BreakerConfig;
use crate::error::{FuseError, TransportError};
use crate::response::{CachedValue, Response, StreamHandle};
use crate::transport::{ResponseType, Transport, TransportBody, TransportRequest};
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 请求参数
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub url: String,
    pub method: String,
    pub response_type: ResponseType,
    /// 为空时使用配置中的默认超时
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            response_type: ResponseType::default(),
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// 请求结果
#[derive(Debug)]
pub enum FetchOutcome {
    /// 请求成功
    Fresh(Response),
    /// 请求失败，返回缓存
    Stale(Response),
    /// 熔断器打开，未发起请求
    Blocked,
    /// 请求失败且无缓存
    Unavailable,
}

impl FetchOutcome {
    /// 折叠为 `Option<Response>`
    pub fn into_response(self) -> Option<Response> {
        match self {
            FetchOutcome::Fresh(response) | FetchOutcome::Stale(response) => Some(response),
            FetchOutcome::Blocked | FetchOutcome::Unavailable => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, FetchOutcome::Fresh(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::Stale(_))
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, FetchOutcome::Blocked)
    }
}

/// 传输层成功后的响应体
enum Fetched {
    Value(CachedValue),
    Stream(Bytes),
    /// 已完整写入临时文件，等待提交
    Spooled(StagedFile),
}

/// 请求执行器
pub struct RequestExecutor {
    config: BreakerConfig,
    registry: BreakerRegistry,
    cache: ResponseCache,
    transport: Arc<dyn Transport>,
}

impl RequestExecutor {
    /// 创建新的执行器
    pub fn new(config: BreakerConfig, transport: Arc<dyn Transport>) -> Self {
        info!(
            "创建请求执行器: threshold={}, cold_period={:?}, timeout={:?}, cache_dir={}",
            config.failure_threshold,
            config.cold_period,
            config.request_timeout,
            config.cache_dir.display()
        );

        Self {
            registry: BreakerRegistry::from_config(&config),
            cache: ResponseCache::new(config.cache_dir.clone()),
            config,
            transport,
        }
    }

    pub fn builder() -> RequestExecutorBuilder {
        RequestExecutorBuilder::new()
    }

    /// 执行请求，失败与拒绝都折叠为 None 或缓存值
    pub async fn fetch(&self, options: FetchOptions) -> Option<Response> {
        self.fetch_outcome(options).await.into_response()
    }

    /// 执行请求，返回带来源的结果
    pub async fn fetch_outcome(&self, options: FetchOptions) -> FetchOutcome {
        let id = request_id(&options.method, &options.url);
        let timeout = options.timeout.unwrap_or(self.config.request_timeout);
        if !self.registry.can_attempt_within(&id, timeout) {
            warn!("熔断器打开，请求被拒绝: id={}", id);
            return FetchOutcome::Blocked;
        }

        let key = cache_key(&options.method, &options.url);
        let request = TransportRequest {
            url: options.url,
            method: options.method,
            response_type: options.response_type,
            timeout,
        };

        let result = match tokio::time::timeout(timeout, self.attempt(&key, &request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        };

        match result {
            Ok(fetched) => {
                self.registry.record_success(&id);
                match self.store(&key, request.response_type, fetched).await {
                    Some(response) => FetchOutcome::Fresh(response),
                    None => FetchOutcome::Unavailable,
                }
            }
            Err(e) => {
                self.registry.record_failure(&id);
                debug!("请求失败，尝试缓存回退: id={}, error={}", id, e);
                match self.cache.get(&key).await {
                    Some(response) => FetchOutcome::Stale(response),
                    None => FetchOutcome::Unavailable,
                }
            }
        }
    }

    async fn attempt(
        &self,
        key: &str,
        request: &TransportRequest,
    ) -> Result<Fetched, TransportError> {
        let fetched = match self.transport.send(request).await? {
            TransportBody::Json(value) => Fetched::Value(CachedValue::Json(value)),
            TransportBody::Text(text) => Fetched::Value(CachedValue::Text(text)),
            TransportBody::Bytes(bytes) => Fetched::Value(CachedValue::Bytes(bytes)),
            TransportBody::Stream(stream) if request.response_type == ResponseType::Stream => {
                self.spool(key, stream).await?
            }
            TransportBody::Stream(stream) => Fetched::Stream(collect_body(stream).await?),
        };
        Ok(fetched)
    }

    /// 边接收边写入临时文件
    ///
    /// 无法创建临时文件时整体缓冲到内存；写入中途失败时读回已写入部分，
    /// 剩余数据缓冲到内存。
    async fn spool(
        &self,
        key: &str,
        mut stream: BoxStream<'static, Result<Bytes, TransportError>>,
    ) -> Result<Fetched, TransportError> {
        let mut staged = match self.cache.disk().stage(key).await {
            Ok(staged) => staged,
            Err(e) => {
                warn!("磁盘缓存不可用，响应体缓冲到内存: key={}, error={}", key, e);
                return Ok(Fetched::Stream(collect_body(stream).await?));
            }
        };

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Err(e) = staged.write(&chunk).await {
                warn!("磁盘缓存写入中断，剩余响应体缓冲到内存: key={}, error={}", key, e);
                let written = staged
                    .read_back()
                    .await
                    .map_err(|e| TransportError::Body(e.to_string()))?;
                let mut buf = BytesMut::from(written.as_slice());
                buf.extend_from_slice(&chunk);
                let rest = collect_body(stream).await?;
                buf.extend_from_slice(&rest);
                return Ok(Fetched::Stream(buf.freeze()));
            }
        }

        Ok(Fetched::Spooled(staged))
    }

    /// 写缓存并构造返回给调用方的响应
    async fn store(
        &self,
        key: &str,
        response_type: ResponseType,
        fetched: Fetched,
    ) -> Option<Response> {
        let response = match (response_type, fetched) {
            (_, Fetched::Spooled(mut staged)) => {
                if let Err(e) = self.cache.disk().commit(&mut staged).await {
                    warn!("磁盘缓存写入失败: key={}, error={}", key, e);
                }
                match staged.into_handle().await {
                    Ok(handle) => Response::Stream(handle),
                    Err(e) => {
                        warn!("无法读取已接收的响应体: key={}, error={}", key, e);
                        return None;
                    }
                }
            }
            (ResponseType::Stream, Fetched::Stream(bytes)) => {
                self.cache.put_bytes(key, &bytes).await;
                Response::Stream(StreamHandle::from_bytes(bytes))
            }
            (_, Fetched::Stream(bytes)) => {
                let value = CachedValue::Bytes(bytes);
                self.cache.put_value(key, value.clone());
                Response::Value(value)
            }
            (_, Fetched::Value(value)) => {
                self.cache.put_value(key, value.clone());
                Response::Value(value)
            }
        };
        Some(response)
    }

    pub fn registry(&self) -> &BreakerRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }
}

async fn collect_body(
    mut stream: BoxStream<'static, Result<Bytes, TransportError>>,
) -> Result<Bytes, TransportError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

/// 执行器构建器
#[derive(Default)]
pub struct RequestExecutorBuilder {
    config: BreakerConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl RequestExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: BreakerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 构建执行器
    ///
    /// 未指定传输层时，启用 `http` 特性则使用 reqwest 实现，否则返回配置错误。
    pub fn build(self) -> Result<RequestExecutor, FuseError> {
        self.config.validate().map_err(FuseError::ConfigError)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };

        Ok(RequestExecutor::new(self.config, transport))
    }
}

#[cfg(feature = "http")]
fn default_transport() -> Result<Arc<dyn Transport>, FuseError> {
    Ok(Arc::new(crate::transport::ReqwestTransport::new()))
}

#[cfg(not(feature = "http"))]
fn default_transport() -> Result<Arc<dyn Transport>, FuseError> {
    Err(FuseError::ConfigError(
        "未指定传输层，且未启用 http 特性".to_string(),
    ))
}
