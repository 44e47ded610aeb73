//! 测试通用工具模块
//!
//! 提供可编排的传输层桩和执行器构造函数。

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use cachefuse::{
    BreakerConfig, RequestExecutor, ResponseType, Transport, TransportBody, TransportError,
    TransportRequest,
};
use futures::StreamExt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 可编排的传输层桩
///
/// - 记录调用次数
/// - 可切换成功/失败
/// - 可设置响应延迟（用于超时与并发场景）
pub struct StubTransport {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    stream_payload: Bytes,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Self::with_stream_payload(Bytes::from_static(b"stream-body"))
    }

    pub fn with_stream_payload(payload: impl Into<Bytes>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
            stream_payload: payload.into(),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportBody, TransportError> {
        let seq = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Network("connection refused".to_string()));
        }

        let body = match request.response_type {
            ResponseType::Json => TransportBody::Json(serde_json::json!({
                "url": request.url,
                "seq": seq,
            })),
            ResponseType::Text => TransportBody::Text(format!("{} #{}", request.url, seq)),
            ResponseType::Bytes => TransportBody::Bytes(Bytes::from(request.url.clone())),
            ResponseType::Stream => {
                // 拆成多个块发送
                let chunks: Vec<Result<Bytes, TransportError>> = self
                    .stream_payload
                    .chunks(7)
                    .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                    .collect();
                TransportBody::Stream(futures::stream::iter(chunks).boxed())
            }
        };
        Ok(body)
    }
}

/// 初始化测试日志，通过 RUST_LOG 控制输出
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 创建测试用执行器
pub fn create_executor(
    cache_dir: &Path,
    threshold: u32,
    cold_period: Duration,
    transport: Arc<StubTransport>,
) -> RequestExecutor {
    let config = BreakerConfig::new(threshold, cold_period).cache_dir(cache_dir);
    RequestExecutor::new(config, transport)
}
