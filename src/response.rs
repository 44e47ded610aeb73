//! 响应类型
//!
//! 执行器返回给调用方的值：解码后的响应体，或可读取的字节流句柄。

use bytes::Bytes;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

/// 已解码的响应值（内存缓存中保存的形式）
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
}

impl CachedValue {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            CachedValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CachedValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            CachedValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for CachedValue {
    fn from(value: serde_json::Value) -> Self {
        CachedValue::Json(value)
    }
}

impl From<String> for CachedValue {
    fn from(text: String) -> Self {
        CachedValue::Text(text)
    }
}

impl From<Bytes> for CachedValue {
    fn from(bytes: Bytes) -> Self {
        CachedValue::Bytes(bytes)
    }
}

/// 字节流句柄
///
/// 指向磁盘缓存文件；磁盘不可用时，新鲜的流式响应指向内存缓冲。
#[derive(Debug)]
pub struct StreamHandle {
    source: StreamSource,
}

#[derive(Debug)]
enum StreamSource {
    File {
        file: tokio::fs::File,
        path: PathBuf,
    },
    Buffered(Cursor<Bytes>),
}

impl StreamHandle {
    pub fn from_file(file: tokio::fs::File, path: impl Into<PathBuf>) -> Self {
        Self {
            source: StreamSource::File {
                file,
                path: path.into(),
            },
        }
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            source: StreamSource::Buffered(Cursor::new(bytes.into())),
        }
    }

    /// 缓存文件路径（仅磁盘句柄）
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            StreamSource::File { path, .. } => Some(path),
            StreamSource::Buffered(_) => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.source, StreamSource::File { .. })
    }

    /// 读取剩余全部字节
    pub async fn read_all(mut self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

impl AsyncRead for StreamHandle {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().source {
            StreamSource::File { file, .. } => Pin::new(file).poll_read(cx, buf),
            StreamSource::Buffered(cursor) => Pin::new(cursor).poll_read(cx, buf),
        }
    }
}

/// 执行器返回的响应
#[derive(Debug)]
pub enum Response {
    /// 解码后的值
    Value(CachedValue),
    /// 可读取的字节流
    Stream(StreamHandle),
}

impl Response {
    pub fn as_value(&self) -> Option<&CachedValue> {
        match self {
            Response::Value(value) => Some(value),
            Response::Stream(_) => None,
        }
    }

    pub fn into_value(self) -> Option<CachedValue> {
        match self {
            Response::Value(value) => Some(value),
            Response::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<StreamHandle> {
        match self {
            Response::Stream(handle) => Some(handle),
            Response::Value(_) => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Response::Stream(_))
    }
}
