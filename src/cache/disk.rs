//! 磁盘缓存层
//!
//! 每个缓存键对应缓存目录下的一个文件，文件存在即代表有缓存，没有索引文件。
//!
//! 写入先落到临时文件（`<key>.<seq>.partial`）再 rename 覆盖目标文件，读取方
//! 不会看到写了一半的文件；同一键的并发写入以最后一次 rename 为准。
//! 流式响应通过 [`StagedFile`] 边接收边落盘，内存占用与响应大小无关。

use crate::constants::TEMP_FILE_SUFFIX;
use crate::error::StorageError;
use crate::response::StreamHandle;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, trace};

/// 磁盘缓存
#[derive(Debug)]
pub struct DiskCache {
    dir: PathBuf,
    temp_seq: AtomicU64,
    writes: AtomicU64,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            temp_seq: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 缓存键对应的文件路径
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// 写入字节（覆盖已有文件）
    pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut staged = self.stage(key).await?;
        staged.write(bytes).await?;
        self.commit(&mut staged).await
    }

    /// 在缓存目录下创建临时文件，用于分块写入
    pub async fn stage(&self, key: &str) -> Result<StagedFile, StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::CreateDirError(format!("{}: {}", self.dir.display(), e)))?;

        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        let temp = self
            .dir
            .join(format!("{}.{}{}", key, seq, TEMP_FILE_SUFFIX));

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp)
            .await
            .map_err(|e| StorageError::WriteError(format!("{}: {}", temp.display(), e)))?;

        trace!("创建磁盘缓存临时文件: {}", temp.display());
        Ok(StagedFile {
            key: key.to_string(),
            target: self.path_for(key),
            temp,
            file: Some(file),
            len: 0,
            committed: false,
        })
    }

    /// 把临时文件 rename 为正式缓存文件
    pub async fn commit(&self, staged: &mut StagedFile) -> Result<(), StorageError> {
        let temp = staged.temp.clone();
        staged
            .file_mut()?
            .flush()
            .await
            .map_err(|e| StorageError::WriteError(format!("{}: {}", temp.display(), e)))?;

        tokio::fs::rename(&temp, &staged.target)
            .await
            .map_err(|e| StorageError::WriteError(format!("{}: {}", staged.target.display(), e)))?;

        staged.committed = true;
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!("磁盘缓存写入: key={}, {} bytes", staged.key, staged.len);
        Ok(())
    }

    /// 打开缓存文件，不存在时返回 None
    pub async fn get(&self, key: &str) -> Result<Option<StreamHandle>, StorageError> {
        let path = self.path_for(key);

        if !self.contains(key).await? {
            trace!("磁盘缓存未命中: key={}", key);
            return Ok(None);
        }

        match File::open(&path).await {
            Ok(file) => {
                trace!("磁盘缓存命中: key={}", key);
                Ok(Some(StreamHandle::from_file(file, path)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadError(format!("{}: {}", path.display(), e))),
        }
    }

    /// 检查缓存文件是否存在
    pub async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// 成功写入次数
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

/// 正在写入的临时缓存文件
///
/// 未提交即被丢弃时（请求失败、超时取消）删除临时文件。
#[derive(Debug)]
pub struct StagedFile {
    key: String,
    target: PathBuf,
    temp: PathBuf,
    file: Option<File>,
    len: u64,
    committed: bool,
}

impl StagedFile {
    /// 追加一块数据
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let temp = self.temp.display().to_string();
        self.file_mut()?
            .write_all(chunk)
            .await
            .map_err(|e| StorageError::WriteError(format!("{}: {}", temp, e)))?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    /// 读回已成功写入的内容
    pub async fn read_back(&mut self) -> Result<Vec<u8>, StorageError> {
        let temp = self.temp.display().to_string();
        let len = self.len;
        let file = self.file_mut()?;
        let read_err = |e: std::io::Error| StorageError::ReadError(format!("{}: {}", temp, e));

        file.seek(SeekFrom::Start(0)).await.map_err(read_err)?;
        let mut buf = Vec::with_capacity(len as usize);
        file.take(len).read_to_end(&mut buf).await.map_err(read_err)?;
        Ok(buf)
    }

    /// 转换为从头读取的句柄
    ///
    /// 已提交时句柄路径为正式缓存文件，否则为临时文件。
    pub async fn into_handle(mut self) -> Result<StreamHandle, StorageError> {
        let path = if self.committed {
            self.target.clone()
        } else {
            self.temp.clone()
        };
        let mut file = self
            .file
            .take()
            .ok_or_else(|| StorageError::ReadError(format!("{}: 文件已关闭", path.display())))?;

        file.seek(SeekFrom::Start(0))
            .await
            .map_err(|e| StorageError::ReadError(format!("{}: {}", path.display(), e)))?;
        Ok(StreamHandle::from_file(file, path))
    }

    /// 已写入字节数
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    fn file_mut(&mut self) -> Result<&mut File, StorageError> {
        let temp = &self.temp;
        self.file
            .as_mut()
            .ok_or_else(|| StorageError::WriteError(format!("{}: 文件已关闭", temp.display())))
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.temp);
        }
    }
}
