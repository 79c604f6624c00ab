//! 充值凭证存储
//!
//! 凭证以 `{uuid}.{ext}` 命名写入上传目录，通过静态路由 `/uploads` 对外提供

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use store_shared::config::UploadConfig;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, Result};

/// 允许上传的凭证格式
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "pdf"];

/// 凭证存储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// 保存凭证，返回对外访问的 URL
    async fn save(&self, extension: &str, data: Vec<u8>) -> Result<String>;

    /// 按 `save` 返回的 URL 删除凭证，文件不存在时视为成功
    async fn remove(&self, url: &str) -> Result<()>;
}

/// 本地磁盘凭证存储
pub struct LocalReceiptStore {
    dir: PathBuf,
    public_prefix: String,
}

impl LocalReceiptStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ReceiptStore for LocalReceiptStore {
    async fn save(&self, extension: &str, data: Vec<u8>) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create upload dir: {}", e)))?;

        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let hash = hex::encode(Sha256::digest(&data));
        let size = data.len();

        tokio::fs::write(self.dir.join(&filename), data)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to write receipt: {}", e)))?;

        info!(file = %filename, sha256 = %hash, size, "Receipt stored");
        Ok(format!("{}/{}", self.public_prefix, filename))
    }

    async fn remove(&self, url: &str) -> Result<()> {
        let filename = url
            .strip_prefix(&self.public_prefix)
            .map(|rest| rest.trim_start_matches('/'))
            .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
            .ok_or_else(|| ApiError::Internal(format!("Not a stored receipt: {}", url)))?;

        match tokio::fs::remove_file(self.dir.join(filename)).await {
            Ok(()) => {
                info!(file = %filename, "Receipt removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Internal(format!("Failed to remove receipt: {}", e))),
        }
    }
}

/// 校验凭证文件，返回小写扩展名
pub fn validate_receipt(filename: &str, data: &[u8], max_bytes: usize) -> Result<String> {
    if data.is_empty() {
        return Err(ApiError::Upload("凭证文件为空".to_string()));
    }
    if data.len() > max_bytes {
        return Err(ApiError::Upload(format!(
            "凭证文件过大，最大 {}MB",
            max_bytes / 1024 / 1024
        )));
    }

    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| ApiError::Upload(format!("无法识别的文件类型: {}", filename)))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ApiError::Upload(format!(
            "不支持的文件格式 '{}'，支持: {}",
            ext,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    Ok(ext)
}
