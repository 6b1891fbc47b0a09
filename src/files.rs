//! ローカルファイルのアップロード元

use async_trait::async_trait;
use lesson_lens_common::normalizer::{TEXT_MIME_TYPE, UploadSource};
use lesson_lens_common::{Error, Result};
use std::path::{Path, PathBuf};

/// 拡張子 → MIMEタイプ
const MIME_TYPES: &[(&str, &str)] = &[
    ("txt", TEXT_MIME_TYPE),
    ("md", TEXT_MIME_TYPE),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
];

/// 拡張子からMIMEタイプを推定（不明なら空文字）
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    MIME_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or("")
}

/// ファイルシステム上のファイル
#[derive(Debug, Clone)]
pub struct PathUpload {
    path: PathBuf,
}

impl PathUpload {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait(?Send)]
impl UploadSource for PathUpload {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn mime_type(&self) -> String {
        guess_mime_type(&self.path).to_string()
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::Upload(format!("{}: {}", self.path.display(), e)))
    }
}
