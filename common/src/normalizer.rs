//! アップロードファイルの正規化
//!
//! `text/plain` はテキストバッファへ追記し、それ以外は Data URL の
//! BinaryAsset に変換する。バッチ内は選択順に1ファイルずつ処理する。

use async_trait::async_trait;
use base64::Engine as _;
use tracing::warn;

use crate::error::Result;
use crate::payload::to_data_url;
use crate::types::{BinaryAsset, PendingInput};

/// テキストとして取り込むMIMEタイプ
pub const TEXT_MIME_TYPE: &str = "text/plain";

/// MIMEタイプ不明時の既定値
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// アップロードされた1ファイル
#[async_trait(?Send)]
pub trait UploadSource {
    fn name(&self) -> String;

    /// 申告されたMIMEタイプ（不明なら空文字）
    fn mime_type(&self) -> String;

    async fn read_bytes(&self) -> Result<Vec<u8>>;
}

/// メモリ上のファイル
#[derive(Debug, Clone)]
pub struct InMemoryUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InMemoryUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait(?Send)]
impl UploadSource for InMemoryUpload {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// 正規化結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedFile {
    Text(String),
    Asset(BinaryAsset),
}

/// 取り込み件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub text_files: usize,
    pub assets: usize,
    pub skipped: usize,
}

/// バイト列を BinaryAsset に変換
pub fn encode_asset(name: &str, declared_mime: &str, bytes: &[u8]) -> BinaryAsset {
    let mime_type = if declared_mime.is_empty() {
        FALLBACK_MIME_TYPE
    } else {
        declared_mime
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    BinaryAsset {
        data: to_data_url(mime_type, &encoded),
        mime_type: mime_type.to_string(),
        name: name.to_string(),
    }
}

/// 1ファイルを正規化
pub async fn normalize_file<U: UploadSource + ?Sized>(upload: &U) -> Result<NormalizedFile> {
    let bytes = upload.read_bytes().await?;
    let mime_type = upload.mime_type();

    if mime_type == TEXT_MIME_TYPE {
        return Ok(NormalizedFile::Text(String::from_utf8_lossy(&bytes).into_owned()));
    }
    Ok(NormalizedFile::Asset(encode_asset(&upload.name(), &mime_type, &bytes)))
}

/// バッチを選択順に正規化
///
/// 読み込みに失敗したファイルはログを出してスキップし、残りは続行する
pub async fn normalize_batch<U: UploadSource>(uploads: &[U]) -> (Vec<NormalizedFile>, usize) {
    let mut normalized = Vec::with_capacity(uploads.len());
    let mut skipped = 0;

    for upload in uploads {
        match normalize_file(upload).await {
            Ok(file) => normalized.push(file),
            Err(e) => {
                warn!(file = %upload.name(), error = %e, "ファイルの読み込みに失敗したためスキップ");
                skipped += 1;
            }
        }
    }

    (normalized, skipped)
}

/// 正規化結果を入力バッファに取り込む
///
/// テキストは順に追記、添付は選択順のまま既存リストの末尾へ
pub fn absorb(pending: &mut PendingInput, files: Vec<NormalizedFile>) -> UploadSummary {
    let mut summary = UploadSummary::default();
    let mut assets = Vec::new();

    for file in files {
        match file {
            NormalizedFile::Text(text) => {
                pending.append_text(&text);
                summary.text_files += 1;
            }
            NormalizedFile::Asset(asset) => {
                assets.push(asset);
                summary.assets += 1;
            }
        }
    }

    pending.extend_files(assets);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use futures::executor::block_on;

    /// 読み込みに失敗するファイルを混ぜられるテスト用ソース
    enum TestUpload {
        Ok(InMemoryUpload),
        Broken(&'static str),
    }

    #[async_trait(?Send)]
    impl UploadSource for TestUpload {
        fn name(&self) -> String {
            match self {
                TestUpload::Ok(u) => u.name(),
                TestUpload::Broken(name) => name.to_string(),
            }
        }

        fn mime_type(&self) -> String {
            match self {
                TestUpload::Ok(u) => u.mime_type(),
                TestUpload::Broken(_) => String::new(),
            }
        }

        async fn read_bytes(&self) -> Result<Vec<u8>> {
            match self {
                TestUpload::Ok(u) => u.read_bytes().await,
                TestUpload::Broken(_) => Err(Error::Upload("permission denied".into())),
            }
        }
    }

    fn text(name: &str, body: &str) -> InMemoryUpload {
        InMemoryUpload::new(name, TEXT_MIME_TYPE, body.as_bytes())
    }

    fn image(name: &str) -> InMemoryUpload {
        InMemoryUpload::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn test_encode_asset_data_url() {
        let asset = encode_asset("a.png", "image/png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(asset.data, "data:image/png;base64,iVBORw==");
        assert_eq!(asset.mime_type, "image/png");
        assert_eq!(asset.name, "a.png");
    }

    #[test]
    fn test_encode_asset_fallback_mime() {
        let asset = encode_asset("blob", "", b"xyz");
        assert_eq!(asset.mime_type, FALLBACK_MIME_TYPE);
        assert!(asset.data.starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn test_text_files_join_with_blank_line_in_order() {
        let uploads = vec![
            text("a.txt", "alpha"),
            image("pic1.png"),
            text("b.txt", "beta"),
            image("pic2.png"),
            text("c.txt", "gamma"),
        ];
        let (normalized, skipped) = block_on(normalize_batch(&uploads));
        assert_eq!(skipped, 0);

        let mut pending = PendingInput::default();
        let summary = absorb(&mut pending, normalized);

        assert_eq!(pending.text, "alpha\n\nbeta\n\ngamma");
        assert_eq!(summary.text_files, 3);
        assert_eq!(summary.assets, 2);
    }

    #[test]
    fn test_text_appends_to_existing_buffer() {
        let mut pending = PendingInput {
            text: "typed by hand".to_string(),
            files: vec![],
        };
        let (normalized, _) = block_on(normalize_batch(&[text("notes.txt", "from file")]));
        absorb(&mut pending, normalized);
        assert_eq!(pending.text, "typed by hand\n\nfrom file");
    }

    #[test]
    fn test_assets_preserve_selection_order_and_append() {
        let mut pending = PendingInput::default();
        let (first, _) = block_on(normalize_batch(&[image("existing.png")]));
        absorb(&mut pending, first);

        let uploads = vec![image("one.png"), text("t.txt", "x"), image("two.png"), image("three.png")];
        let (normalized, _) = block_on(normalize_batch(&uploads));
        absorb(&mut pending, normalized);

        let names: Vec<_> = pending.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["existing.png", "one.png", "two.png", "three.png"]);
    }

    #[test]
    fn test_failed_read_is_skipped() {
        let uploads = vec![
            TestUpload::Ok(image("first.png")),
            TestUpload::Broken("locked.pdf"),
            TestUpload::Ok(image("second.png")),
        ];
        let (normalized, skipped) = block_on(normalize_batch(&uploads));
        assert_eq!(skipped, 1);

        let mut pending = PendingInput::default();
        let summary = absorb(&mut pending, normalized);
        assert_eq!(summary.assets, 2);
        assert_eq!(pending.files[0].name, "first.png");
        assert_eq!(pending.files[1].name, "second.png");
    }

    #[test]
    fn test_invalid_utf8_text_is_lossy() {
        let upload = InMemoryUpload::new("bad.txt", TEXT_MIME_TYPE, vec![b'o', b'k', 0xFF]);
        let normalized = block_on(normalize_file(&upload)).unwrap();
        assert_eq!(normalized, NormalizedFile::Text("ok\u{FFFD}".to_string()));
    }
}
