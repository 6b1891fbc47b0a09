//! ブラウザで選択されたファイル

use async_trait::async_trait;
use lesson_lens_common::{Error, Result, UploadSource};
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FileList};

/// `<input type="file">` / ドラッグ&ドロップで得た1ファイル
pub struct BrowserFile(pub File);

#[async_trait(?Send)]
impl UploadSource for BrowserFile {
    fn name(&self) -> String {
        self.0.name()
    }

    fn mime_type(&self) -> String {
        self.0.type_()
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        let buffer = JsFuture::from(self.0.array_buffer())
            .await
            .map_err(|e| Error::Upload(format!("{}: {:?}", self.0.name(), e)))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

/// FileList を選択順の Vec に変換
pub fn collect_files(files: &FileList) -> Vec<BrowserFile> {
    (0..files.length())
        .filter_map(|i| files.get(i))
        .map(BrowserFile)
        .collect()
}
