//! リモートAIサービス
//!
//! - LessonService: セッションが使う5つのリモート操作
//! - GeminiTransport: generateContent を叩くだけの下位層（reqwest / fetch）
//! - GeminiLessonService: ペイロード生成とレスポンス解釈を担う実装

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::parse_quiz_response;
use crate::payload::{self, to_data_url, GenerateContentRequest, GenerateContentResponse};
use crate::types::{BinaryAsset, QuizQuestion};

/// Gemini API のベースURL
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// 画像のMIMEタイプが返らなかった場合の既定値
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// generateContent のエンドポイントURL
pub fn generate_content_url(model: &str) -> String {
    format!("{}/{}:generateContent", GEMINI_API_BASE, model)
}

/// 使用モデル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    pub text_model: String,
    pub image_model: String,
    pub speech_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text_model: "gemini-3-flash-preview".into(),
            image_model: "gemini-2.5-flash-image".into(),
            speech_model: "gemini-2.5-flash-preview-tts".into(),
        }
    }
}

/// セッションが消費するリモート操作
///
/// 単一スレッドの協調スケジューリング前提なので Send は要求しない
#[async_trait(?Send)]
pub trait LessonService {
    async fn simplify(&self, text: &str, files: &[BinaryAsset], language_name: &str) -> Result<String>;

    async fn summarize(&self, text: &str, files: &[BinaryAsset], language_name: &str) -> Result<String>;

    async fn generate_quiz(
        &self,
        text: &str,
        files: &[BinaryAsset],
        language_name: &str,
    ) -> Result<Vec<QuizQuestion>>;

    /// 画像を生成して Data URL を返す
    async fn generate_image(&self, prompt: &str) -> Result<String>;

    /// 音声を合成して Base64 の 16bit PCM (24kHz mono) を返す
    async fn synthesize_speech(&self, text: &str, language_name: &str) -> Result<String>;
}

/// generateContent 呼び出しの下位層
#[async_trait(?Send)]
pub trait GeminiTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

/// Gemini による LessonService 実装
pub struct GeminiLessonService<T> {
    transport: T,
    models: ModelConfig,
}

impl<T: GeminiTransport> GeminiLessonService<T> {
    pub fn new(transport: T, models: ModelConfig) -> Self {
        Self { transport, models }
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    async fn generate_text(&self, request: GenerateContentRequest, what: &str) -> Result<String> {
        let response = self
            .transport
            .generate_content(&self.models.text_model, &request)
            .await?;
        response
            .text()
            .ok_or_else(|| Error::EmptyResponse(format!("{} returned no text", what)))
    }
}

#[async_trait(?Send)]
impl<T: GeminiTransport> LessonService for GeminiLessonService<T> {
    async fn simplify(&self, text: &str, files: &[BinaryAsset], language_name: &str) -> Result<String> {
        let request = payload::simplify_request(text, files, language_name);
        self.generate_text(request, "simplify").await
    }

    async fn summarize(&self, text: &str, files: &[BinaryAsset], language_name: &str) -> Result<String> {
        let request = payload::summarize_request(text, files, language_name);
        self.generate_text(request, "summarize").await
    }

    async fn generate_quiz(
        &self,
        text: &str,
        files: &[BinaryAsset],
        language_name: &str,
    ) -> Result<Vec<QuizQuestion>> {
        let request = payload::quiz_request(text, files, language_name);
        let response_text = self.generate_text(request, "quiz").await?;
        parse_quiz_response(&response_text)
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let request = payload::image_request(prompt);
        let response = self
            .transport
            .generate_content(&self.models.image_model, &request)
            .await?;
        let inline = response
            .first_inline_data()
            .ok_or_else(|| Error::EmptyResponse("image generation returned no image".into()))?;
        let mime_type = inline.mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
        Ok(to_data_url(mime_type, &inline.data))
    }

    async fn synthesize_speech(&self, text: &str, language_name: &str) -> Result<String> {
        let request = payload::speech_request(text, language_name);
        let response = self
            .transport
            .generate_content(&self.models.speech_model, &request)
            .await?;
        response
            .first_inline_data()
            .map(|inline| inline.data.clone())
            .ok_or_else(|| Error::EmptyResponse("speech synthesis returned no audio".into()))
    }
}
