//! Gemini API呼び出し（reqwest）

use async_trait::async_trait;
use lesson_lens_common::payload::{GenerateContentRequest, GenerateContentResponse};
use lesson_lens_common::service::generate_content_url;
use lesson_lens_common::{Error, GeminiTransport, Result};
use std::time::Duration;
use tracing::debug;

/// リクエストのタイムアウト（画像・音声生成は時間がかかる）
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// エラー本文をログに残す最大文字数
const ERROR_BODY_PREVIEW: usize = 500;

pub struct ReqwestTransport {
    client: reqwest::Client,
    api_key: String,
}

impl ReqwestTransport {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Remote(format!("HTTPクライアントの初期化に失敗: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }
}

#[async_trait(?Send)]
impl GeminiTransport for ReqwestTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = generate_content_url(model);
        debug!(%model, "generateContent を呼び出し");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(Error::Remote(format!("API error {}: {}", status, preview)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}
