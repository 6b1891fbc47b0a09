//! Gemini API呼び出し（fetch）
//!
//! APIキーは設定欄で入力されたものをメモリ上にだけ保持する

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use lesson_lens_common::payload::{GenerateContentRequest, GenerateContentResponse};
use lesson_lens_common::service::generate_content_url;
use lesson_lens_common::{Error, GeminiTransport, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// 画面とトランスポートで共有するAPIキー
pub type SharedApiKey = Rc<RefCell<String>>;

pub struct FetchTransport {
    api_key: SharedApiKey,
}

impl FetchTransport {
    pub fn new(api_key: SharedApiKey) -> Self {
        Self { api_key }
    }
}

fn js_error(context: &str, value: JsValue) -> Error {
    let detail = value.as_string().unwrap_or_else(|| format!("{:?}", value));
    Error::Remote(format!("{}: {}", context, detail))
}

/// Gemini API呼び出し（共通処理）
async fn call_gemini_api(
    api_key: &str,
    model: &str,
    request: &GenerateContentRequest,
) -> std::result::Result<GenerateContentResponse, JsValue> {
    let url = generate_content_url(model);
    let body = serde_json::to_string(request).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&JsValue::from_str(&body));

    let request = Request::new_with_str_and_init(&url, &opts)?;
    request.headers().set("Content-Type", "application/json")?;
    request.headers().set("x-goog-api-key", api_key)?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window is not available"))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
    let resp: Response = resp_value.dyn_into()?;

    if !resp.ok() {
        return Err(JsValue::from_str(&format!("API error: {}", resp.status())));
    }

    let json = JsFuture::from(resp.json()?).await?;
    let response: GenerateContentResponse = serde_wasm_bindgen::from_value(json)?;
    Ok(response)
}

#[async_trait(?Send)]
impl GeminiTransport for FetchTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let api_key = self.api_key.borrow().clone();
        if api_key.trim().is_empty() {
            return Err(Error::Config("APIキーが入力されていません".into()));
        }
        call_gemini_api(&api_key, model, request)
            .await
            .map_err(|e| js_error("generateContent", e))
    }
}
