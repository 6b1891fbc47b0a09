//! Gemini リクエスト/レスポンス型とペイロード生成
//!
//! テキスト・添付ファイル・対象言語から各モードのリクエストを組み立てる。
//! CLI (reqwest) と WASM (fetch) のどちらのトランスポートでも同じ型を使う。

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::prompts;
use crate::types::BinaryAsset;

/// 画像生成のアスペクト比
pub const IMAGE_ASPECT_RATIO: &str = "1:1";

/// Gemini APIリクエスト
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

/// Gemini APIレスポンス
#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    /// ブロックされた応答では content が欠ける
    #[serde(default)]
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    pub inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseInlineData {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    pub mime_type: Option<String>,
    pub data: String,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// 先頭候補のテキストパートを連結（空ならNone）
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// 先頭候補の最初のインラインデータ
    pub fn first_inline_data(&self) -> Option<&ResponseInlineData> {
        self.first_parts().iter().find_map(|p| p.inline_data.as_ref())
    }
}

/// Data URLからBase64データ部分を抽出
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式のData URL
///
/// # Returns
/// Base64エンコードされたデータ部分、または抽出失敗時はNone
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    data_url.split(',').nth(1)
}

/// Data URLからMIMEタイプを抽出
///
/// 抽出失敗時は "application/octet-stream" を返す
pub fn extract_mime_type_from_data_url(data_url: &str) -> &str {
    data_url
        .split(':')
        .nth(1)
        .and_then(|s| s.split(';').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("application/octet-stream")
}

/// Base64データとMIMEタイプからData URLを作る
pub fn to_data_url(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}

/// テキスト + 添付ファイルのパートを作成
///
/// Data URLとして不正な添付はログを出してスキップする
pub fn build_parts(text: String, files: &[BinaryAsset]) -> Vec<Part> {
    let mut parts = vec![Part::Text { text }];

    for file in files {
        match extract_base64_from_data_url(&file.data) {
            Some(base64_data) => parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: file.mime_type.clone(),
                    data: base64_data.to_string(),
                },
            }),
            None => warn!(file = %file.name, "添付がData URL形式ではないためスキップ"),
        }
    }

    parts
}

fn system_instruction(text: String) -> Option<Content> {
    Some(Content {
        parts: vec![Part::Text { text }],
    })
}

/// simplify リクエスト
pub fn simplify_request(text: &str, files: &[BinaryAsset], language_name: &str) -> GenerateContentRequest {
    let prompt = prompts::build_simplify_prompt(text, language_name);
    GenerateContentRequest {
        contents: vec![Content {
            parts: build_parts(prompt, files),
        }],
        system_instruction: system_instruction(prompts::simplify_system_instruction(language_name)),
        generation_config: None,
    }
}

/// summarize リクエスト
pub fn summarize_request(text: &str, files: &[BinaryAsset], language_name: &str) -> GenerateContentRequest {
    let prompt = prompts::build_summarize_prompt(text, language_name);
    GenerateContentRequest {
        contents: vec![Content {
            parts: build_parts(prompt, files),
        }],
        system_instruction: system_instruction(prompts::summarize_system_instruction(language_name)),
        generation_config: None,
    }
}

/// quiz リクエスト（JSONスキーマ指定）
pub fn quiz_request(text: &str, files: &[BinaryAsset], language_name: &str) -> GenerateContentRequest {
    let prompt = prompts::build_quiz_prompt(text, language_name);
    GenerateContentRequest {
        contents: vec![Content {
            parts: build_parts(prompt, files),
        }],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(prompts::quiz_response_schema()),
            ..Default::default()
        }),
    }
}

/// 画像生成リクエスト（テキストのみ）
pub fn image_request(concept: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part::Text {
                text: prompts::build_visualize_prompt(concept),
            }],
        }],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            image_config: Some(ImageConfig {
                aspect_ratio: IMAGE_ASPECT_RATIO.to_string(),
            }),
            ..Default::default()
        }),
    }
}

/// 音声合成リクエスト
pub fn speech_request(text: &str, language_name: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part::Text {
                text: prompts::build_speech_prompt(text, language_name),
            }],
        }],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: prompts::voice_for_language(language_name).to_string(),
                    },
                },
            }),
            ..Default::default()
        }),
    }
}
