//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Invalid quiz question: {0}")]
    InvalidQuiz(String),

    #[error("Audio decode error: {0}")]
    Decode(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Upload error: {0}")]
    Upload(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// ユーザーに表示する汎用通知
///
/// エラーの詳細はログにのみ出力し、画面には短い定型文だけを出す
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ProcessingFailed,
    AudioFailed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::ProcessingFailed => "Something went wrong. Please try again.",
            Notice::AudioFailed => "Audio generation failed.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        let display = format!("{}", error);
        assert!(display.contains("JSON error"));
    }

    #[test]
    fn test_error_display_config() {
        let error = Error::Config("APIキーがありません".to_string());
        assert_eq!(format!("{}", error), "Config error: APIキーがありません");
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_notice_messages_are_distinct() {
        assert_eq!(Notice::ProcessingFailed.message(), "Something went wrong. Please try again.");
        assert_eq!(Notice::AudioFailed.message(), "Audio generation failed.");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::UnknownLanguage("xx".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("UnknownLanguage"));
        assert!(debug.contains("xx"));
    }
}
