use thiserror::Error;

#[derive(Error, Debug)]
pub enum LessonLensError {
    #[error(transparent)]
    Common(#[from] lesson_lens_common::Error),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`lesson-lens config --set-api-key YOUR_KEY` または環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("入力がありません。テキストかファイルを指定してください")]
    EmptyInput,

    #[error("操作に失敗しました: {0}")]
    OperationFailed(&'static str),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LessonLensError>;
