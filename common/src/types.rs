//! 学習支援セッションの型定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - BinaryAsset: アップロードされた非テキストファイル
//! - OperationMode: 変換の種類
//! - QuizQuestion: 検証済みのクイズ問題
//! - OperationResult: 1回の操作の結果（モードごとに1つの形）
//! - HistoryEntry: 完了した操作の履歴
//! - PendingInput: 操作前の入力バッファ

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 非テキストファイル（Data URL形式）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryAsset {
    /// "data:application/pdf;base64,..." 形式
    pub data: String,
    pub mime_type: String,
    pub name: String,
}

/// 操作モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Simplify,
    Summarize,
    Quiz,
    Visualize,
    Speech,
}

impl OperationMode {
    pub const ALL: [OperationMode; 5] = [
        OperationMode::Simplify,
        OperationMode::Summarize,
        OperationMode::Quiz,
        OperationMode::Visualize,
        OperationMode::Speech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationMode::Simplify => "simplify",
            OperationMode::Summarize => "summarize",
            OperationMode::Quiz => "quiz",
            OperationMode::Visualize => "visualize",
            OperationMode::Speech => "speech",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// APIが返すクイズ問題（未検証）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
}

/// クイズ問題
///
/// 生成時に `0 <= correct_answer_index < options.len()` かつ選択肢2つ以上を保証する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuizQuestion")]
pub struct QuizQuestion {
    question: String,
    options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    correct_answer_index: usize,
}

impl QuizQuestion {
    pub fn new(question: impl Into<String>, options: Vec<String>, correct_answer_index: i64) -> Result<Self> {
        let question = question.into();
        if options.len() < 2 {
            return Err(Error::InvalidQuiz(format!(
                "選択肢が不足しています ({}個): {}",
                options.len(),
                question
            )));
        }
        let index = usize::try_from(correct_answer_index)
            .ok()
            .filter(|&i| i < options.len())
            .ok_or_else(|| {
                Error::InvalidQuiz(format!(
                    "正解インデックス {} が範囲外です (選択肢{}個): {}",
                    correct_answer_index,
                    options.len(),
                    question
                ))
            })?;

        Ok(Self {
            question,
            options,
            correct_answer_index: index,
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    /// 選んだ選択肢が正解か
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_answer_index
    }
}

impl TryFrom<RawQuizQuestion> for QuizQuestion {
    type Error = Error;

    fn try_from(raw: RawQuizQuestion) -> Result<Self> {
        QuizQuestion::new(raw.question, raw.options, raw.correct_answer)
    }
}

/// 再生した音声クリップの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioClipId(pub u64);

/// 操作結果（モードごとに1つの形）
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// simplify / summarize の説明文
    Text(String),
    /// visualize の画像（Data URL）
    Image(String),
    /// quiz の問題リスト
    Quiz(Vec<QuizQuestion>),
    /// speech の再生クリップ
    Audio(AudioClipId),
}

impl OperationResult {
    /// 履歴に残すテキスト（テキスト結果のみ）
    pub fn history_text(&self) -> Option<&str> {
        match self {
            OperationResult::Text(text) => Some(text),
            OperationResult::Image(_) | OperationResult::Quiz(_) | OperationResult::Audio(_) => None,
        }
    }
}

/// 履歴エントリID（セッション内で単調増加）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

/// 履歴タイトルの最大文字数
const TITLE_MAX_CHARS: usize = 40;

/// 完了した操作の履歴
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: EntryId,
    pub original_text: String,
    pub files: Vec<BinaryAsset>,
    pub result: Option<String>,
    pub mode: OperationMode,
    pub language_code: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// 一覧表示用のタイトル（本文がなければ "Document"）
    pub fn title(&self) -> String {
        let trimmed = self.original_text.trim();
        if trimmed.is_empty() {
            return "Document".to_string();
        }
        trimmed.chars().take(TITLE_MAX_CHARS).collect()
    }
}

/// 操作前の入力バッファ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInput {
    pub text: String,
    pub files: Vec<BinaryAsset>,
}

impl PendingInput {
    /// テキストも添付もない（空白のみは空扱い）
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.files.is_empty()
    }

    /// テキストファイルの内容を追記（既存テキストがあれば空行を挟む）
    pub fn append_text(&mut self, text: &str) {
        if !self.text.is_empty() {
            self.text.push_str("\n\n");
        }
        self.text.push_str(text);
    }

    /// 添付を末尾に追加（既存の並びは保持）
    pub fn extend_files(&mut self, assets: impl IntoIterator<Item = BinaryAsset>) {
        self.files.extend(assets);
    }

    /// 指定位置の添付を削除（範囲外はNone）
    pub fn remove_file(&mut self, index: usize) -> Option<BinaryAsset> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> BinaryAsset {
        BinaryAsset {
            data: format!("data:image/png;base64,{}", name),
            mime_type: "image/png".to_string(),
            name: name.to_string(),
        }
    }

    // =============================================
    // QuizQuestion テスト
    // =============================================

    #[test]
    fn test_quiz_question_valid() {
        let q = QuizQuestion::new("2+2?", vec!["3".into(), "4".into()], 1).unwrap();
        assert_eq!(q.correct_answer_index(), 1);
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
    }

    #[test]
    fn test_quiz_question_index_out_of_range() {
        let result = QuizQuestion::new("q", vec!["a".into(), "b".into()], 2);
        assert!(matches!(result, Err(Error::InvalidQuiz(_))));
    }

    #[test]
    fn test_quiz_question_negative_index() {
        let result = QuizQuestion::new("q", vec!["a".into(), "b".into()], -1);
        assert!(matches!(result, Err(Error::InvalidQuiz(_))));
    }

    #[test]
    fn test_quiz_question_too_few_options() {
        let result = QuizQuestion::new("q", vec!["only".into()], 0);
        assert!(matches!(result, Err(Error::InvalidQuiz(_))));
    }

    #[test]
    fn test_quiz_question_deserialize_validates() {
        let ok = r#"{"question": "Q", "options": ["a", "b", "c"], "correctAnswer": 2}"#;
        let q: QuizQuestion = serde_json::from_str(ok).expect("デシリアライズ失敗");
        assert_eq!(q.options().len(), 3);

        let bad = r#"{"question": "Q", "options": ["a", "b"], "correctAnswer": 5}"#;
        assert!(serde_json::from_str::<QuizQuestion>(bad).is_err());
    }

    #[test]
    fn test_quiz_question_serialize_uses_wire_names() {
        let q = QuizQuestion::new("Q", vec!["a".into(), "b".into()], 0).unwrap();
        let json = serde_json::to_string(&q).expect("シリアライズ失敗");
        assert!(json.contains("\"correctAnswer\":0"));
    }

    // =============================================
    // OperationMode テスト
    // =============================================

    #[test]
    fn test_mode_parse_roundtrip() {
        for mode in OperationMode::ALL {
            assert_eq!(OperationMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(OperationMode::parse("translate"), None);
    }

    #[test]
    fn test_mode_serialize_lowercase() {
        let json = serde_json::to_string(&OperationMode::Summarize).unwrap();
        assert_eq!(json, "\"summarize\"");
    }

    // =============================================
    // PendingInput テスト
    // =============================================

    #[test]
    fn test_pending_input_empty_when_whitespace_only() {
        let input = PendingInput {
            text: "  \n\t".to_string(),
            files: vec![],
        };
        assert!(input.is_empty());
    }

    #[test]
    fn test_pending_input_not_empty_with_files() {
        let input = PendingInput {
            text: String::new(),
            files: vec![asset("a")],
        };
        assert!(!input.is_empty());
    }

    #[test]
    fn test_append_text_separator() {
        let mut input = PendingInput::default();
        input.append_text("first");
        input.append_text("second");
        assert_eq!(input.text, "first\n\nsecond");
    }

    #[test]
    fn test_remove_file_preserves_order() {
        let mut input = PendingInput::default();
        input.extend_files(vec![asset("a"), asset("b"), asset("c"), asset("d")]);

        let removed = input.remove_file(1).expect("削除失敗");
        assert_eq!(removed.name, "b");
        let names: Vec<_> = input.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_remove_file_out_of_range() {
        let mut input = PendingInput::default();
        input.extend_files(vec![asset("a")]);
        assert!(input.remove_file(3).is_none());
        assert_eq!(input.files.len(), 1);
    }

    // =============================================
    // HistoryEntry テスト
    // =============================================

    #[test]
    fn test_history_title() {
        let mut entry = HistoryEntry {
            id: EntryId(1),
            original_text: "x".repeat(100),
            files: vec![],
            result: None,
            mode: OperationMode::Simplify,
            language_code: "en".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(entry.title().chars().count(), 40);

        entry.original_text = "   ".to_string();
        assert_eq!(entry.title(), "Document");
    }

    #[test]
    fn test_history_text_only_for_text_results() {
        assert_eq!(OperationResult::Text("t".into()).history_text(), Some("t"));
        assert_eq!(OperationResult::Image("data:".into()).history_text(), None);
        assert_eq!(OperationResult::Quiz(vec![]).history_text(), None);
        assert_eq!(OperationResult::Audio(AudioClipId(1)).history_text(), None);
    }
}
