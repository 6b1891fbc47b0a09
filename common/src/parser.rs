//! APIレスポンスパーサー
//!
//! Gemini のテキスト応答からJSONを抽出し、クイズ問題をパースする

use crate::error::{Error, Result};
use crate::types::QuizQuestion;

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の [...] 配列
/// 3. エラー
///
/// # Examples
/// ```
/// use lesson_lens_common::extract_json;
///
/// let response = "[{\"question\": \"Q\"}]";
/// let json = extract_json(response).unwrap();
/// assert!(json.contains("question"));
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7;
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    // 生の [...] を探す
    if let Some(start) = response.find('[') {
        if let Some(end) = response.rfind(']') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSON array not found".into()))
}

/// クイズレスポンスをパース
///
/// 各問題は生成時に検証される（正解インデックスが範囲外なら全体をエラー）
///
/// # Returns
/// * `Ok(Vec<QuizQuestion>)` - 1問以上パース成功
/// * `Err` - JSONが見つからない / パース失敗 / 空配列
pub fn parse_quiz_response(response: &str) -> Result<Vec<QuizQuestion>> {
    let json_str = extract_json(response)?;
    let questions: Vec<QuizQuestion> = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("Quiz JSON parse error: {}", e)))?;

    if questions.is_empty() {
        return Err(Error::EmptyResponse("quiz contained no questions".into()));
    }
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // extract_json テスト
    // =============================================

    #[test]
    fn test_extract_json_with_block() {
        let response = r#"Here is your quiz:
```json
[
  {"question": "Q1", "options": ["a", "b"], "correctAnswer": 0}
]
```
Good luck."#;

        let json = extract_json(response).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("Q1"));
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = r#"Result: [{"key": "value"}] done."#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"[{"key": "value"}]"#);
    }

    #[test]
    fn test_extract_json_error() {
        let result = extract_json("No JSON here, just plain text.");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_extract_json_empty_response() {
        assert!(extract_json("").is_err());
    }

    // =============================================
    // parse_quiz_response テスト
    // =============================================

    #[test]
    fn test_parse_quiz_response() {
        let response = r#"[
  {"question": "What do plants absorb?", "options": ["Light", "Sound", "Heat"], "correctAnswer": 0},
  {"question": "Where does it happen?", "options": ["Roots", "Chloroplasts"], "correctAnswer": 1}
]"#;

        let quiz = parse_quiz_response(response).unwrap();
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz[0].question(), "What do plants absorb?");
        assert_eq!(quiz[1].correct_answer_index(), 1);
        for q in &quiz {
            assert!(q.correct_answer_index() < q.options().len());
        }
    }

    #[test]
    fn test_parse_quiz_response_rejects_bad_index() {
        let response = r#"[{"question": "Q", "options": ["a", "b"], "correctAnswer": 4}]"#;
        let result = parse_quiz_response(response);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_quiz_response_empty_array() {
        let result = parse_quiz_response("[]");
        assert!(matches!(result, Err(Error::EmptyResponse(_))));
    }

    #[test]
    fn test_parse_quiz_response_missing_field() {
        let response = r#"[{"question": "Q", "options": ["a", "b"]}]"#;
        assert!(parse_quiz_response(response).is_err());
    }

    #[test]
    fn test_parse_quiz_response_not_json() {
        assert!(parse_quiz_response("I cannot make a quiz.").is_err());
    }
}
