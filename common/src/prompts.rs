//! プロンプト生成モジュール
//!
//! CLIとWeb(WASM)で共有されるモード別プロンプト:
//! - build_simplify_prompt / build_summarize_prompt / build_quiz_prompt
//! - build_visualize_prompt / build_speech_prompt
//! - 各モードのシステム指示と音声選択

/// 生成するクイズの問題数
pub const QUIZ_QUESTION_COUNT: usize = 3;

/// アラビア語向けの音声
pub const ARABIC_VOICE: &str = "Puck";

/// それ以外の言語向けの音声
pub const DEFAULT_VOICE: &str = "Kore";

/// simplify 用プロンプト
///
/// エジプト方言・シリア方言には口語での言い換えを指示する
pub fn build_simplify_prompt(text: &str, language_name: &str) -> String {
    format!(
        r#"Simplify the following lesson material.
The target language is: {language_name}.
- If it's Egyptian Arabic, use a friendly, simplified Egyptian dialect (بستطالهالي).
- If it's Syrian Arabic, use a friendly, simplified Syrian dialect (Levantine/شامي).
- Otherwise, use clear, simple words for a student in the specified language.
Material: {text}"#
    )
}

pub fn simplify_system_instruction(language_name: &str) -> String {
    format!(
        "You are a world-class tutor who excels at making complex topics simple. You always respond in {}.",
        language_name
    )
}

/// summarize 用プロンプト
pub fn build_summarize_prompt(text: &str, language_name: &str) -> String {
    format!(
        "Provide a structured summary with bullet points in {} for the following material: {}",
        language_name, text
    )
}

pub fn summarize_system_instruction(language_name: &str) -> String {
    format!(
        "You are an expert at extracting key concepts. You always respond in {}.",
        language_name
    )
}

/// quiz 用プロンプト
pub fn build_quiz_prompt(text: &str, language_name: &str) -> String {
    format!(
        r#"Based on this lesson material: "{text}", generate {QUIZ_QUESTION_COUNT} multiple-choice questions in JSON format. The language of the quiz must be {language_name}."#
    )
}

/// quiz レスポンスのJSONスキーマ
pub fn quiz_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "question": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "correctAnswer": {
                    "type": "INTEGER",
                    "description": "Index of the correct option (0-3)"
                }
            },
            "required": ["question", "options", "correctAnswer"]
        }
    })
}

/// visualize 用プロンプト
pub fn build_visualize_prompt(concept: &str) -> String {
    format!(
        "Create an educational, clean illustration that explains this concept: {}. Minimalist style, vibrant colors.",
        concept
    )
}

/// speech 用プロンプト
pub fn build_speech_prompt(text: &str, language_name: &str) -> String {
    format!(
        "Read this {} lesson explanation clearly and slowly: {}",
        language_name, text
    )
}

/// 言語名から音声を選ぶ
pub fn voice_for_language(language_name: &str) -> &'static str {
    if language_name.contains("Arabic") {
        ARABIC_VOICE
    } else {
        DEFAULT_VOICE
    }
}
