//! サブコマンドの共通処理

use crate::config::Config;
use crate::error::{LessonLensError, Result};
use crate::files::PathUpload;
use crate::gemini::ReqwestTransport;
use crate::wav::WavFileBackend;
use base64::Engine as _;
use indicatif::{ProgressBar, ProgressStyle};
use lesson_lens_common::payload::{extract_base64_from_data_url, extract_mime_type_from_data_url};
use lesson_lens_common::{
    GeminiLessonService, LessonSession, OperationMode, OperationResult, QuizQuestion, RunOutcome,
    UploadSummary,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type CliSession = LessonSession<GeminiLessonService<ReqwestTransport>, WavFileBackend>;

/// 設定からセッションを組み立てる
pub fn build_session(config: &Config, audio_output: &Path, language: Option<&str>) -> Result<CliSession> {
    let api_key = config.get_api_key()?;
    let transport = ReqwestTransport::new(api_key)?;
    let service = GeminiLessonService::new(transport, config.models.clone());
    let session = LessonSession::new(service, WavFileBackend::new(audio_output));
    session.select_language(language.unwrap_or(&config.default_language))?;
    Ok(session)
}

/// テキストとファイルを入力バッファに取り込む
pub async fn load_input(session: &CliSession, text: Option<String>, files: &[PathBuf]) -> Result<UploadSummary> {
    if let Some(missing) = files.iter().find(|f| !f.is_file()) {
        return Err(LessonLensError::FileNotFound(missing.display().to_string()));
    }
    if let Some(text) = text {
        session.set_text(text);
    }
    let uploads: Vec<PathUpload> = files.iter().map(PathUpload::new).collect();
    Ok(session.add_uploads(&uploads).await)
}

/// 待ち時間にスピナーを表示
pub async fn with_spinner<F: Future>(message: &str, future: F) -> F::Output {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    let output = future.await;
    pb.finish_and_clear();
    output
}

pub fn progress_message(mode: OperationMode) -> &'static str {
    match mode {
        OperationMode::Simplify => "やさしく言い換え中...",
        OperationMode::Summarize => "要約中...",
        OperationMode::Quiz => "クイズを作成中...",
        OperationMode::Visualize => "図解を生成中...",
        OperationMode::Speech => "音声を生成中...",
    }
}

/// 操作を実行して結果を取り出す
pub async fn run_operation(session: &CliSession, mode: OperationMode) -> Result<OperationResult> {
    match with_spinner(progress_message(mode), session.run(mode)).await {
        RunOutcome::Completed(result) => Ok(result),
        RunOutcome::Skipped => Err(LessonLensError::EmptyInput),
        RunOutcome::Failed(notice) => Err(LessonLensError::OperationFailed(notice.message())),
        RunOutcome::PlaybackStopped => Err(LessonLensError::OperationFailed("再生を停止しました")),
    }
}

/// 画像のMIMEタイプから拡張子
pub fn image_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// 画像の Data URL をファイルに保存
pub fn save_image(data_url: &str, output: &Path) -> Result<PathBuf> {
    let encoded = extract_base64_from_data_url(data_url)
        .ok_or_else(|| LessonLensError::Config("画像データが不正です".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| LessonLensError::Config(format!("画像データのデコードに失敗: {}", e)))?;

    let path = if output.extension().is_some() {
        output.to_path_buf()
    } else {
        output.with_extension(image_extension(extract_mime_type_from_data_url(data_url)))
    };
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// クイズを文字列に整形（正解は末尾にまとめる）
pub fn format_quiz(questions: &[QuizQuestion]) -> String {
    let mut out = String::new();
    for (i, q) in questions.iter().enumerate() {
        out.push_str(&format!("Q{}. {}\n", i + 1, q.question()));
        for (j, option) in q.options().iter().enumerate() {
            out.push_str(&format!("   {}) {}\n", option_label(j), option));
        }
        out.push('\n');
    }
    let answers: Vec<String> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("Q{}={}", i + 1, option_label(q.correct_answer_index())))
        .collect();
    out.push_str(&format!("正解: {}", answers.join(", ")));
    out
}

pub fn option_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// 結果を表示し、指定があればファイルに保存
pub fn emit_result(result: &OperationResult, output: Option<&Path>, audio_output: &Path) -> Result<()> {
    match result {
        OperationResult::Text(text) => {
            println!("{}", text);
            if let Some(path) = output {
                std::fs::write(path, text)?;
                println!("\n✔ 保存: {}", path.display());
            }
        }
        OperationResult::Quiz(questions) => {
            println!("{}", format_quiz(questions));
            if let Some(path) = output {
                std::fs::write(path, serde_json::to_string_pretty(questions)?)?;
                println!("\n✔ 保存: {}", path.display());
            }
        }
        OperationResult::Image(data_url) => {
            let target = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("visual"));
            let path = save_image(data_url, &target)?;
            println!("✔ 図解を保存: {}", path.display());
        }
        OperationResult::Audio(_) => {
            println!("✔ 音声を保存: {}", audio_output.display());
        }
    }
    Ok(())
}
