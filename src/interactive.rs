//! 対話セッション
//!
//! `/` で始まる行はコマンド、それ以外は入力テキストに追記する。

use crate::commands::{
    emit_result, format_quiz, load_input, option_label, progress_message, with_spinner, CliSession,
};
use crate::error::{LessonLensError, Result};
use dialoguer::{Input, Select};
use lesson_lens_common::language::{flag_for, SUPPORTED_LANGUAGES};
use lesson_lens_common::{HistoryEntry, OperationMode, OperationResult, QuizQuestion, RunOutcome};
use std::path::{Path, PathBuf};

/// 対話アクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// 入力テキストに追記
    Text(String),
    /// 操作を実行
    Run(OperationMode),
    /// 直近の結果の読み上げ/停止
    ToggleSpeech,
    /// ファイルを追加
    AddFiles(Vec<PathBuf>),
    /// 添付を削除（1始まり）
    RemoveFile(usize),
    /// 言語を変更
    Language(String),
    /// 履歴を検索
    History(String),
    /// 直前の検索結果から復元（1始まり）
    Restore(usize),
    /// 入力テキストを消去
    Clear,
    /// 現在の状態を表示
    Status,
    Help,
    Quit,
    Unknown(String),
}

const HELP: &str = "\
コマンド:
  /simplify /summarize /quiz /visualize /speech   操作を実行
  /play                 直近の結果を読み上げ（再生中なら停止）
  /file <path>...       ファイルを追加
  /remove <n>           n番目の添付を削除
  /lang <code>          言語を変更（例: /lang ar-sy）
  /history [query]      履歴を検索
  /restore <n>          検索結果のn番目を復元
  /clear                入力テキストを消去
  /status               現在の入力を表示
  /quit                 終了
それ以外の行は入力テキストに追記します";

/// 入力行をアクションに変換
pub fn parse_action(line: &str) -> SessionAction {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return SessionAction::Text(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    if let Some(mode) = OperationMode::parse(name) {
        return SessionAction::Run(mode);
    }

    match name {
        "play" => SessionAction::ToggleSpeech,
        "file" | "f" if !rest.is_empty() => {
            SessionAction::AddFiles(rest.split_whitespace().map(PathBuf::from).collect())
        }
        "remove" | "rm" => match rest.parse::<usize>() {
            Ok(n) if n > 0 => SessionAction::RemoveFile(n),
            _ => SessionAction::Unknown(trimmed.to_string()),
        },
        "lang" | "l" if !rest.is_empty() => SessionAction::Language(rest.to_string()),
        "history" | "h" => SessionAction::History(rest.to_string()),
        "restore" | "r" => match rest.parse::<usize>() {
            Ok(n) if n > 0 => SessionAction::Restore(n),
            _ => SessionAction::Unknown(trimmed.to_string()),
        },
        "clear" => SessionAction::Clear,
        "status" => SessionAction::Status,
        "help" | "?" => SessionAction::Help,
        "quit" | "q" | "exit" => SessionAction::Quit,
        _ => SessionAction::Unknown(trimmed.to_string()),
    }
}

/// 履歴一覧の1行
pub fn format_history_line(index: usize, entry: &HistoryEntry) -> String {
    format!(
        "{:>2}) {} {} [{}] {}",
        index + 1,
        flag_for(&entry.language_code),
        entry.title(),
        entry.mode,
        entry.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S")
    )
}

/// 対話セッションを実行
pub async fn run_interactive_session(session: &CliSession, audio_output: &Path) -> Result<()> {
    println!(
        "📚 lesson-lens - 対話セッション（言語: {} {}）",
        session.language().flag,
        session.language().display_name
    );
    println!("{}\n", HELP);

    let mut last_search: Vec<HistoryEntry> = Vec::new();

    loop {
        let line: String = Input::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| LessonLensError::Config(e.to_string()))?;

        match parse_action(&line) {
            SessionAction::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                let mut pending = session.pending().text;
                if !pending.is_empty() {
                    pending.push('\n');
                }
                pending.push_str(&text);
                session.set_text(pending);
            }
            SessionAction::Run(mode) => {
                let outcome = with_spinner(progress_message(mode), session.run(mode)).await;
                handle_outcome(session, outcome, audio_output)?;
            }
            SessionAction::ToggleSpeech => {
                let outcome = with_spinner(progress_message(OperationMode::Speech), session.toggle_speech()).await;
                handle_outcome(session, outcome, audio_output)?;
            }
            SessionAction::AddFiles(files) => match load_input(session, None, &files).await {
                Ok(summary) => {
                    println!(
                        "✔ テキスト{}件を追記、添付{}件を追加{}",
                        summary.text_files,
                        summary.assets,
                        if summary.skipped > 0 {
                            format!("（{}件は読み込めずスキップ）", summary.skipped)
                        } else {
                            String::new()
                        }
                    );
                }
                Err(e) => println!("⚠ {}", e),
            },
            SessionAction::RemoveFile(n) => match session.remove_file(n - 1) {
                Some(asset) => println!("✔ 削除: {}", asset.name),
                None => println!("⚠ {}番目の添付はありません", n),
            },
            SessionAction::Language(code) => match session.select_language(&code) {
                Ok(language) => println!("✔ 言語: {} {}", language.flag, language.display_name),
                Err(_) => {
                    let codes: Vec<_> = SUPPORTED_LANGUAGES.iter().map(|l| l.code).collect();
                    println!("⚠ 未対応の言語コードです（{}）", codes.join(", "));
                }
            },
            SessionAction::History(query) => {
                last_search = session.search_history(&query);
                if last_search.is_empty() {
                    println!("履歴はありません");
                }
                for (i, entry) in last_search.iter().enumerate() {
                    println!("{}", format_history_line(i, entry));
                }
            }
            SessionAction::Restore(n) => match last_search.get(n - 1) {
                Some(entry) => {
                    session.restore(entry.id);
                    println!("✔ 復元: {}", entry.title());
                    if let Some(result) = &entry.result {
                        println!("\n{}\n", result);
                    }
                }
                None => println!("⚠ 先に /history で検索してください"),
            },
            SessionAction::Clear => session.set_text(""),
            SessionAction::Status => print_status(session),
            SessionAction::Help => println!("{}", HELP),
            SessionAction::Quit => break,
            SessionAction::Unknown(command) => println!("⚠ 不明なコマンド: {}（/help で一覧）", command),
        }
    }

    session.release_audio();
    Ok(())
}

fn handle_outcome(session: &CliSession, outcome: RunOutcome, audio_output: &Path) -> Result<()> {
    match outcome {
        RunOutcome::Completed(OperationResult::Quiz(questions)) => {
            take_quiz(&questions)?;
        }
        RunOutcome::Completed(result) => emit_result(&result, None, audio_output)?,
        RunOutcome::Skipped => println!("⚠ 入力がありません"),
        RunOutcome::PlaybackStopped => println!("■ 再生を停止しました"),
        RunOutcome::Failed(notice) => {
            println!("⚠ {}", notice.message());
            session.dismiss_notice();
        }
    }
    Ok(())
}

/// クイズに答えてもらい採点する
fn take_quiz(questions: &[QuizQuestion]) -> Result<()> {
    let mut score = 0;
    for (i, q) in questions.iter().enumerate() {
        let items: Vec<String> = q
            .options()
            .iter()
            .enumerate()
            .map(|(j, o)| format!("{}) {}", option_label(j), o))
            .collect();
        let choice = Select::new()
            .with_prompt(format!("Q{}. {}", i + 1, q.question()))
            .items(&items)
            .default(0)
            .interact()
            .map_err(|e| LessonLensError::Config(e.to_string()))?;

        if q.is_correct(choice) {
            score += 1;
            println!("  ✔ 正解\n");
        } else {
            println!("  ✘ 正解は {}\n", option_label(q.correct_answer_index()));
        }
    }
    println!("スコア: {}/{}", score, questions.len());
    println!("\n{}", format_quiz(questions));
    Ok(())
}

fn print_status(session: &CliSession) {
    let snapshot = session.snapshot();
    println!(
        "言語: {} {} / 履歴: {}件{}",
        snapshot.language.flag,
        snapshot.language.display_name,
        snapshot.history_len,
        if snapshot.playing { " / 再生中" } else { "" }
    );
    if snapshot.pending.text.is_empty() {
        println!("テキスト: (なし)");
    } else {
        println!("テキスト:\n{}", snapshot.pending.text);
    }
    for (i, file) in snapshot.pending.files.iter().enumerate() {
        println!("  添付{}: {} ({})", i + 1, file.name, file.mime_type);
    }
}
