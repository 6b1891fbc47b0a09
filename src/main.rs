use clap::Parser;
use lesson_lens::{cli, commands, config, error, interactive, logging};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use lesson_lens_common::language::SUPPORTED_LANGUAGES;
use lesson_lens_common::OperationMode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Run { mode, text, files, language, output } => {
            let mode = OperationMode::from(mode);
            println!("📚 lesson-lens - {}\n", mode);

            let audio_output = match (mode, &output) {
                (OperationMode::Speech, Some(path)) => path.clone(),
                _ => std::path::PathBuf::from("speech.wav"),
            };
            let session = commands::build_session(&config, &audio_output, language.as_deref())?;

            let summary = commands::load_input(&session, text, &files).await?;
            if summary.text_files + summary.assets > 0 {
                println!(
                    "✔ ファイルを取り込み: テキスト{}件 / 添付{}件\n",
                    summary.text_files, summary.assets
                );
            }

            let result = commands::run_operation(&session, mode).await?;
            let output = if mode == OperationMode::Speech { None } else { output.as_deref() };
            commands::emit_result(&result, output, &audio_output)?;
        }

        Commands::Speak { text, language, output } => {
            let session = commands::build_session(&config, &output, language.as_deref())?;
            let outcome = commands::with_spinner(
                commands::progress_message(OperationMode::Speech),
                session.speak(&text),
            )
            .await;
            match outcome {
                lesson_lens_common::RunOutcome::Completed(result) => {
                    commands::emit_result(&result, None, &output)?;
                }
                lesson_lens_common::RunOutcome::Failed(notice) => {
                    return Err(error::LessonLensError::OperationFailed(notice.message()));
                }
                _ => return Err(error::LessonLensError::EmptyInput),
            }
        }

        Commands::Session { language, audio_output } => {
            let session = commands::build_session(&config, &audio_output, language.as_deref())?;
            interactive::run_interactive_session(&session, &audio_output).await?;
        }

        Commands::Languages => {
            for language in SUPPORTED_LANGUAGES {
                let marker = if language.code == config.default_language { "*" } else { " " };
                println!(
                    "{} {} {:<9} {} / {}",
                    marker, language.flag, language.code, language.display_name, language.native_display_name
                );
            }
        }

        Commands::Config { set_api_key, set_language, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(code) = set_language {
                config.set_default_language(&code)?;
                println!("✔ 既定言語を設定しました: {}", code);
            }

            if show {
                println!("設定:");
                println!("  テキストモデル: {}", config.models.text_model);
                println!("  画像モデル: {}", config.models.image_model);
                println!("  音声モデル: {}", config.models.speech_model);
                println!("  既定言語: {}", config.default_language);
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
