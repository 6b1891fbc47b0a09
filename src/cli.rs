use clap::{Parser, Subcommand, ValueEnum};
use lesson_lens_common::OperationMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lesson-lens")]
#[command(about = "学習資料をやさしく言い換え・要約・クイズ化・図解・読み上げするツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 1回だけ操作を実行
    Run {
        /// 操作 (simplify/summarize/quiz/visualize/speech)
        #[arg(value_enum)]
        mode: ModeArg,

        /// 入力テキスト
        #[arg(short, long)]
        text: Option<String>,

        /// 添付ファイル（複数指定可、指定順に取り込む）
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// 言語コード（省略時は設定の既定言語）
        #[arg(short, long)]
        language: Option<String>,

        /// 結果の出力先（テキスト/クイズJSON/画像/WAV）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// テキストを読み上げてWAVに書き出す
    Speak {
        /// 読み上げるテキスト
        #[arg(required = true)]
        text: String,

        /// 言語コード
        #[arg(short, long)]
        language: Option<String>,

        /// 出力WAVファイル
        #[arg(short, long, default_value = "speech.wav")]
        output: PathBuf,
    },

    /// 対話セッション（履歴の検索・復元つき）
    Session {
        /// 言語コード
        #[arg(short, long)]
        language: Option<String>,

        /// 読み上げ音声の出力先
        #[arg(long, default_value = "speech.wav")]
        audio_output: PathBuf,
    },

    /// 対応言語を一覧表示
    Languages,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 既定言語を設定
        #[arg(long)]
        set_language: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Simplify,
    Summarize,
    Quiz,
    Visualize,
    Speech,
}

impl From<ModeArg> for OperationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Simplify => OperationMode::Simplify,
            ModeArg::Summarize => OperationMode::Summarize,
            ModeArg::Quiz => OperationMode::Quiz,
            ModeArg::Visualize => OperationMode::Visualize,
            ModeArg::Speech => OperationMode::Speech,
        }
    }
}
