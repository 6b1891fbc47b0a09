//! LessonLens Common Library
//!
//! CLIとWeb(WASM)で共有される学習支援セッションのコア

pub mod types;
pub mod language;
pub mod error;
pub mod prompts;
pub mod parser;
pub mod payload;
pub mod service;
pub mod normalizer;
pub mod history;
pub mod audio;
pub mod session;

pub use types::{BinaryAsset, EntryId, HistoryEntry, OperationMode, OperationResult, PendingInput, QuizQuestion};
pub use language::{default_language, find_language, flag_for, LanguageTarget, SUPPORTED_LANGUAGES};
pub use error::{Error, Notice, Result};
pub use parser::{extract_json, parse_quiz_response};
pub use service::{GeminiLessonService, GeminiTransport, LessonService, ModelConfig};
pub use normalizer::{InMemoryUpload, UploadSource, UploadSummary};
pub use history::HistoryLedger;
pub use audio::{AudioBackend, AudioContext, AudioStream, PcmBuffer, SpeechPlayer};
pub use session::{LessonSession, RunOutcome, SessionSnapshot};
