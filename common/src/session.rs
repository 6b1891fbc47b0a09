//! 学習セッション（操作ディスパッチャ）
//!
//! 入力バッファ、結果スロット、履歴、実行中フラグを1つのオーナーに閉じ込める。
//! 単一スレッド前提なのでメソッドは `&self` で受け、内部可変性で状態を更新する。
//! 同時に走る操作は1つだけ（実行中の再トリガーは無視）。

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::audio::{AudioBackend, SpeakOutcome, SpeechPlayer};
use crate::error::{Error, Notice, Result};
use crate::history::{HistoryLedger, NewEntry};
use crate::language::{default_language, find_language, require_language, LanguageTarget};
use crate::normalizer::{absorb, normalize_batch, UploadSource, UploadSummary};
use crate::service::LessonService;
use crate::types::{
    BinaryAsset, EntryId, HistoryEntry, OperationMode, OperationResult, PendingInput, QuizQuestion,
};

/// 結果スロット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSlot {
    Text,
    Image,
    Quiz,
}

/// モードごとに実行開始時にクリアするスロット
///
/// simplify / summarize は quiz・image と排他。quiz と visualize は自分のスロットだけ上書きする。
pub fn slots_to_clear(mode: OperationMode) -> &'static [ResultSlot] {
    match mode {
        OperationMode::Simplify | OperationMode::Summarize => {
            &[ResultSlot::Text, ResultSlot::Quiz, ResultSlot::Image]
        }
        OperationMode::Quiz => &[ResultSlot::Quiz],
        OperationMode::Visualize => &[ResultSlot::Image],
        OperationMode::Speech => &[],
    }
}

/// 表示中の結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSlots {
    pub text: Option<String>,
    /// 画像の Data URL
    pub image: Option<String>,
    pub quiz: Option<Vec<QuizQuestion>>,
}

impl ResultSlots {
    pub fn clear(&mut self, slot: ResultSlot) {
        match slot {
            ResultSlot::Text => self.text = None,
            ResultSlot::Image => self.image = None,
            ResultSlot::Quiz => self.quiz = None,
        }
    }

    fn store(&mut self, result: &OperationResult) {
        match result {
            OperationResult::Text(text) => self.text = Some(text.clone()),
            OperationResult::Image(url) => self.image = Some(url.clone()),
            OperationResult::Quiz(questions) => self.quiz = Some(questions.clone()),
            OperationResult::Audio(_) => {}
        }
    }
}

/// run の結果
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// 入力が空、または実行中のため何もしなかった
    Skipped,
    Completed(OperationResult),
    /// 失敗（詳細はログ、画面には通知のみ）
    Failed(Notice),
    /// 再生中だったため停止した
    PlaybackStopped,
}

/// 表示層に渡す状態のコピー
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub pending: PendingInput,
    pub language: &'static LanguageTarget,
    pub slots: ResultSlots,
    pub busy: bool,
    pub audio_loading: bool,
    pub playing: bool,
    pub notice: Option<Notice>,
    pub last_upload: Option<UploadSummary>,
    pub history_len: usize,
}

struct SessionState {
    pending: PendingInput,
    language: &'static LanguageTarget,
    slots: ResultSlots,
    notice: Option<Notice>,
    last_upload: Option<UploadSummary>,
}

/// 実行開始時に取る入力のコピー
struct OperationInput {
    pending: PendingInput,
    language: &'static LanguageTarget,
    /// visualize に渡すプロンプト
    visual_prompt: Option<String>,
}

/// 学習セッション
pub struct LessonSession<S, B: AudioBackend> {
    service: S,
    state: RefCell<SessionState>,
    busy: Cell<bool>,
    history: RefCell<HistoryLedger>,
    player: SpeechPlayer<B>,
    listener: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<S: LessonService, B: AudioBackend> LessonSession<S, B> {
    pub fn new(service: S, backend: B) -> Self {
        Self {
            service,
            state: RefCell::new(SessionState {
                pending: PendingInput::default(),
                language: default_language(),
                slots: ResultSlots::default(),
                notice: None,
                last_upload: None,
            }),
            busy: Cell::new(false),
            history: RefCell::new(HistoryLedger::new()),
            player: SpeechPlayer::new(backend),
            listener: RefCell::new(None),
        }
    }

    /// 状態変化の通知先を登録（音声の自然終了も含む）
    pub fn subscribe(&self, listener: Rc<dyn Fn()>) {
        self.player.set_listener(listener.clone());
        *self.listener.borrow_mut() = Some(listener);
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn player(&self) -> &SpeechPlayer<B> {
        &self.player
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.borrow();
        SessionSnapshot {
            pending: state.pending.clone(),
            language: state.language,
            slots: state.slots.clone(),
            busy: self.busy.get(),
            audio_loading: self.player.is_loading(),
            playing: self.player.is_playing(),
            notice: state.notice,
            last_upload: state.last_upload,
            history_len: self.history.borrow().len(),
        }
    }

    // ---------------------------------------------
    // 入力
    // ---------------------------------------------

    pub fn set_text(&self, text: impl Into<String>) {
        self.state.borrow_mut().pending.text = text.into();
        self.notify();
    }

    pub fn pending(&self) -> PendingInput {
        self.state.borrow().pending.clone()
    }

    /// ファイルを選択順に取り込む
    ///
    /// 操作の実行中でも取り込める（入力バッファは実行開始時にコピー済み）
    pub async fn add_uploads<U: UploadSource>(&self, uploads: &[U]) -> UploadSummary {
        let (normalized, skipped) = normalize_batch(uploads).await;
        let mut summary = absorb(&mut self.state.borrow_mut().pending, normalized);
        summary.skipped = skipped;
        debug!(
            text_files = summary.text_files,
            assets = summary.assets,
            skipped = summary.skipped,
            "ファイルを取り込み"
        );
        self.state.borrow_mut().last_upload = Some(summary);
        self.notify();
        summary
    }

    /// 添付を位置指定で削除
    pub fn remove_file(&self, index: usize) -> Option<BinaryAsset> {
        let removed = self.state.borrow_mut().pending.remove_file(index);
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    pub fn language(&self) -> &'static LanguageTarget {
        self.state.borrow().language
    }

    pub fn select_language(&self, code: &str) -> Result<&'static LanguageTarget> {
        let language = require_language(code)?;
        self.state.borrow_mut().language = language;
        self.notify();
        Ok(language)
    }

    pub fn dismiss_notice(&self) {
        self.state.borrow_mut().notice = None;
        self.notify();
    }

    // ---------------------------------------------
    // 操作
    // ---------------------------------------------

    /// 操作を実行
    pub async fn run(&self, mode: OperationMode) -> RunOutcome {
        if mode == OperationMode::Speech {
            return self.run_speech().await;
        }
        if self.busy.get() {
            debug!(%mode, "実行中のためスキップ");
            return RunOutcome::Skipped;
        }
        let Some(input) = self.prepare(mode) else {
            debug!(%mode, "入力が空のためスキップ");
            return RunOutcome::Skipped;
        };

        self.busy.set(true);
        {
            let mut state = self.state.borrow_mut();
            for &slot in slots_to_clear(mode) {
                state.slots.clear(slot);
            }
            state.notice = None;
        }
        self.notify();
        debug!(%mode, language = input.language.code, files = input.pending.files.len(), "操作を開始");

        let result = self.call_service(mode, &input).await;
        self.busy.set(false);

        match result {
            Ok(result) => {
                self.state.borrow_mut().slots.store(&result);
                self.record(mode, &input, result.history_text().map(str::to_string));
                self.notify();
                RunOutcome::Completed(result)
            }
            Err(e) => {
                error!(%mode, error = %e, "操作に失敗");
                let notice = Notice::ProcessingFailed;
                self.state.borrow_mut().notice = Some(notice);
                self.notify();
                RunOutcome::Failed(notice)
            }
        }
    }

    /// 入力のコピーを取る（実行不可なら None）
    fn prepare(&self, mode: OperationMode) -> Option<OperationInput> {
        let state = self.state.borrow();
        let visual_prompt = match mode {
            // 入力テキストがなければ直近のテキスト結果を使う（添付だけでは描けない）
            OperationMode::Visualize => Some(if state.pending.text.trim().is_empty() {
                state.slots.text.clone().filter(|t| !t.trim().is_empty())?
            } else {
                state.pending.text.clone()
            }),
            _ if state.pending.is_empty() => return None,
            _ => None,
        };

        Some(OperationInput {
            pending: state.pending.clone(),
            language: state.language,
            visual_prompt,
        })
    }

    async fn call_service(&self, mode: OperationMode, input: &OperationInput) -> Result<OperationResult> {
        let text = input.pending.text.as_str();
        let files = input.pending.files.as_slice();
        let language_name = input.language.display_name;

        match mode {
            OperationMode::Simplify => self
                .service
                .simplify(text, files, language_name)
                .await
                .map(OperationResult::Text),
            OperationMode::Summarize => self
                .service
                .summarize(text, files, language_name)
                .await
                .map(OperationResult::Text),
            OperationMode::Quiz => self
                .service
                .generate_quiz(text, files, language_name)
                .await
                .map(OperationResult::Quiz),
            OperationMode::Visualize => {
                let prompt = input.visual_prompt.as_deref().unwrap_or(text);
                self.service.generate_image(prompt).await.map(OperationResult::Image)
            }
            OperationMode::Speech => Err(Error::Config("speech is dispatched through the player".into())),
        }
    }

    fn record(&self, mode: OperationMode, input: &OperationInput, result: Option<String>) -> EntryId {
        // visualize は実際に送ったプロンプトを元テキストとして残す
        let original_text = input
            .visual_prompt
            .clone()
            .unwrap_or_else(|| input.pending.text.clone());
        self.history.borrow_mut().append(NewEntry {
            original_text,
            files: input.pending.files.clone(),
            result,
            mode,
            language_code: input.language.code.to_string(),
            timestamp: Utc::now(),
        })
    }

    // ---------------------------------------------
    // 音声
    // ---------------------------------------------

    /// speech モード: 入力テキスト（なければ直近のテキスト結果）を読み上げる
    async fn run_speech(&self) -> RunOutcome {
        let (input, text) = {
            let state = self.state.borrow();
            let text = if state.pending.text.trim().is_empty() {
                state.slots.text.clone().unwrap_or_default()
            } else {
                state.pending.text.clone()
            };
            let input = OperationInput {
                pending: state.pending.clone(),
                language: state.language,
                visual_prompt: None,
            };
            (input, text)
        };

        let outcome = self.speak_with(&text, input.language).await;
        if let RunOutcome::Completed(_) = &outcome {
            self.record(OperationMode::Speech, &input, None);
            self.notify();
        }
        outcome
    }

    /// 任意のテキストを読み上げる（再生中なら停止）
    pub async fn speak(&self, text: &str) -> RunOutcome {
        let language = self.language();
        self.speak_with(text, language).await
    }

    /// 直近のテキスト結果の再生・停止を切り替える
    pub async fn toggle_speech(&self) -> RunOutcome {
        if self.player.is_playing() {
            self.player.stop();
            return RunOutcome::PlaybackStopped;
        }
        let text = self.state.borrow().slots.text.clone();
        match text {
            Some(text) => self.speak(&text).await,
            None => RunOutcome::Skipped,
        }
    }

    pub fn stop_speech(&self) {
        self.player.stop();
    }

    /// 音声出力を解放（テスト・ページ破棄時）
    pub fn release_audio(&self) {
        self.player.release();
    }

    async fn speak_with(&self, text: &str, language: &LanguageTarget) -> RunOutcome {
        match self.player.speak(&self.service, text, language).await {
            Ok(SpeakOutcome::Started(clip)) => RunOutcome::Completed(OperationResult::Audio(clip)),
            Ok(SpeakOutcome::Stopped) => RunOutcome::PlaybackStopped,
            Ok(SpeakOutcome::Busy) | Ok(SpeakOutcome::Skipped) => RunOutcome::Skipped,
            Err(_) => {
                // 詳細はプレイヤー側でログ済み
                let notice = Notice::AudioFailed;
                self.state.borrow_mut().notice = Some(notice);
                self.notify();
                RunOutcome::Failed(notice)
            }
        }
    }

    // ---------------------------------------------
    // 履歴
    // ---------------------------------------------

    /// 新しい順の履歴
    pub fn history(&self) -> Ref<'_, HistoryLedger> {
        self.history.borrow()
    }

    pub fn search_history(&self, query: &str) -> Vec<HistoryEntry> {
        self.history.borrow().search(query).into_iter().cloned().collect()
    }

    /// 履歴から入力・言語・結果を復元（エントリは残す）
    pub fn restore(&self, id: EntryId) -> bool {
        let Some(entry) = self.history.borrow().get(id).cloned() else {
            warn!(%id, "履歴エントリが見つかりません");
            return false;
        };

        {
            let mut state = self.state.borrow_mut();
            state.pending = PendingInput {
                text: entry.original_text,
                files: entry.files,
            };
            match find_language(&entry.language_code) {
                Some(language) => state.language = language,
                None => warn!(code = %entry.language_code, "カタログにない言語コードのため言語は変更しません"),
            }
            state.slots = ResultSlots {
                text: entry.result,
                image: None,
                quiz: None,
            };
            state.notice = None;
        }
        self.notify();
        true
    }

    fn notify(&self) {
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}
