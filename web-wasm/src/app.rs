//! メインアプリケーションコンポーネント
//!
//! セッションは `StoredValue::new_local` に置き、状態変化の通知で
//! スナップショットのシグナルを更新する。

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use lesson_lens_common::{
    EntryId, GeminiLessonService, HistoryEntry, LessonSession, ModelConfig, OperationMode, RunOutcome,
};

use crate::api::gemini::{FetchTransport, SharedApiKey};
use crate::audio::WebAudioBackend;
use crate::components::{
    header::Header, history_panel::HistoryPanel, input_panel::InputPanel, mode_buttons::ModeButtons,
    progress_bar::ProgressBar, result_view::ResultView, settings_panel::SettingsPanel,
    upload_area::UploadArea,
};
use crate::upload::BrowserFile;

pub type WebSession = LessonSession<GeminiLessonService<FetchTransport>, WebAudioBackend>;

fn log_outcome(mode: &str, outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Failed(notice) => gloo::console::warn!(format!("{}: {}", mode, notice.message())),
        RunOutcome::Skipped => gloo::console::debug!(format!("{}: skipped", mode)),
        _ => {}
    }
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let shared_key: SharedApiKey = Rc::new(RefCell::new(String::new()));
    let service = GeminiLessonService::new(FetchTransport::new(shared_key.clone()), ModelConfig::default());
    let session: Rc<WebSession> = Rc::new(LessonSession::new(service, WebAudioBackend));

    let (snapshot, set_snapshot) = signal(session.snapshot());
    let (history, set_history) = signal(Vec::<HistoryEntry>::new());
    let (query, set_query) = signal(String::new());
    let (api_key, set_api_key) = signal(String::new());

    // Rc の循環を避けるため通知側は Weak で持つ
    let weak = Rc::downgrade(&session);
    session.subscribe(Rc::new(move || {
        if let Some(session) = weak.upgrade() {
            set_snapshot.set(session.snapshot());
            set_history.set(session.search_history(&query.get_untracked()));
        }
    }));

    let session = StoredValue::new_local(session);
    let shared_key = StoredValue::new_local(shared_key);

    Effect::new(move |_| {
        let key = api_key.get();
        shared_key.with_value(|shared| *shared.borrow_mut() = key.trim().to_string());
    });

    Effect::new(move |_| {
        let q = query.get();
        session.with_value(|s| set_history.set(s.search_history(&q)));
    });

    on_cleanup(move || {
        session.with_value(|s| s.release_audio());
    });

    let on_select_language = move |code: String| {
        session.with_value(|s| {
            if let Err(e) = s.select_language(&code) {
                gloo::console::warn!(e.to_string());
            }
        });
    };

    let on_text = move |text: String| session.with_value(|s| s.set_text(text));

    let on_remove = move |index: usize| {
        session.with_value(|s| {
            s.remove_file(index);
        });
    };

    let on_files = move |files: Vec<BrowserFile>| {
        let session = session.get_value();
        spawn_local(async move {
            let summary = session.add_uploads(&files).await;
            if summary.skipped > 0 {
                gloo::console::warn!(format!("{}件のファイルを読み込めませんでした", summary.skipped));
            }
        });
    };

    let on_run = move |mode: OperationMode| {
        let session = session.get_value();
        spawn_local(async move {
            let outcome = session.run(mode).await;
            log_outcome(mode.as_str(), &outcome);
        });
    };

    let on_toggle_speech = move || {
        let session = session.get_value();
        spawn_local(async move {
            let outcome = session.toggle_speech().await;
            log_outcome("speech", &outcome);
        });
    };

    let on_restore = move |id: EntryId| {
        session.with_value(|s| {
            if !s.restore(id) {
                gloo::console::warn!(format!("履歴が見つかりません: {}", id));
            }
        });
    };

    let on_dismiss = move |_| session.with_value(|s| s.dismiss_notice());

    view! {
        <div class="container">
            <Header language=Signal::derive(move || snapshot.with(|s| s.language)) on_select=on_select_language />

            <SettingsPanel api_key=api_key set_api_key=set_api_key />

            <div class="workspace">
                <main class="main-column">
                    <InputPanel snapshot=snapshot on_text=on_text on_remove=on_remove />
                    <UploadArea on_files=on_files />
                    <ModeButtons snapshot=snapshot on_run=on_run />

                    <Show when=move || snapshot.with(|s| s.busy)>
                        <ProgressBar message="処理中..." />
                    </Show>

                    {move || {
                        snapshot
                            .with(|s| s.notice)
                            .map(|notice| {
                                view! {
                                    <div class="notice-banner" role="alert">
                                        <span>{notice.message()}</span>
                                        <button class="btn btn-small" on:click=on_dismiss>"×"</button>
                                    </div>
                                }
                            })
                    }}

                    <ResultView snapshot=snapshot on_toggle_speech=on_toggle_speech />
                </main>

                <HistoryPanel entries=history query=query set_query=set_query on_restore=on_restore />
            </div>
        </div>
    }
}
