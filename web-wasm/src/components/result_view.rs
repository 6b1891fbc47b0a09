//! 結果表示（テキスト/図解/クイズ）

use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use lesson_lens_common::SessionSnapshot;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::components::quiz_view::QuizView;

/// 「コピーしました」を表示しておく時間
const COPIED_TOAST_MS: u32 = 2_000;

fn speech_label(snapshot: &SessionSnapshot) -> &'static str {
    if snapshot.playing {
        "■ 停止"
    } else if snapshot.audio_loading {
        "音声を生成中..."
    } else {
        "🔊 読み上げ"
    }
}

fn copy_label(copied: bool) -> &'static str {
    if copied {
        "✔ コピーしました"
    } else {
        "📋 コピー"
    }
}

/// テキストをクリップボードへ書き込む
async fn copy_to_clipboard(text: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window is not available"))?;
    JsFuture::from(window.navigator().clipboard().write_text(text)).await?;
    Ok(())
}

#[component]
pub fn ResultView<FS>(snapshot: ReadSignal<SessionSnapshot>, on_toggle_speech: FS) -> impl IntoView
where
    FS: Fn() + Send + Sync + 'static + Clone,
{
    let dir = move || {
        if snapshot.with(|s| s.language.is_right_to_left()) {
            "rtl"
        } else {
            "ltr"
        }
    };

    let (copied, set_copied) = signal(false);
    let on_copy = move |text: String| {
        spawn_local(async move {
            match copy_to_clipboard(&text).await {
                Ok(()) => {
                    set_copied.set(true);
                    Timeout::new(COPIED_TOAST_MS, move || set_copied.set(false)).forget();
                }
                Err(e) => gloo::console::warn!("クリップボードへのコピーに失敗", e),
            }
        });
    };

    view! {
        <section class="results">
            {move || {
                snapshot
                    .with(|s| s.slots.text.clone())
                    .map(|text| {
                        let on_toggle_speech = on_toggle_speech.clone();
                        let copy_text = text.clone();
                        view! {
                            <div class="result-card" dir=dir>
                                <p class="result-text">{text}</p>
                                <div class="result-actions">
                                    <button
                                        class="btn btn-secondary btn-small"
                                        disabled=move || snapshot.with(|s| s.audio_loading)
                                        on:click=move |_| on_toggle_speech()
                                    >
                                        {move || snapshot.with(speech_label)}
                                    </button>
                                    <button
                                        class="btn btn-secondary btn-small"
                                        on:click=move |_| on_copy(copy_text.clone())
                                    >
                                        {move || copy_label(copied.get())}
                                    </button>
                                </div>
                            </div>
                        }
                    })
            }}
            {move || {
                snapshot
                    .with(|s| s.slots.image.clone())
                    .map(|data_url| {
                        view! {
                            <div class="visual-card">
                                <img src=data_url alt="図解" />
                            </div>
                        }
                    })
            }}
            {move || {
                snapshot
                    .with(|s| s.slots.quiz.clone())
                    .map(|questions| view! { <QuizView questions=questions /> })
            }}
        </section>
    }
}
