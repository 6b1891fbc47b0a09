//! 操作ボタンコンポーネント

use leptos::prelude::*;
use lesson_lens_common::{OperationMode, SessionSnapshot};

const BUTTONS: [(OperationMode, &str); 4] = [
    (OperationMode::Simplify, "やさしく言い換え"),
    (OperationMode::Summarize, "要約"),
    (OperationMode::Quiz, "クイズ"),
    (OperationMode::Visualize, "図解"),
];

/// ボタンを押せるか（実行中は全て無効）
fn is_enabled(snapshot: &SessionSnapshot, mode: OperationMode) -> bool {
    if snapshot.busy {
        return false;
    }
    match mode {
        OperationMode::Visualize => {
            !snapshot.pending.text.trim().is_empty() || snapshot.slots.text.is_some()
        }
        _ => !snapshot.pending.is_empty(),
    }
}

#[component]
pub fn ModeButtons<FR>(snapshot: ReadSignal<SessionSnapshot>, on_run: FR) -> impl IntoView
where
    FR: Fn(OperationMode) + 'static + Clone,
{
    view! {
        <div class="mode-buttons">
            {BUTTONS
                .into_iter()
                .map(|(mode, label)| {
                    let on_run = on_run.clone();
                    view! {
                        <button
                            class="btn btn-primary"
                            disabled=move || !snapshot.with(|s| is_enabled(s, mode))
                            on:click=move |_| on_run(mode)
                        >
                            {label}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}
