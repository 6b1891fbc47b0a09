//! アップロードエリアコンポーネント

use leptos::html;
use leptos::prelude::*;
use web_sys::{DragEvent, HtmlInputElement};

use crate::upload::{collect_files, BrowserFile};

#[component]
pub fn UploadArea<F>(on_files: F) -> impl IntoView
where
    F: Fn(Vec<BrowserFile>) + 'static + Clone,
{
    let (is_dragover, set_is_dragover) = signal(false);
    let input_ref = NodeRef::<html::Input>::new();

    let on_drop = {
        let on_files = on_files.clone();
        move |ev: DragEvent| {
            ev.prevent_default();
            set_is_dragover.set(false);

            if let Some(files) = ev.data_transfer().and_then(|dt| dt.files()) {
                on_files(collect_files(&files));
            }
        }
    };

    let on_dragover = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragover.set(true);
    };

    let on_dragleave = move |_: DragEvent| {
        set_is_dragover.set(false);
    };

    let on_click = move |_| {
        if let Some(input) = input_ref.get() {
            input.click();
        }
    };

    let on_change = move |ev: web_sys::Event| {
        let input: HtmlInputElement = event_target(&ev);
        if let Some(files) = input.files() {
            on_files(collect_files(&files));
        }
        // 同じファイルを再選択できるようにリセット
        input.set_value("");
    };

    view! {
        <div
            class=move || if is_dragover.get() { "upload-area dragover" } else { "upload-area" }
            on:drop=on_drop
            on:dragover=on_dragover
            on:dragleave=on_dragleave
            on:click=on_click
        >
            <input
                node_ref=input_ref
                type="file"
                class="hidden"
                multiple=true
                accept="image/*,application/pdf,text/plain"
                on:change=on_change
            />
            <div class="upload-icon">"📎"</div>
            <p>"資料をドラッグ&ドロップ または クリックして選択"</p>
            <p class="text-muted">"対応形式: 画像, PDF, テキスト"</p>
        </div>
    }
}
