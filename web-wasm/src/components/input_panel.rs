//! 入力パネル（テキスト + 添付一覧）

use leptos::prelude::*;
use lesson_lens_common::SessionSnapshot;

#[component]
pub fn InputPanel<FT, FR>(snapshot: ReadSignal<SessionSnapshot>, on_text: FT, on_remove: FR) -> impl IntoView
where
    FT: Fn(String) + 'static + Clone,
    FR: Fn(usize) + Send + Sync + 'static + Clone,
{
    let dir = move || {
        if snapshot.with(|s| s.language.is_right_to_left()) {
            "rtl"
        } else {
            "ltr"
        }
    };

    view! {
        <div class="input-panel">
            <textarea
                class="lesson-input"
                placeholder="授業のメモや教科書の文章を貼り付け..."
                dir=dir
                prop:value=move || snapshot.with(|s| s.pending.text.clone())
                on:input=move |ev| on_text(event_target_value(&ev))
            />
            <ul class="file-chips">
                {move || {
                    let files: Vec<(usize, String, String)> = snapshot.with(|s| {
                        s.pending
                            .files
                            .iter()
                            .enumerate()
                            .map(|(i, f)| (i, f.name.clone(), f.mime_type.clone()))
                            .collect()
                    });
                    files
                        .into_iter()
                        .map(|(index, name, mime_type)| {
                            let on_remove = on_remove.clone();
                            view! {
                                <li class="file-chip" title=mime_type>
                                    {name}
                                    <button class="chip-remove" on:click=move |_| on_remove(index)>
                                        "×"
                                    </button>
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
        </div>
    }
}
