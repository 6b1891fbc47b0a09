//! 履歴パネル（検索とクリックで復元）

use leptos::prelude::*;
use lesson_lens_common::language::flag_for;
use lesson_lens_common::{EntryId, HistoryEntry};

#[component]
pub fn HistoryPanel<FR>(
    entries: ReadSignal<Vec<HistoryEntry>>,
    query: ReadSignal<String>,
    set_query: WriteSignal<String>,
    on_restore: FR,
) -> impl IntoView
where
    FR: Fn(EntryId) + Send + Sync + 'static + Clone,
{
    view! {
        <aside class="history-panel">
            <h2>"履歴"</h2>
            <input
                type="search"
                class="history-search"
                placeholder="履歴を検索..."
                prop:value=move || query.get()
                on:input=move |ev| set_query.set(event_target_value(&ev))
            />
            <Show
                when=move || !entries.with(Vec::is_empty)
                fallback=|| view! { <p class="text-muted">"履歴はまだありません"</p> }
            >
                <ul class="history-list">
                    <For
                        each=move || entries.get()
                        key=|entry| entry.id
                        children={
                            let on_restore = on_restore.clone();
                            move |entry: HistoryEntry| {
                                let on_restore = on_restore.clone();
                                let id = entry.id;
                                view! {
                                    <li class="history-item" on:click=move |_| on_restore(id)>
                                        <span class="history-flag">{flag_for(&entry.language_code)}</span>
                                        <span class="history-title">{entry.title()}</span>
                                        <span class="history-mode">{entry.mode.as_str()}</span>
                                    </li>
                                }
                            }
                        }
                    />
                </ul>
            </Show>
        </aside>
    }
}
