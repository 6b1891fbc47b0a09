//! ヘッダーコンポーネント（言語選択つき）

use leptos::prelude::*;
use lesson_lens_common::language::{LanguageTarget, SUPPORTED_LANGUAGES};

#[component]
pub fn Header<F>(language: Signal<&'static LanguageTarget>, on_select: F) -> impl IntoView
where
    F: Fn(String) + 'static + Clone,
{
    view! {
        <header class="header">
            <h1>"LessonLens"</h1>
            <select
                class="language-select"
                on:change=move |ev| on_select(event_target_value(&ev))
            >
                {SUPPORTED_LANGUAGES
                    .iter()
                    .map(|l| {
                        view! {
                            <option value=l.code selected=move || language.get().code == l.code>
                                {format!("{} {}", l.flag, l.native_display_name)}
                            </option>
                        }
                    })
                    .collect_view()}
            </select>
        </header>
    }
}
