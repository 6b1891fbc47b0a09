//! 処理中インジケータ

use leptos::prelude::*;

#[component]
pub fn ProgressBar(message: &'static str) -> impl IntoView {
    view! {
        <div class="progress-container">
            <div class="progress-bar">
                <div class="progress-fill indeterminate" />
            </div>
            <p class="progress-text">{message}</p>
        </div>
    }
}
