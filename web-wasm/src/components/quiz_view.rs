//! クイズ表示（選んだ時点で正誤を表示）

use leptos::prelude::*;
use lesson_lens_common::QuizQuestion;

/// 選択肢のCSSクラス
fn option_class(question: &QuizQuestion, chosen: Option<usize>, option: usize) -> &'static str {
    match chosen {
        None => "quiz-option",
        Some(_) if question.is_correct(option) => "quiz-option correct",
        Some(choice) if choice == option => "quiz-option wrong",
        Some(_) => "quiz-option",
    }
}

#[component]
pub fn QuizView(questions: Vec<QuizQuestion>) -> impl IntoView {
    let total = questions.len();
    let answers = RwSignal::new(vec![None::<usize>; total]);
    let checks = StoredValue::new(questions.clone());

    let score = move || {
        answers.with(|answers| {
            checks.with_value(|questions| {
                answers
                    .iter()
                    .zip(questions)
                    .filter(|(answer, q)| answer.is_some_and(|choice| q.is_correct(choice)))
                    .count()
            })
        })
    };
    let finished = move || answers.with(|answers| answers.iter().all(Option::is_some));

    let items = questions
        .into_iter()
        .enumerate()
        .map(|(qi, question)| {
            let prompt = format!("Q{}. {}", qi + 1, question.question());
            let options = question.options().to_vec();
            view! {
                <div class="quiz-question">
                    <p class="quiz-prompt">{prompt}</p>
                    <div class="quiz-options">
                        {options
                            .into_iter()
                            .enumerate()
                            .map(|(oi, option)| {
                                let question = question.clone();
                                view! {
                                    <button
                                        class=move || option_class(&question, answers.with(|a| a[qi]), oi)
                                        disabled=move || answers.with(|a| a[qi].is_some())
                                        on:click=move |_| answers.update(|a| a[qi] = Some(oi))
                                    >
                                        {option}
                                    </button>
                                }
                            })
                            .collect_view()}
                    </div>
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="quiz-card">
            {items}
            <Show when=finished>
                <p class="quiz-score">{move || format!("スコア: {}/{}", score(), total)}</p>
            </Show>
        </div>
    }
}
