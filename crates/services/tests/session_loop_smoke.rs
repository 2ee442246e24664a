use std::collections::BTreeMap;

use kana_core::catalog::Catalog;
use kana_core::model::{Category, QuizMode};
use kana_core::time::fixed_clock;
use services::{AppServices, CompletionReason, FinalScore, QuizEvent, QuizLoopService};
use storage::repository::Storage;

fn current_answer(quiz: &QuizLoopService) -> String {
    quiz.session()
        .and_then(|s| s.current_question())
        .map(|q| q.correct_answer().to_string())
        .expect("active question")
}

#[tokio::test]
async fn perfect_recognition_session_raises_mastery() {
    let services = AppServices::in_memory(fixed_clock()).unwrap();
    let mut quiz = services.quiz_loop().await.with_seed(2024).with_auto_advance(false);

    quiz.generate_session(QuizMode::Recognition, Some(Category::Basic), 10)
        .unwrap();

    let mut seen: BTreeMap<String, u32> = BTreeMap::new();
    let mut finished = None;
    while finished.is_none() {
        let subject = quiz
            .session()
            .and_then(|s| s.current_question())
            .map(|q| q.subject().to_string())
            .unwrap();
        *seen.entry(subject).or_default() += 1;

        let answer = current_answer(&quiz);
        let result = quiz.submit_answer(&answer).await.unwrap();
        assert!(result.record.correct);
        finished = quiz.advance().unwrap();
    }

    assert_eq!(
        finished,
        Some(FinalScore {
            score: 10,
            total: 10,
            reason: CompletionReason::Finished,
        })
    );
    let state = quiz.progress().state();
    for (character, count) in &seen {
        let expected = f64::from((count * 10).min(100));
        assert!((state.mastery(character) - expected).abs() < 1e-9);
    }

    // A second process over the same storage sees the same progress.
    let reloaded = services.progress().await;
    assert_eq!(reloaded.state(), quiz.progress().state());
}

#[tokio::test]
async fn typing_accepts_padded_uppercase() {
    let catalog =
        Catalog::from_json_str(r#"{ "hiragana": { "basic": { "か": "ka" } } }"#).unwrap();
    let services = AppServices::with_storage(Storage::in_memory(), fixed_clock(), catalog);
    let mut quiz = services.quiz_loop().await.with_seed(1);

    quiz.generate_session(QuizMode::Typing, None, 1).unwrap();
    let result = quiz.submit_answer(" KA ").await.unwrap();
    assert!(result.record.correct);
    assert_eq!(result.score, 1);

    let events = quiz.elapse(2_000);
    assert!(matches!(
        events.as_slice(),
        [QuizEvent::Completed(FinalScore { score: 1, total: 1, .. })]
    ));
}

#[tokio::test]
async fn speed_session_completes_when_time_runs_out() {
    let services = AppServices::in_memory(fixed_clock()).unwrap();
    let mut quiz = services.quiz_loop().await.with_seed(99);

    quiz.generate_session(QuizMode::Speed, None, 50).unwrap();
    for _ in 0..3 {
        let answer = current_answer(&quiz);
        quiz.submit_answer(&answer).await.unwrap();
        quiz.elapse(2_000);
    }

    let events = quiz.elapse(60_000);
    let completed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            QuizEvent::Completed(score) => Some(*score),
            _ => None,
        })
        .collect();
    assert_eq!(
        completed,
        vec![FinalScore {
            score: 3,
            total: 50,
            reason: CompletionReason::TimeUp,
        }]
    );
    assert_eq!(quiz.pending_timers(), 0);
    assert_eq!(quiz.progress().state().exercise_history().len(), 3);
}

#[tokio::test]
async fn double_submission_is_not_double_counted() {
    let services = AppServices::in_memory(fixed_clock()).unwrap();
    let mut quiz = services.quiz_loop().await.with_seed(5);

    quiz.generate_session(QuizMode::Production, None, 3).unwrap();
    let answer = current_answer(&quiz);
    quiz.submit_answer(&answer).await.unwrap();
    assert!(quiz.submit_answer(&answer).await.is_err());

    assert_eq!(quiz.snapshot().unwrap().score, 1);
    assert_eq!(quiz.progress().state().exercise_history().len(), 1);
}
