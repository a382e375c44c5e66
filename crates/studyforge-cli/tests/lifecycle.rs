//! End-to-end lifecycle tests: generate → store → match → grade → record,
//! driven through `StudyEngine` with the mock provider and memory store.

use std::sync::Arc;
use std::time::Duration;

use studyforge_core::error::{GenerationError, SubmitError};
use studyforge_core::grader::{is_degraded, GRADING_ERROR_FEEDBACK};
use studyforge_core::model::{Exam, Question, QuestionKind, SessionId};
use studyforge_core::store::MemoryStore;
use studyforge_core::traits::ExamStore;
use studyforge_core::{EngineConfig, StudyEngine};
use studyforge_providers::mock::MockProvider;

/// Substring unique to the grader's system prompt.
const GRADING_KEY: &str = "rigorous examiner";
/// Substring unique to the generator's user prompt.
const GENERATION_KEY: &str = "Study material:";

const THREE_QUESTIONS: &str = r#"```json
[
  {"index": 1, "type": "multiple-choice", "question": "What does `move` do in a closure?",
   "options": ["A. Takes ownership", "B. Borrows"], "answer": "A", "analysis": "ownership"},
  {"index": 2, "type": "multiple-choice", "question": "Which trait enables `?` on Option?",
   "options": ["A. Try", "B. From"], "answer": "A", "analysis": "try operator"},
  {"index": 3, "type": "short-answer", "question": "Explain borrowing.",
   "options": [], "answer": "- shared or mutable references\n- no dangling", "analysis": "rules"}
]
```"#;

fn engine_with(provider: Arc<MockProvider>, store: Arc<MemoryStore>) -> StudyEngine {
    StudyEngine::new(provider, store, EngineConfig::default())
}

fn single_choice_exam() -> Exam {
    Exam::new(vec![Question {
        index: Some(1),
        id: None,
        kind: QuestionKind::MultipleChoice,
        prompt: "Pick the first letter".into(),
        options: vec!["A".into(), "B".into()],
        reference_answer: "A".into(),
        analysis: String::new(),
    }])
}

fn unindexed_exam(n: usize) -> Exam {
    Exam::new(
        (1..=n)
            .map(|i| Question {
                index: None,
                id: None,
                kind: QuestionKind::ShortAnswer,
                prompt: format!("question {i}"),
                options: vec![],
                reference_answer: format!("answer {i}"),
                analysis: String::new(),
            })
            .collect(),
    )
}

#[tokio::test]
async fn wrong_answer_is_recorded() {
    let provider = Arc::new(MockProvider::with_fixed_response(
        r#"{"is_correct": false, "score": 20, "feedback": "wrong"}"#,
    ));
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &single_choice_exam(), Duration::from_secs(3600))
        .await
        .unwrap();
    let engine = engine_with(provider.clone(), store);

    let outcome = engine.submit(&session, 1, "B").await.unwrap();
    assert!(!outcome.verdict.is_correct);
    assert_eq!(outcome.verdict.score, Some(20));
    assert!(outcome.recorded);

    let mistakes = engine.list_mistakes().await.unwrap();
    assert_eq!(mistakes.len(), 1);
    assert_eq!(mistakes[0].user_answer, "B");
    assert_eq!(mistakes[0].reference_answer, "A");
    assert_eq!(mistakes[0].question_text, "Pick the first letter");
    assert_eq!(mistakes[0].feedback, "wrong");

    let request = provider.last_request().unwrap();
    assert!(request.user_prompt.contains("Reference answer: A"));
    assert!(request.user_prompt.contains("User answer: B"));
}

#[tokio::test]
async fn out_of_range_submission_never_grades() {
    let provider = Arc::new(MockProvider::with_fixed_response(
        r#"{"is_correct": false, "score": 0, "feedback": "should not be called"}"#,
    ));
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &unindexed_exam(3), Duration::from_secs(3600))
        .await
        .unwrap();
    let engine = engine_with(provider.clone(), store);

    let err = engine.submit(&session, 5, "x").await.unwrap_err();
    assert!(matches!(err, SubmitError::QuestionNotFound { index: 5 }));
    assert_eq!(provider.call_count(), 0);
    assert!(engine.list_mistakes().await.unwrap().is_empty());
}

#[tokio::test]
async fn positional_fallback_grades_kth_question() {
    let provider = Arc::new(MockProvider::with_fixed_response(
        r#"{"is_correct": true, "score": 100, "feedback": "ok"}"#,
    ));
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &unindexed_exam(3), Duration::from_secs(3600))
        .await
        .unwrap();
    let engine = engine_with(provider.clone(), store);

    for k in 1..=3u32 {
        engine.submit(&session, k, "my answer").await.unwrap();
        let request = provider.last_request().unwrap();
        assert!(request.user_prompt.contains(&format!("Question: question {k}\n")));
    }
}

#[tokio::test]
async fn grader_failure_degrades_and_records() {
    let provider = Arc::new(MockProvider::failing("upstream unavailable"));
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &single_choice_exam(), Duration::from_secs(3600))
        .await
        .unwrap();
    let engine = engine_with(provider, store);

    let outcome = engine.submit(&session, 1, "A").await.unwrap();
    assert!(!outcome.verdict.is_correct);
    assert_eq!(outcome.verdict.score, Some(0));
    assert!(outcome.verdict.feedback.starts_with(GRADING_ERROR_FEEDBACK));
    assert!(outcome.recorded);

    let mistakes = engine.list_mistakes().await.unwrap();
    assert_eq!(mistakes.len(), 1);
    assert!(mistakes[0].feedback.starts_with(GRADING_ERROR_FEEDBACK));
}

#[tokio::test]
async fn unparseable_grade_degrades() {
    let provider = Arc::new(MockProvider::with_fixed_response("Looks good to me!"));
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &single_choice_exam(), Duration::from_secs(3600))
        .await
        .unwrap();
    let engine = engine_with(provider, store);

    let outcome = engine.submit(&session, 1, "A").await.unwrap();
    assert!(is_degraded(&outcome.verdict));
    assert_eq!(outcome.verdict.score, Some(0));
    assert!(outcome.recorded);
}

#[tokio::test]
async fn passing_answers_are_not_recorded_but_low_scores_are() {
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &single_choice_exam(), Duration::from_secs(3600))
        .await
        .unwrap();

    let passing = engine_with(
        Arc::new(MockProvider::with_fixed_response(
            r#"{"is_correct": true, "score": 60, "feedback": "fine"}"#,
        )),
        store.clone(),
    );
    assert!(!passing.submit(&session, 1, "A").await.unwrap().recorded);

    let unscored = engine_with(
        Arc::new(MockProvider::with_fixed_response(r#"{"is_correct": true}"#)),
        store.clone(),
    );
    assert!(!unscored.submit(&session, 1, "A").await.unwrap().recorded);

    let low = engine_with(
        Arc::new(MockProvider::with_fixed_response(
            r#"{"is_correct": true, "score": 59, "feedback": "barely"}"#,
        )),
        store.clone(),
    );
    assert!(low.submit(&session, 1, "A").await.unwrap().recorded);

    assert_eq!(store.list_mistakes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn repeated_mistakes_are_not_deduplicated() {
    let provider = Arc::new(MockProvider::with_fixed_response(
        r#"{"is_correct": false, "score": 10, "feedback": "again"}"#,
    ));
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &single_choice_exam(), Duration::from_secs(3600))
        .await
        .unwrap();
    let engine = engine_with(provider, store);

    engine.submit(&session, 1, "B").await.unwrap();
    engine.submit(&session, 1, "C").await.unwrap();

    let first = engine.list_mistakes().await.unwrap();
    let second = engine.list_mistakes().await.unwrap();
    assert_eq!(first, second);
    let answers: Vec<&str> = first.iter().map(|m| m.user_answer.as_str()).collect();
    assert_eq!(answers, vec!["C", "B"]);
}

#[tokio::test]
async fn generate_then_submit() {
    let provider = Arc::new(
        MockProvider::with_fixed_response("unused")
            .respond_when(GENERATION_KEY, THREE_QUESTIONS)
            .respond_when(
                GRADING_KEY,
                r#"{"is_correct": false, "score": 40, "feedback": "missing the no-dangling rule"}"#,
            ),
    );
    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(provider.clone(), store);
    let session = SessionId::default();

    let exam = engine
        .generate_exam(&session, "Closures, the ? operator, and borrowing.")
        .await
        .unwrap();
    assert_eq!(exam.len(), 3);
    assert_eq!(exam.questions[2].kind, QuestionKind::ShortAnswer);

    let current = engine.current_exam(&session).await.unwrap().unwrap();
    assert_eq!(current, exam);

    let outcome = engine.submit(&session, 3, "references").await.unwrap();
    assert!(outcome.recorded);
    assert_eq!(provider.call_count(), 2);

    let mistakes = engine.list_mistakes().await.unwrap();
    assert_eq!(mistakes[0].question_text, "Explain borrowing.");
}

#[tokio::test]
async fn failed_generation_stores_nothing() {
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();

    let failing = engine_with(Arc::new(MockProvider::failing("down")), store.clone());
    let err = failing.generate_exam(&session, "material").await.unwrap_err();
    assert!(matches!(err, GenerationError::Provider(_)));
    assert!(store.get_current_exam(&session).await.unwrap().is_none());

    let malformed = engine_with(
        Arc::new(MockProvider::with_fixed_response(r#"{"error": "refused"}"#)),
        store.clone(),
    );
    let err = malformed.generate_exam(&session, "material").await.unwrap_err();
    assert!(matches!(err, GenerationError::Malformed(_)));
    assert!(store.get_current_exam(&session).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_generation_keeps_previous_exam() {
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &single_choice_exam(), Duration::from_secs(3600))
        .await
        .unwrap();

    let engine = engine_with(Arc::new(MockProvider::with_fixed_response("[]")), store.clone());
    let err = engine.generate_exam(&session, "material").await.unwrap_err();
    assert!(matches!(err, GenerationError::NoQuestions));

    let current = store.get_current_exam(&session).await.unwrap().unwrap();
    assert_eq!(current.questions[0].prompt, "Pick the first letter");
}

#[tokio::test]
async fn new_generation_overwrites_current_exam() {
    let store = Arc::new(MemoryStore::new());
    let session = SessionId::default();
    store
        .put_current_exam(&session, &unindexed_exam(5), Duration::from_secs(3600))
        .await
        .unwrap();

    let engine = engine_with(
        Arc::new(MockProvider::with_fixed_response(THREE_QUESTIONS)),
        store,
    );
    engine.generate_exam(&session, "material").await.unwrap();

    let current = engine.current_exam(&session).await.unwrap().unwrap();
    assert_eq!(current.len(), 3);
    let err = engine.submit(&session, 5, "x").await.unwrap_err();
    assert!(matches!(err, SubmitError::QuestionNotFound { index: 5 }));
}

#[tokio::test]
async fn sessions_do_not_share_exams() {
    let engine = engine_with(
        Arc::new(MockProvider::with_fixed_response(THREE_QUESTIONS)),
        Arc::new(MemoryStore::new()),
    );
    let alice = SessionId::new("alice");
    let bob = SessionId::new("bob");

    engine.generate_exam(&alice, "material").await.unwrap();
    assert!(engine.current_exam(&alice).await.unwrap().is_some());
    assert!(matches!(
        engine.submit(&bob, 1, "A").await.unwrap_err(),
        SubmitError::NoActiveExam
    ));
}

#[tokio::test(start_paused = true)]
async fn expired_exam_behaves_as_never_generated() {
    let provider = Arc::new(
        MockProvider::with_fixed_response(r#"{"is_correct": true, "score": 100}"#)
            .respond_when(GENERATION_KEY, THREE_QUESTIONS),
    );
    let engine = engine_with(provider.clone(), Arc::new(MemoryStore::new()));
    let session = SessionId::default();

    engine.generate_exam(&session, "material").await.unwrap();
    assert!(engine.current_exam(&session).await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(3601)).await;

    assert!(engine.current_exam(&session).await.unwrap().is_none());
    let err = engine.submit(&session, 1, "A").await.unwrap_err();
    assert!(matches!(err, SubmitError::NoActiveExam));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn document_text_is_truncated_to_context_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let text = format!("{}{}", "a".repeat(3000), "TAIL-BEYOND-LIMIT");
    std::fs::write(&path, &text).unwrap();

    let provider = Arc::new(MockProvider::with_fixed_response(THREE_QUESTIONS));
    let engine = engine_with(provider.clone(), Arc::new(MemoryStore::new()));

    engine
        .generate_from_document(&SessionId::default(), &path)
        .await
        .unwrap();

    let request = provider.last_request().unwrap();
    assert!(request.user_prompt.contains(&"a".repeat(3000)));
    assert!(!request.user_prompt.contains("TAIL"));
}
