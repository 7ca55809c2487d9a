use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use gate_core::model::{
    Catalog, ContentGroup, ContentItem, GroupId, ItemId, ItemKey, ItemStatus, QuestionDraft,
    QuestionId, QuestionPool,
};
use services::{AnswerOutcome, OpenOutcome, QuestionPrompt, UnlockError, UnlockService};
use storage::repository::{InMemoryRepository, LedgerRepository};

fn pool(size: usize) -> QuestionPool {
    let questions = (1..=size)
        .map(|n| {
            QuestionDraft {
                id: QuestionId::new(format!("q{n}")),
                prompt: format!("Question {n}?"),
                choices: vec!["right".into(), "wrong-a".into(), "wrong-b".into()],
                correct_choice: 0,
            }
            .validate()
            .unwrap()
        })
        .collect();
    QuestionPool::new(questions).unwrap()
}

fn catalog() -> Catalog {
    let item = |id: &str| ContentItem {
        id: ItemId::new(id),
        title: format!("Title {id}"),
        summary: format!("Summary {id}"),
        body: format!("Body {id}"),
    };
    Catalog::new(vec![ContentGroup {
        id: GroupId::new("day1"),
        title: "Day one".into(),
        items: vec![item("a"), item("b")],
    }])
    .unwrap()
}

fn service(repo: &InMemoryRepository, pool_size: usize, seed: u64) -> UnlockService {
    UnlockService::with_rng(
        Arc::new(repo.clone()),
        catalog(),
        Some(pool(pool_size)),
        StdRng::seed_from_u64(seed),
    )
}

fn group() -> GroupId {
    GroupId::new("day1")
}

fn key(item: &str) -> ItemKey {
    ItemKey::new(&group(), &ItemId::new(item))
}

fn display_index_of(prompt: &QuestionPrompt, text: &str) -> usize {
    prompt
        .choices
        .iter()
        .position(|choice| choice == text)
        .expect("choice text present")
}

fn open_question(outcome: OpenOutcome) -> QuestionPrompt {
    match outcome {
        OpenOutcome::Question(prompt) => prompt,
        other => panic!("expected a question, got {other:?}"),
    }
}

#[tokio::test]
async fn three_wrong_answers_permanently_lock_the_item() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 11);

    let prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    assert_eq!(prompt.attempts_left, 3);

    // distinct wrong display positions each time
    let next = match svc
        .submit_answer(display_index_of(&prompt, "wrong-a"))
        .await
        .unwrap()
    {
        AnswerOutcome::IncorrectContinue { attempts_left, next } => {
            assert_eq!(attempts_left, 2);
            assert_eq!(next.attempts_left, 2);
            next
        }
        other => panic!("expected continue, got {other:?}"),
    };

    let next = match svc
        .submit_answer(display_index_of(&next, "wrong-b"))
        .await
        .unwrap()
    {
        AnswerOutcome::IncorrectContinue { attempts_left, next } => {
            assert_eq!(attempts_left, 1);
            next
        }
        other => panic!("expected continue, got {other:?}"),
    };

    match svc
        .submit_answer(display_index_of(&next, "wrong-a"))
        .await
        .unwrap()
    {
        AnswerOutcome::IncorrectLocked { .. } => {}
        other => panic!("expected lock, got {other:?}"),
    }

    let ledger = repo.load().await.unwrap();
    assert!(ledger.is_locked(&key("a")));
    assert_eq!(ledger.attempts_left(&key("a")), 0);
    assert!(!ledger.is_unlocked(&key("a")));

    // subsequent open is terminal, no question offered
    match svc.open_item(&group(), &ItemId::new("a")).await.unwrap() {
        OpenOutcome::PermanentlyLocked { .. } => {}
        other => panic!("expected locked, got {other:?}"),
    }
    assert!(matches!(
        svc.submit_answer(0).await.unwrap_err(),
        UnlockError::NoQuestionPending
    ));
}

#[tokio::test]
async fn correct_first_answer_unlocks_and_bypasses_future_quizzes() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 3);

    let prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    match svc
        .submit_answer(display_index_of(&prompt, "right"))
        .await
        .unwrap()
    {
        AnswerOutcome::Correct { body, .. } => assert_eq!(body, "Body a"),
        other => panic!("expected correct, got {other:?}"),
    }

    let ledger = repo.load().await.unwrap();
    assert!(ledger.is_unlocked(&key("a")));
    assert!(!ledger.is_locked(&key("a")));

    match svc.open_item(&group(), &ItemId::new("a")).await.unwrap() {
        OpenOutcome::Unlocked { body, .. } => assert_eq!(body, "Body a"),
        other => panic!("expected unlocked, got {other:?}"),
    }

    // the other item is untouched
    let prompt = open_question(svc.open_item(&group(), &ItemId::new("b")).await.unwrap());
    assert_eq!(prompt.attempts_left, 3);
}

#[tokio::test]
async fn exhausted_pool_reuses_served_questions_instead_of_failing() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 2, 5);

    let prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    let next = match svc
        .submit_answer(display_index_of(&prompt, "wrong-a"))
        .await
        .unwrap()
    {
        AnswerOutcome::IncorrectContinue { next, .. } => next,
        other => panic!("expected continue, got {other:?}"),
    };

    // both pool questions are now served; the third offer must reuse one
    match svc
        .submit_answer(display_index_of(&next, "wrong-a"))
        .await
        .unwrap()
    {
        AnswerOutcome::IncorrectContinue { attempts_left, .. } => assert_eq!(attempts_left, 1),
        other => panic!("expected continue with a reused question, got {other:?}"),
    }

    let ledger = repo.load().await.unwrap();
    let served = ledger.served(&key("a"));
    assert_eq!(served.len(), 3);
    let distinct: std::collections::HashSet<_> = served.iter().collect();
    assert_eq!(distinct.len(), 2, "third offer must be a repeat");
}

#[tokio::test]
async fn questions_do_not_repeat_while_unserved_ones_remain() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 17);

    let mut prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    for _ in 0..2 {
        prompt = match svc
            .submit_answer(display_index_of(&prompt, "wrong-a"))
            .await
            .unwrap()
        {
            AnswerOutcome::IncorrectContinue { next, .. } => next,
            other => panic!("expected continue, got {other:?}"),
        };
    }

    let ledger = repo.load().await.unwrap();
    let served = ledger.served(&key("a"));
    let distinct: std::collections::HashSet<_> = served.iter().collect();
    assert_eq!(served.len(), 3);
    assert_eq!(distinct.len(), 3, "repeat offered before pool exhaustion");
}

#[tokio::test]
async fn global_reset_restores_defaults_for_all_items() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 23);

    // resolve one item each way
    let prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    svc.submit_answer(display_index_of(&prompt, "right"))
        .await
        .unwrap();
    let mut prompt = open_question(svc.open_item(&group(), &ItemId::new("b")).await.unwrap());
    loop {
        match svc
            .submit_answer(display_index_of(&prompt, "wrong-a"))
            .await
            .unwrap()
        {
            AnswerOutcome::IncorrectContinue { next, .. } => prompt = next,
            AnswerOutcome::IncorrectLocked { .. } => break,
            other => panic!("unexpected {other:?}"),
        }
    }

    svc.reset_all().await.unwrap();

    assert!(repo.load().await.unwrap().is_empty());
    let overview = svc.group_overview(&group()).await.unwrap();
    assert!(overview
        .iter()
        .all(|row| row.status == ItemStatus::Pending { attempts_left: 3 }));

    let prompt = open_question(svc.open_item(&group(), &ItemId::new("b")).await.unwrap());
    assert_eq!(prompt.attempts_left, 3);
}

#[tokio::test]
async fn answering_without_a_pending_question_is_rejected() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 1);

    assert!(matches!(
        svc.submit_answer(0).await.unwrap_err(),
        UnlockError::NoQuestionPending
    ));
    assert!(repo.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_choice_is_rejected_without_consuming_the_question() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 9);

    let prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    assert!(matches!(
        svc.submit_answer(99).await.unwrap_err(),
        UnlockError::ChoiceOutOfRange { index: 99, choices: 3 }
    ));

    // the pending question survives the bad index and still evaluates
    match svc
        .submit_answer(display_index_of(&prompt, "right"))
        .await
        .unwrap()
    {
        AnswerOutcome::Correct { .. } => {}
        other => panic!("expected correct, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_attempts_without_lock_flag_heals_to_locked_on_open() {
    // a blob persisted between the decrement and the lock write
    let repo = InMemoryRepository::with_blob(r#"{"attempts_left":{"day1:a":0}}"#);
    let mut svc = service(&repo, 5, 2);

    match svc.open_item(&group(), &ItemId::new("a")).await.unwrap() {
        OpenOutcome::PermanentlyLocked { .. } => {}
        other => panic!("expected locked, got {other:?}"),
    }

    let ledger = repo.load().await.unwrap();
    assert!(ledger.is_locked(&key("a")));
}

#[tokio::test]
async fn unknown_items_and_groups_are_rejected() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 4);

    assert!(matches!(
        svc.open_item(&group(), &ItemId::new("zzz")).await.unwrap_err(),
        UnlockError::UnknownItem(_)
    ));
    assert!(matches!(
        svc.group_overview(&GroupId::new("day9")).await.unwrap_err(),
        UnlockError::UnknownGroup(_)
    ));
}

#[tokio::test]
async fn missing_question_bank_degrades_to_unlocked_content_only() {
    let repo = InMemoryRepository::new();

    // unlock day1:a with a working service first
    let mut svc = service(&repo, 5, 8);
    let prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    svc.submit_answer(display_index_of(&prompt, "right"))
        .await
        .unwrap();

    // now a service whose bank failed to load
    let mut degraded =
        UnlockService::with_rng(Arc::new(repo.clone()), catalog(), None, StdRng::seed_from_u64(8));
    assert!(!degraded.quiz_available());

    match degraded.open_item(&group(), &ItemId::new("a")).await.unwrap() {
        OpenOutcome::Unlocked { body, .. } => assert_eq!(body, "Body a"),
        other => panic!("expected unlocked, got {other:?}"),
    }
    assert!(matches!(
        degraded.open_item(&group(), &ItemId::new("b")).await.unwrap_err(),
        UnlockError::QuizUnavailable
    ));
}

#[tokio::test]
async fn terminal_flags_are_stable_across_reopens() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 13);

    let prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    svc.submit_answer(display_index_of(&prompt, "right"))
        .await
        .unwrap();

    for _ in 0..3 {
        match svc.open_item(&group(), &ItemId::new("a")).await.unwrap() {
            OpenOutcome::Unlocked { .. } => {}
            other => panic!("unlocked flag must be terminal, got {other:?}"),
        }
    }
    let ledger = repo.load().await.unwrap();
    assert!(ledger.is_unlocked(&key("a")));
    assert!(!ledger.is_locked(&key("a")));
}

#[tokio::test]
async fn overview_reports_each_item_status() {
    let repo = InMemoryRepository::new();
    let mut svc = service(&repo, 5, 19);

    let prompt = open_question(svc.open_item(&group(), &ItemId::new("a")).await.unwrap());
    svc.submit_answer(display_index_of(&prompt, "right"))
        .await
        .unwrap();

    let overview = svc.group_overview(&group()).await.unwrap();
    assert_eq!(overview.len(), 2);
    assert_eq!(overview[0].status, ItemStatus::Unlocked);
    assert_eq!(overview[0].title, "Title a");
    assert_eq!(overview[1].status, ItemStatus::Pending { attempts_left: 3 });
}
