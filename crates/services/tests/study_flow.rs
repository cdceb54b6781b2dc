//! End-to-end study flow over the in-memory repository: assemble a batch,
//! rate questions, page overtime material, and read the streak back.

use std::sync::Arc;

use chrono::Duration;

use services::{ReviewService, SelectionService, SessionMode, StatsService};
use srs_core::model::{
    Question, QuestionContent, QuestionId, Rating, ReviewState, SubjectId, UserId,
};
use srs_core::time::{fixed_clock, fixed_now};
use storage::repository::{
    ActivityRepository, InMemoryRepository, QuestionFilter, QuestionRepository,
};

fn open_question(prompt: &str) -> Question {
    Question::new(
        QuestionId::random(),
        SubjectId::random(),
        Vec::new(),
        QuestionContent::Open {
            prompt: prompt.into(),
            answer: "A".into(),
        },
        fixed_now() - Duration::days(30),
    )
}

fn overdue(mut question: Question, days_overdue: i64) -> Question {
    let now = fixed_now();
    question.set_review(ReviewState {
        interval_days: 5,
        ease_factor: 2.5,
        streak: 2,
        last_reviewed: Some(now - Duration::days(days_overdue + 5)),
        next_review_date: now - Duration::days(days_overdue),
    });
    question
}

async fn seed(repo: &InMemoryRepository, user: UserId, questions: &[Question]) {
    for question in questions {
        repo.upsert_question(user, question)
            .await
            .expect("seeding should succeed");
    }
}

#[tokio::test]
async fn smart_session_reviews_and_streak_end_to_end() {
    let repo = Arc::new(InMemoryRepository::new());
    let user = UserId::random();

    let very_overdue = overdue(open_question("oldest"), 6);
    let slightly_overdue = overdue(open_question("newer"), 1);
    let fresh = open_question("never studied");
    seed(&repo, user, &[very_overdue.clone(), slightly_overdue.clone(), fresh.clone()]).await;

    let selection = SelectionService::with_clock(
        Arc::clone(&repo) as Arc<dyn QuestionRepository>,
        fixed_clock(),
    );
    let batch = selection
        .fetch_questions(user, SessionMode::Smart, 10, &QuestionFilter::none())
        .await
        .expect("selection should succeed");

    // due questions first by priority, then the new one; nothing is
    // ahead-of-schedule here
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[0].question.id(), very_overdue.id());
    assert_eq!(batch[1].question.id(), slightly_overdue.id());
    assert_eq!(batch[2].question.id(), fresh.id());
    assert!(batch.iter().all(|card| !card.is_review_ahead));

    let reviews = ReviewService::with_clock(
        Arc::clone(&repo) as Arc<dyn QuestionRepository>,
        Arc::clone(&repo) as Arc<dyn ActivityRepository>,
        fixed_clock(),
    );

    let submitted = reviews
        .submit_review(user, very_overdue.id(), Rating::Easy)
        .await
        .expect("review should persist");
    // ceil(5 * 2.5 * 1.3) = 17
    assert_eq!(submitted.state.interval_days, 17);
    assert_eq!(
        submitted.state.next_review_date,
        fixed_now() + Duration::days(17)
    );

    reviews
        .submit_review(user, slightly_overdue.id(), Rating::Forgot)
        .await
        .expect("review should persist");

    // overtime skips everything the session already showed
    let overtime = selection
        .fetch_overtime_questions(
            user,
            10,
            &[very_overdue.id(), slightly_overdue.id(), fresh.id()],
            &QuestionFilter::none(),
        )
        .await
        .expect("overtime should succeed");
    assert!(overtime.is_empty());

    // two reviews today collapse into a single streak day
    let stats = StatsService::with_clock(
        Arc::clone(&repo) as Arc<dyn ActivityRepository>,
        fixed_clock(),
    );
    assert_eq!(stats.current_streak(user).await.expect("streak"), 1);
}

#[tokio::test]
async fn forgotten_question_comes_back_in_the_next_session() {
    let repo = Arc::new(InMemoryRepository::new());
    let user = UserId::random();

    let question = overdue(open_question("slippery"), 2);
    seed(&repo, user, &[question.clone()]).await;

    let mut clock = fixed_clock();
    let reviews = ReviewService::with_clock(
        Arc::clone(&repo) as Arc<dyn QuestionRepository>,
        Arc::clone(&repo) as Arc<dyn ActivityRepository>,
        clock,
    );
    reviews
        .submit_review(user, question.id(), Rating::Forgot)
        .await
        .expect("review should persist");

    // the next day it is due again, in the danger zone, at the top
    clock.advance(Duration::days(1));
    let selection = SelectionService::with_clock(
        Arc::clone(&repo) as Arc<dyn QuestionRepository>,
        clock,
    );
    let batch = selection
        .fetch_questions(user, SessionMode::Crisis, 5, &QuestionFilter::none())
        .await
        .expect("selection should succeed");

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].question.id(), question.id());
    assert_eq!(batch[0].question.review().interval_days, 1);
    assert!(!batch[0].is_review_ahead);
}

#[tokio::test]
async fn cram_session_pulls_future_material_flagged_as_ahead() {
    let repo = Arc::new(InMemoryRepository::new());
    let user = UserId::random();

    let mut scheduled = open_question("not yet due");
    scheduled.set_review(ReviewState {
        interval_days: 10,
        ease_factor: 2.5,
        streak: 3,
        last_reviewed: Some(fixed_now() - Duration::days(2)),
        next_review_date: fixed_now() + Duration::days(8),
    });
    let fresh = open_question("brand new");
    seed(&repo, user, &[scheduled.clone(), fresh.clone()]).await;

    let selection = SelectionService::with_clock(
        Arc::clone(&repo) as Arc<dyn QuestionRepository>,
        fixed_clock(),
    );
    let batch = selection
        .fetch_questions(user, SessionMode::Cram, 5, &QuestionFilter::none())
        .await
        .expect("selection should succeed");

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].question.id(), fresh.id());
    assert!(!batch[0].is_review_ahead);
    assert_eq!(batch[1].question.id(), scheduled.id());
    assert!(batch[1].is_review_ahead);
}
