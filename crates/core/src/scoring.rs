use chrono::{DateTime, Utc};

use crate::model::{Question, QuestionKind};

//
// ─── SCORE COMPONENTS ──────────────────────────────────────────────────────────
//

/// Intervals below this many days mark a fragile, recently-failed or
/// very-new question.
pub const DANGER_ZONE_MAX_INTERVAL: u32 = 3;
/// Bonus for fragile questions; losing these costs the most relearning.
pub const DANGER_ZONE_BONUS: i64 = 50;
/// Bonus for code-snippet questions.
pub const SNIPPET_BONUS: i64 = 20;
/// Bonus for questions that have never been studied.
pub const NEW_QUESTION_BONUS: i64 = 10;

//
// ─── PRIORITY SCORE ────────────────────────────────────────────────────────────
//

/// Additive priority score for ordering candidates ("most urgent first").
///
/// All components stack and there is no upper bound:
/// - one point per whole day overdue (zero if not yet due)
/// - +50 when `interval < 3` days
/// - +20 for snippet questions
/// - +10 when the question is new (`interval == 0` or never reviewed)
#[must_use]
pub fn priority_score(question: &Question, now: DateTime<Utc>) -> i64 {
    let review = question.review();

    let days_overdue = (now - review.next_review_date).num_days().max(0);
    let mut score = days_overdue;

    if review.interval_days < DANGER_ZONE_MAX_INTERVAL {
        score += DANGER_ZONE_BONUS;
    }
    if question.kind() == QuestionKind::Snippet {
        score += SNIPPET_BONUS;
    }
    if review.interval_days == 0 || review.last_reviewed.is_none() {
        score += NEW_QUESTION_BONUS;
    }

    score
}

//
// ─── RANKING ───────────────────────────────────────────────────────────────────
//

/// A question paired with its priority score. Computed per selection call
/// and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub question: Question,
    pub score: i64,
}

/// Scores and orders candidates by descending priority.
///
/// The sort is stable, so given identical inputs the output is deterministic:
/// ties keep their original (fetch) order.
#[must_use]
pub fn rank_by_priority(questions: Vec<Question>, now: DateTime<Utc>) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = questions
        .into_iter()
        .map(|question| ScoredCandidate {
            score: priority_score(&question, now),
            question,
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
