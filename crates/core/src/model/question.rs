use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, SubjectId, TopicId};
use crate::model::review::ReviewState;

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Category tag for a question. The scheduling core never inspects question
/// content; the kind is the only content-derived signal it reads (snippet
/// questions receive a scoring bonus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Snippet,
    Open,
    MultiChoice,
    Cloze,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Snippet => "snippet",
            Self::Open => "open",
            Self::MultiChoice => "multi_choice",
            Self::Cloze => "cloze",
        }
    }

    /// Parses the persisted kind tag.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "snippet" => Some(Self::Snippet),
            "open" => Some(Self::Open),
            "multi_choice" => Some(Self::MultiChoice),
            "cloze" => Some(Self::Cloze),
            _ => None,
        }
    }
}

//
// ─── QUESTION CONTENT ──────────────────────────────────────────────────────────
//

/// Question/answer payload, tagged by kind at the serialization boundary.
///
/// Deserialized from the persisted JSON column; the scheduler treats it as
/// opaque and only ever asks for its `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionContent {
    Snippet {
        prompt: String,
        code: String,
        answer: String,
    },
    Open {
        prompt: String,
        answer: String,
    },
    MultiChoice {
        prompt: String,
        options: Vec<String>,
        answer: usize,
    },
    Cloze {
        text: String,
        answers: Vec<String>,
    },
}

impl QuestionContent {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::Snippet { .. } => QuestionKind::Snippet,
            Self::Open { .. } => QuestionKind::Open,
            Self::MultiChoice { .. } => QuestionKind::MultiChoice,
            Self::Cloze { .. } => QuestionKind::Cloze,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A study question together with its embedded scheduling state.
///
/// The review state is created implicitly with the question (new, interval 0)
/// and mutated exclusively through the review-submission flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    subject_id: SubjectId,
    topic_ids: Vec<TopicId>,
    content: QuestionContent,
    created_at: DateTime<Utc>,
    review: ReviewState,
}

impl Question {
    /// Creates a brand-new question, due immediately via the new pool.
    #[must_use]
    pub fn new(
        id: QuestionId,
        subject_id: SubjectId,
        topic_ids: Vec<TopicId>,
        content: QuestionContent,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject_id,
            topic_ids,
            content,
            created_at,
            review: ReviewState::new_card(created_at),
        }
    }

    /// Rebuilds a question from persisted fields.
    #[must_use]
    pub fn from_persisted(
        id: QuestionId,
        subject_id: SubjectId,
        topic_ids: Vec<TopicId>,
        content: QuestionContent,
        created_at: DateTime<Utc>,
        review: ReviewState,
    ) -> Self {
        Self {
            id,
            subject_id,
            topic_ids,
            content,
            created_at,
            review,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn topic_ids(&self) -> &[TopicId] {
        &self.topic_ids
    }

    #[must_use]
    pub fn content(&self) -> &QuestionContent {
        &self.content
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.content.kind()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn review(&self) -> &ReviewState {
        &self.review
    }

    /// Replaces the scheduling state after a persisted review.
    pub fn set_review(&mut self, review: ReviewState) {
        self.review = review;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
