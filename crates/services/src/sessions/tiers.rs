//! Session modes and their candidate pipelines.
//!
//! Each mode is an ordered list of tiers consumed with a running "still
//! needed" counter, so adding or reordering tiers is a data change rather
//! than new branching code.

/// How many days ahead of schedule smart sessions may pull reviews.
pub const REVIEW_AHEAD_DAYS: i64 = 3;

/// Study session flavors. A closed set; call sites may name them
/// differently, the semantics here are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Short, focused sessions for exam panic: genuinely due plus unseen
    /// material only, each pool capped independently so the session never
    /// runs dry.
    Crisis,
    /// Fill the batch from due, then new, then future material.
    Cram,
    /// Like cram, but prefer near-due reviews (within three days) before
    /// falling back to far-future material.
    Smart,
}

/// One stage of the candidate pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tier {
    Due,
    New,
    ReviewAhead,
    Future,
}

impl Tier {
    /// Items pulled from these tiers are shown ahead of schedule and are
    /// flagged so the caller can distinguish them visually.
    pub(crate) fn is_review_ahead(self) -> bool {
        matches!(self, Tier::ReviewAhead | Tier::Future)
    }
}

impl SessionMode {
    /// Candidate tiers in priority order.
    pub(crate) fn tiers(self) -> &'static [Tier] {
        match self {
            SessionMode::Crisis => &[Tier::Due, Tier::New],
            SessionMode::Cram => &[Tier::Due, Tier::New, Tier::Future],
            SessionMode::Smart => &[Tier::Due, Tier::New, Tier::ReviewAhead, Tier::Future],
        }
    }

    /// Whether each tier fetches only the remainder left by earlier tiers.
    ///
    /// Crisis caps every tier at the full limit independently, so a crisis
    /// batch may reach twice the requested size.
    pub(crate) fn fills_to_limit(self) -> bool {
        !matches!(self, SessionMode::Crisis)
    }
}
