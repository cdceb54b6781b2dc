mod service;
mod tiers;

pub use service::{FlashCard, SelectionService};
pub use tiers::{REVIEW_AHEAD_DAYS, SessionMode};
