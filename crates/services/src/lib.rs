#![forbid(unsafe_code)]

pub mod error;
pub mod review_service;
pub mod sessions;
pub mod stats_service;
pub mod unit_service;

pub use srs_core::Clock;

pub use error::{ReviewServiceError, SelectionError, StatsError, UnitServiceError};
pub use review_service::{ReviewService, SubmittedReview};
pub use sessions::{FlashCard, REVIEW_AHEAD_DAYS, SelectionService, SessionMode};
pub use stats_service::StatsService;
pub use unit_service::{UnitContent, UnitService};
