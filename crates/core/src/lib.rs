//! Domain core of the spaced-repetition scheduler: review state transitions,
//! candidate priority scoring, and streak calculation. Pure and synchronous;
//! persistence and orchestration live in the `storage` and `services` crates.

#![forbid(unsafe_code)]

pub mod model;
pub mod scheduler;
pub mod scoring;
pub mod streak;
pub mod time;

pub use time::Clock;
