//! Frame-by-frame replay of simulations.
//!
//! The scheduler is clock-agnostic: a driver calls `advance` with elapsed
//! time and receives frame and completion events, tagged with the token of
//! the replay that produced them.

pub mod scheduler;

pub use scheduler::{PlaybackEvent, PlaybackScheduler, PlaybackStats, PlaybackToken};
