//! Server Poll Module
//!
//! Owns the single active poll's lifecycle: open, vote, tick, close,
//! archive. Command parsing, permissions, and rendering are host concerns;
//! the engine is driven through its operations and reports through the
//! [`crate::notify`] collaborators.

pub mod config;
pub mod engine;
pub mod ledger;
pub mod types;

pub use config::{PollSettings, SettingsError};
pub use engine::PollEngine;
pub use types::{HistoryEntry, Poll, PollHistory, PollOption, MAX_OPTIONS, MIN_OPTIONS};

/// Result type for poll operations
pub type PollResult<T> = Result<T, PollError>;

/// Errors surfaced by poll operations.
///
/// All of these are recovered locally and rendered as user-facing text by
/// the host; none is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("invalid poll: {0}")]
    InvalidPoll(String),

    #[error("a poll is already active")]
    AlreadyActive,

    #[error("no active poll")]
    NoActivePoll,

    #[error("this voter has already voted on the poll")]
    AlreadyVoted,

    #[error("unknown poll option: {0}")]
    InvalidOption(String),

    #[error("no archived poll with id {0}")]
    UnknownHistoryId(u32),
}
