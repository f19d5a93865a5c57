//! Vote Ledger
//!
//! One-vote-per-voter and option-validity enforcement as a pure transition
//! over the poll's vote record and tally. The ledger has no storage of its
//! own; the record lives inside the poll and is persisted with it.

use super::types::Poll;
use super::{PollError, PollResult};
use crate::notify::UserId;

/// Record `voter`'s vote for `label`, incrementing that option's tally.
///
/// Rejection leaves the poll untouched: a voter already in the record is
/// refused regardless of the chosen option, and an unknown label is refused
/// before anything is mutated.
pub fn record_vote(poll: &mut Poll, voter: UserId, label: &str) -> PollResult<()> {
    if poll.votes.contains_key(&voter) {
        return Err(PollError::AlreadyVoted);
    }

    let option = poll
        .option_mut(label)
        .ok_or_else(|| PollError::InvalidOption(label.to_string()))?;
    option.votes += 1;

    poll.votes.insert(voter, label.to_string());
    Ok(())
}

/// Whether `voter` has a recorded vote on this poll.
pub fn has_voted(poll: &Poll, voter: UserId) -> bool {
    poll.votes.contains_key(&voter)
}
