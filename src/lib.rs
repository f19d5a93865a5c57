//! pollbox: server-wide poll engine
//!
//! One active poll at a time: a question with up to five options, one vote
//! per voter, optional timed closing with vote reminders, durable JSON
//! snapshots, and best-effort webhook relay of final results.
//!
//! The chat/console command surface, permissions, and any UI rendering are
//! owned by the embedding game server; this crate exposes the engine plus
//! the collaborator traits ([`notify::Notifier`], [`notify::VoteSurface`],
//! [`storage::DataStore`], [`sched::Scheduler`]) the host wires in.

pub mod logging;
pub mod notify;
pub mod poll;
pub mod sched;
pub mod storage;
