//! Notifier
//!
//! Collaborator seams the engine reports through: server-wide broadcast,
//! per-user text, the host's connected-user roster, and the per-user vote
//! selection surface. Rendering and delivery are host concerns; the engine
//! only decides what to say and to whom.

pub mod webhook;

pub use webhook::{ResultsRelay, WebhookRelay};

/// Connected-user identity (the host's numeric account id).
pub type UserId = u64;

/// Outbound text surface provided by the embedding host.
pub trait Notifier: Send + Sync {
    /// Broadcast text to every connected user.
    fn broadcast(&self, text: &str);

    /// Send text to a single user.
    fn send(&self, user: UserId, text: &str);

    /// Currently connected users.
    fn connected_users(&self) -> Vec<UserId>;
}

/// Per-user vote selection surface.
///
/// Given the active poll's question and options, render a selection surface
/// for one user; dismiss it once the user has voted or the poll closed.
pub trait VoteSurface: Send + Sync {
    fn show(&self, user: UserId, question: &str, options: &[String]);

    fn dismiss(&self, user: UserId);
}

/// Surface that renders nothing, for hosts without an in-game overlay.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl VoteSurface for NullSurface {
    fn show(&self, _user: UserId, _question: &str, _options: &[String]) {}

    fn dismiss(&self, _user: UserId) {}
}
