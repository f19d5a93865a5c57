//! Poll Engine
//!
//! Lifecycle owner for the single active poll: open, vote, tick, close,
//! archive, restore. Every mutation is snapshotted through the persistence
//! gateway and outcomes are reported through the notifier. All state lives
//! behind one lock, so operations serialize even when timer callbacks run
//! on separate tasks; collaborators are never called while it is held.

use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use super::config::PollSettings;
use super::ledger;
use super::types::{HistoryEntry, Poll, PollHistory, PollSnapshot};
use super::{PollError, PollResult};
use crate::notify::{Notifier, ResultsRelay, UserId, VoteSurface};
use crate::sched::{Scheduler, TimerHandle};
use crate::storage::DataStore;

/// Storage key for the current poll snapshot.
pub const POLL_KEY: &str = "poll";
/// Storage key for the poll history archive.
pub const HISTORY_KEY: &str = "poll_history";

struct EngineState {
    poll: Option<Poll>,
    history: PollHistory,
    reminder: Option<TimerHandle>,
    countdown: Option<TimerHandle>,
}

/// Poll engine.
///
/// Construct with [`PollEngine::bootstrap`], which restores persisted state
/// and re-arms timers for a poll that was active when the process last
/// stopped.
pub struct PollEngine {
    me: Weak<PollEngine>,
    settings: PollSettings,
    state: Mutex<EngineState>,
    store: Arc<dyn DataStore>,
    notifier: Arc<dyn Notifier>,
    surface: Arc<dyn VoteSurface>,
    relay: Option<Arc<dyn ResultsRelay>>,
    scheduler: Arc<dyn Scheduler>,
}

impl PollEngine {
    /// Create the engine, restoring the poll snapshot and history blobs.
    ///
    /// A missing or malformed blob is a cold start. If the restored poll is
    /// active, the reminder and countdown timers are re-armed according to
    /// the settings.
    pub fn bootstrap(
        settings: PollSettings,
        store: Arc<dyn DataStore>,
        notifier: Arc<dyn Notifier>,
        surface: Arc<dyn VoteSurface>,
        relay: Option<Arc<dyn ResultsRelay>>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        let poll = load_blob::<PollSnapshot>(&*store, POLL_KEY).into_poll();
        let history = load_blob::<PollHistory>(&*store, HISTORY_KEY);

        let engine = Arc::new_cyclic(|me| Self {
            me: me.clone(),
            settings,
            state: Mutex::new(EngineState {
                poll,
                history,
                reminder: None,
                countdown: None,
            }),
            store,
            notifier,
            surface,
            relay,
            scheduler,
        });

        engine.resume_timers();
        engine
    }

    /// Open a new poll.
    ///
    /// Fails when the question or options are invalid, or when a poll is
    /// already active. On success the poll is persisted, timers are armed,
    /// and the start is broadcast to all connected users.
    pub fn open_poll(&self, question: impl Into<String>, options: Vec<String>) -> PollResult<()> {
        let mut poll = Poll::new(question, options)?;
        if self.settings.auto_close {
            poll.remaining_seconds = Some(self.settings.default_closing_secs as i64);
        }
        let question = poll.question.clone();
        let labels = poll.labels();

        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            if state.poll.is_some() {
                return Err(PollError::AlreadyActive);
            }

            state.poll = Some(poll);
            if self.settings.reminders {
                state.reminder = Some(self.arm_reminder());
            }
            if self.settings.auto_close {
                state.countdown = Some(self.arm_countdown());
            }
            self.persist_poll(state);
        }

        info!(question = %question, "poll opened");
        self.notifier.broadcast(&self.settings.decorate(&format!(
            "A new poll has started! Question: {question}. Use /vote <option> to cast your vote."
        )));

        if self.settings.force_show_on_open {
            for user in self.notifier.connected_users() {
                self.surface.show(user, &question, &labels);
            }
        }

        Ok(())
    }

    /// Cast `voter`'s vote for `label` on the active poll.
    ///
    /// On success the snapshot is persisted, the voter's selection surface
    /// is dismissed, and the voter receives a confirmation.
    pub fn cast_vote(&self, voter: UserId, label: &str) -> PollResult<()> {
        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let poll = state.poll.as_mut().ok_or(PollError::NoActivePoll)?;
            ledger::record_vote(poll, voter, label)?;
            self.persist_poll(state);
        }

        self.surface.dismiss(voter);
        self.notifier.send(
            voter,
            &self
                .settings
                .decorate(&format!("Thanks for voting! You voted for: {label}")),
        );
        Ok(())
    }

    /// Close the active poll.
    ///
    /// Freezes the tally, archives it under the next sequential history id,
    /// broadcasts the results, relays them to the webhook when configured,
    /// cancels outstanding timers, and clears the poll state.
    pub fn close_poll(&self) -> PollResult<HistoryEntry> {
        let (summary, entry) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let poll = state.poll.take().ok_or(PollError::NoActivePoll)?;

            if let Some(reminder) = state.reminder.take() {
                reminder.cancel();
            }
            if let Some(countdown) = state.countdown.take() {
                countdown.cancel();
            }

            let entry = state
                .history
                .archive(poll.question.clone(), poll.options.clone());
            self.persist_history(state);
            self.persist_poll(state);

            (poll.summary(), entry)
        };

        info!(id = entry.id, "poll closed and archived");
        self.notifier.broadcast(&summary);

        if self.settings.relay_results {
            if let Some(relay) = &self.relay {
                relay.deliver(&summary);
            }
        }

        for user in self.notifier.connected_users() {
            self.surface.dismiss(user);
        }

        Ok(entry)
    }

    /// Advance the countdown by `delta_seconds`, closing the poll once the
    /// remaining time reaches zero.
    ///
    /// A tick can overshoot the exact closing instant; the close still
    /// triggers exactly once. Polls without a countdown ignore ticks.
    pub fn tick(&self, delta_seconds: i64) -> PollResult<()> {
        let expired = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let poll = state.poll.as_mut().ok_or(PollError::NoActivePoll)?;

            let Some(remaining) = poll.remaining_seconds.as_mut() else {
                return Ok(());
            };
            *remaining -= delta_seconds;
            let expired = *remaining <= 0;
            if !expired {
                self.persist_poll(state);
            }
            expired
        };

        if expired {
            self.close_poll()?;
        }
        Ok(())
    }

    /// Snapshot of the current question and tally, in option insertion
    /// order.
    pub fn results(&self) -> PollResult<(String, Vec<(String, u32)>)> {
        let guard = self.state.lock();
        let poll = guard.poll.as_ref().ok_or(PollError::NoActivePoll)?;
        let tally = poll
            .options
            .iter()
            .map(|o| (o.label.clone(), o.votes))
            .collect();
        Ok((poll.question.clone(), tally))
    }

    /// Present the active poll's selection surface to one user.
    pub fn show(&self, user: UserId) -> PollResult<()> {
        let (question, labels) = {
            let guard = self.state.lock();
            let poll = guard.poll.as_ref().ok_or(PollError::NoActivePoll)?;
            (poll.question.clone(), poll.labels())
        };

        self.surface.show(user, &question, &labels);
        Ok(())
    }

    /// `(id, question)` pairs for every archived poll, ascending by id.
    pub fn history_list(&self) -> Vec<(u32, String)> {
        self.state.lock().history.list()
    }

    /// Full archived entry by id.
    pub fn history_show(&self, id: u32) -> PollResult<HistoryEntry> {
        self.state
            .lock()
            .history
            .get(id)
            .cloned()
            .ok_or(PollError::UnknownHistoryId(id))
    }

    /// Empty the archive. Idempotent.
    pub fn history_clear(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.history.clear();
        self.persist_history(state);
    }

    /// Cancel outstanding timers and persist the current snapshot.
    ///
    /// Safe to call on an idle engine; the host calls this on unload.
    pub fn shutdown(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(reminder) = state.reminder.take() {
            reminder.cancel();
        }
        if let Some(countdown) = state.countdown.take() {
            countdown.cancel();
        }
        self.persist_poll(state);
    }

    fn resume_timers(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(poll) = state.poll.as_ref() else {
            return;
        };

        info!(question = %poll.question, "resuming active poll from snapshot");
        let arm_countdown = self.settings.auto_close && poll.remaining_seconds.is_some();
        if self.settings.reminders {
            state.reminder = Some(self.arm_reminder());
        }
        if arm_countdown {
            state.countdown = Some(self.arm_countdown());
        }
    }

    fn arm_reminder(&self) -> TimerHandle {
        let me = self.me.clone();
        self.scheduler.every(
            Duration::from_secs(self.settings.reminder_interval_secs),
            Arc::new(move || {
                if let Some(engine) = me.upgrade() {
                    engine.send_reminders();
                }
            }),
        )
    }

    fn arm_countdown(&self) -> TimerHandle {
        let me = self.me.clone();
        let interval = self.settings.tick_interval_secs as i64;
        self.scheduler.every(
            Duration::from_secs(self.settings.tick_interval_secs),
            Arc::new(move || {
                if let Some(engine) = me.upgrade() {
                    // A tick can race a manual close; the stale tick sees
                    // the cleared state and is dropped.
                    let _ = engine.tick(interval);
                }
            }),
        )
    }

    /// Remind connected users who have not voted yet.
    fn send_reminders(&self) {
        let voted: HashSet<UserId> = {
            let guard = self.state.lock();
            match guard.poll.as_ref() {
                Some(poll) => poll.votes.keys().copied().collect(),
                None => return,
            }
        };

        let text = self
            .settings
            .decorate("Don't forget to vote in the active poll! Use /poll to participate.");
        for user in self.notifier.connected_users() {
            if !voted.contains(&user) {
                self.notifier.send(user, &text);
            }
        }
    }

    fn persist_poll(&self, state: &EngineState) {
        self.save_blob(POLL_KEY, &PollSnapshot::capture(state.poll.as_ref()));
    }

    fn persist_history(&self, state: &EngineState) {
        self.save_blob(HISTORY_KEY, &state.history);
    }

    fn save_blob<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to encode blob");
                return;
            }
        };

        if let Err(e) = self.store.save(key, &value) {
            warn!(key, error = %e, "failed to persist blob");
        }
    }
}

fn load_blob<T: DeserializeOwned + Default>(store: &dyn DataStore, key: &str) -> T {
    match store.load(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(key, error = %e, "malformed blob, starting empty");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "failed to load blob, starting empty");
            T::default()
        }
    }
}
