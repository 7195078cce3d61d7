//! Phase deadline timer for room actors.
//!
//! A room has exactly one live deadline at a time: the end of the phase it
//! is currently in. [`PhaseTimer`] models that directly. Arming replaces
//! whatever was armed before, cancelling disarms, and
//! [`PhaseTimer::wait`] resolves once when the deadline passes.
//!
//! # Disarmed mode
//!
//! With nothing armed, [`PhaseTimer::wait`] pends forever. That is the
//! lobby's state: the room only reacts to player actions.
//!
//! # Integration
//!
//! The timer sits inside a room actor's `tokio::select!` loop, next to the
//! command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         deadline = timer.wait() => {
//!             if deadline.key == room.phase {
//!                 scheduler.on_deadline(&mut room, &mut timer);
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! Dropping the timer (the actor exiting) cancels it; nothing fires later.

use std::fmt::Debug;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// A deadline that fired later than this is logged as late.
const LATE_WARN_THRESHOLD: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Deadline (returned to caller when the timer fires)
// ---------------------------------------------------------------------------

/// A deadline that has just passed, returned by [`PhaseTimer::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline<K> {
    /// What the deadline was armed for, e.g. the phase it ends.
    pub key: K,
    /// Monotonic arm counter; distinguishes two arms for the same key.
    pub generation: u64,
    /// How long after the scheduled instant the timer actually woke.
    pub late_by: Duration,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters kept by the timer over its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Deadlines armed.
    pub armed: u64,
    /// Deadlines that fired.
    pub fired: u64,
    /// Deadlines discarded by `cancel` or by re-arming before they fired.
    pub cancelled: u64,
    /// Deadlines that fired later than the warning threshold.
    pub late: u64,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Armed<K> {
    key: K,
    at: Instant,
    generation: u64,
}

/// A single cancellable deadline. One `PhaseTimer` per room actor.
#[derive(Debug)]
pub struct PhaseTimer<K> {
    armed: Option<Armed<K>>,
    generation: u64,
    stats: TimerStats,
}

impl<K: Copy + Debug> PhaseTimer<K> {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self {
            armed: None,
            generation: 0,
            stats: TimerStats::default(),
        }
    }

    /// Arms a deadline `duration` from now for `key`.
    ///
    /// Any previously armed deadline is discarded first, so there is never
    /// more than one live. Returns the new deadline's generation.
    pub fn arm(&mut self, key: K, duration: Duration) -> u64 {
        if let Some(previous) = self.armed.take() {
            self.stats.cancelled += 1;
            debug!(
                previous = ?previous.key,
                generation = previous.generation,
                "re-armed before previous deadline fired"
            );
        }

        self.generation += 1;
        self.stats.armed += 1;
        self.armed = Some(Armed {
            key,
            at: Instant::now() + duration,
            generation: self.generation,
        });

        trace!(
            ?key,
            generation = self.generation,
            ms = duration.as_millis() as u64,
            "deadline armed"
        );
        self.generation
    }

    /// Disarms the pending deadline, if any, and returns its key.
    ///
    /// Safe to call when nothing is armed.
    pub fn cancel(&mut self) -> Option<K> {
        let armed = self.armed.take()?;
        self.stats.cancelled += 1;
        debug!(key = ?armed.key, generation = armed.generation, "deadline cancelled");
        Some(armed.key)
    }

    /// Waits until the armed deadline passes, then disarms and returns it.
    ///
    /// With nothing armed this future pends forever; inside `select!` the
    /// other branches keep running. Dropping the future before it resolves
    /// leaves the deadline armed.
    pub async fn wait(&mut self) -> Deadline<K> {
        let Some(armed) = self.armed else {
            return std::future::pending().await;
        };

        time::sleep_until(armed.at).await;

        let late_by = Instant::now().saturating_duration_since(armed.at);
        self.armed = None;
        self.stats.fired += 1;

        if late_by > LATE_WARN_THRESHOLD {
            self.stats.late += 1;
            warn!(
                key = ?armed.key,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "phase deadline fired late"
            );
        } else {
            trace!(key = ?armed.key, generation = armed.generation, "deadline fired");
        }

        Deadline {
            key: armed.key,
            generation: armed.generation,
            late_by,
        }
    }

    /// Whether a deadline is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// The key of the armed deadline, if any.
    pub fn armed_for(&self) -> Option<K> {
        self.armed.map(|a| a.key)
    }

    /// Time left until the armed deadline, or `None` when disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .map(|a| a.at.saturating_duration_since(Instant::now()))
    }

    /// Lifetime counters.
    pub fn stats(&self) -> &TimerStats {
        &self.stats
    }
}

impl<K: Copy + Debug> Default for PhaseTimer<K> {
    fn default() -> Self {
        Self::new()
    }
}
