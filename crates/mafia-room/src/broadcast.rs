//! Outbound delivery: the seam between room actors and connections.
//!
//! Room actors never hold sockets. They hand each event to a
//! [`Broadcaster`] together with the player it is for; the server decides
//! how that reaches a client. [`ChannelBroadcaster`] is the implementation
//! the server uses: one bounded channel per connected player.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use mafia_protocol::{PlayerId, ServerEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Who an outbound event is for, relative to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player currently in the room.
    Room,
    /// One specific player.
    Player(PlayerId),
}

/// Events queued by the state machine, delivered by the room actor.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

/// Abstract sink the room layer calls to notify clients.
///
/// Delivery is fire-and-forget: a player who has gone away simply misses
/// the event. Implementations must not block.
pub trait Broadcaster: Send + Sync + 'static {
    /// Delivers `event` to one player.
    fn send(&self, player: PlayerId, event: ServerEvent);

    /// Delivers `event` to each of `players`.
    fn broadcast(&self, players: &[PlayerId], event: &ServerEvent) {
        for player in players {
            self.send(*player, event.clone());
        }
    }
}

/// Channel sender for delivering outbound events to one connection.
pub type PlayerSender = mpsc::Sender<ServerEvent>;

/// Events queued per player before further ones are dropped.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Creates the outbound channel for one connection.
pub fn player_channel() -> (PlayerSender, mpsc::Receiver<ServerEvent>) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// A [`Broadcaster`] backed by one bounded channel per player.
///
/// The connection handler registers its sender when the player connects
/// and unregisters it on disconnect. A player whose queue is full (a
/// client that stopped reading) misses events instead of growing the
/// queue.
#[derive(Debug, Default)]
pub struct ChannelBroadcaster {
    senders: Mutex<HashMap<PlayerId, PlayerSender>>,
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes future events for `player` into `sender`, replacing any
    /// previous registration.
    pub fn register(&self, player: PlayerId, sender: PlayerSender) {
        self.lock().insert(player, sender);
    }

    /// Stops routing events to `player`.
    pub fn unregister(&self, player: PlayerId) {
        self.lock().remove(&player);
    }

    /// Number of registered players.
    pub fn connected(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PlayerId, PlayerSender>> {
        // The map stays consistent even if a holder panicked mid-insert.
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn send(&self, player: PlayerId, event: ServerEvent) {
        let Some(sender) = self.lock().get(&player).cloned() else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(%player, "outbound queue full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::trace!(%player, "dropping event for closed connection");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_reaches_registered_player() {
        let hub = ChannelBroadcaster::new();
        let (tx, mut rx) = player_channel();
        hub.register(PlayerId(1), tx);

        hub.send(PlayerId(1), ServerEvent::YouDied);
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::YouDied);
    }

    #[test]
    fn test_send_to_unknown_player_is_dropped() {
        let hub = ChannelBroadcaster::new();
        hub.send(PlayerId(9), ServerEvent::YouDied);
        assert_eq!(hub.connected(), 0);
    }

    #[test]
    fn test_broadcast_fans_out() {
        let hub = ChannelBroadcaster::new();
        let (tx1, mut rx1) = player_channel();
        let (tx2, mut rx2) = player_channel();
        hub.register(PlayerId(1), tx1);
        hub.register(PlayerId(2), tx2);

        let event = ServerEvent::error("boom");
        hub.broadcast(&[PlayerId(1), PlayerId(2)], &event);

        assert_eq!(rx1.try_recv().unwrap(), event);
        assert_eq!(rx2.try_recv().unwrap(), event);
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let hub = ChannelBroadcaster::new();
        let (tx, mut rx) = mpsc::channel(2);
        hub.register(PlayerId(1), tx);

        hub.send(PlayerId(1), ServerEvent::error("one"));
        hub.send(PlayerId(1), ServerEvent::error("two"));
        hub.send(PlayerId(1), ServerEvent::error("three"));

        assert_eq!(rx.try_recv().unwrap(), ServerEvent::error("one"));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::error("two"));
        assert!(rx.try_recv().is_err());

        // Space frees up once the reader catches up.
        hub.send(PlayerId(1), ServerEvent::error("four"));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::error("four"));
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let hub = ChannelBroadcaster::new();
        let (tx, mut rx) = player_channel();
        hub.register(PlayerId(1), tx);
        hub.unregister(PlayerId(1));

        hub.send(PlayerId(1), ServerEvent::YouDied);
        assert!(rx.try_recv().is_err());
    }
}
