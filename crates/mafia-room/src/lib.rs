//! Rooms for the mafia server.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! game state, its phase timer and its randomness. The registry maps join
//! codes to running rooms.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms, tracks players, routes by code
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Room`]: the per-room aggregate: roster, phase, night choices, votes
//! - [`PhaseScheduler`]: the timed phase state machine
//! - [`Broadcaster`]: how rooms reach connected players
//! - [`RoomConfig`]: player limits and phase durations

mod broadcast;
mod config;
mod error;
mod registry;
mod room;
mod scheduler;
mod state;

pub use broadcast::{
    player_channel, Broadcaster, ChannelBroadcaster, Outbox, PlayerSender, Recipient,
    OUTBOUND_CAPACITY,
};
pub use config::{RoomConfig, RoomSettings};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{spawn_room, RoomHandle, RoomInfo};
pub use scheduler::{BoxedRandom, PhaseScheduler};
pub use state::{Departure, NightAction, NightChoices, Player, Room};
