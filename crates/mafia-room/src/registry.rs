//! Room registry: creates rooms, tracks who is where, and routes by code.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mafia_protocol::{PlayerId, RoomCode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::room::spawn_room;
use crate::scheduler::PhaseScheduler;
use crate::state::Room;
use crate::{Broadcaster, RoomConfig, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// All live rooms, keyed by join code, plus a player → rooms index.
///
/// The server owns one registry behind an async mutex, which serialises
/// room creation and removal against lookups. Rooms whose actor has
/// exited (game over) are pruned lazily so their codes can be reused.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Which rooms each player is seated in.
    player_rooms: HashMap<PlayerId, HashSet<RoomCode>>,

    config: RoomConfig,
    broadcaster: Arc<dyn Broadcaster>,

    /// Draws room codes and seeds each room's own generator.
    rng: StdRng,
}

impl RoomRegistry {
    /// Creates an empty registry seeded from the OS.
    pub fn new(config: RoomConfig, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self::with_rng(config, broadcaster, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates an empty registry whose codes and games replay from `seed`.
    pub fn with_seed(config: RoomConfig, broadcaster: Arc<dyn Broadcaster>, seed: u64) -> Self {
        Self::with_rng(config, broadcaster, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RoomConfig, broadcaster: Arc<dyn Broadcaster>, rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config,
            broadcaster,
            rng,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room hosted by `host_id` and starts its actor.
    ///
    /// The code is six characters from `A-Z0-9`, redrawn until it does not
    /// collide with a live room.
    pub fn create_room(
        &mut self,
        host_id: PlayerId,
        host_name: impl Into<String>,
        mafia_count: Option<usize>,
    ) -> RoomCode {
        self.prune_closed();

        let code = loop {
            let candidate = self.generate_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(code = %candidate, "room code collision, redrawing");
        };

        let settings = self.config.settings_for(mafia_count);
        let room = Room::new(code.clone(), host_id, host_name, settings);
        let scheduler = PhaseScheduler::new(
            self.config.clone(),
            Box::new(StdRng::seed_from_u64(self.rng.random())),
        );
        let handle = spawn_room(room, scheduler, Arc::clone(&self.broadcaster), DEFAULT_CHANNEL_SIZE);

        self.rooms.insert(code.clone(), handle);
        self.player_rooms.entry(host_id).or_default().insert(code.clone());

        tracing::info!(
            room = %code,
            %host_id,
            mafia_count = settings.mafia_count,
            "room created"
        );
        code
    }

    /// Seats `player_id` in the room with `code`.
    pub async fn join_room(
        &mut self,
        code: &RoomCode,
        player_id: PlayerId,
        name: impl Into<String>,
    ) -> Result<(), RoomError> {
        let handle = self.get(code)?;
        handle.join(player_id, name).await?;
        self.player_rooms.entry(player_id).or_default().insert(code.clone());
        Ok(())
    }

    /// Removes `player_id` from the room with `code`.
    ///
    /// The room transfers host or destroys itself as needed.
    pub async fn remove_player(&mut self, code: &RoomCode, player_id: PlayerId) -> Result<(), RoomError> {
        let handle = self.get(code)?;
        let result = handle.leave(player_id).await;
        self.forget(player_id, code);
        result
    }

    /// Removes `player_id` from every room they are seated in. Returns how
    /// many rooms they actually left. Used when a connection closes.
    pub async fn remove_everywhere(&mut self, player_id: PlayerId) -> usize {
        let Some(codes) = self.player_rooms.remove(&player_id) else {
            return 0;
        };

        let mut left = 0;
        for code in codes {
            let Some(handle) = self.rooms.get(&code) else {
                continue;
            };
            match handle.leave(player_id).await {
                Ok(()) => left += 1,
                Err(err) => tracing::debug!(room = %code, %player_id, error = %err, "leave skipped"),
            }
        }
        self.prune_closed();
        left
    }

    /// Looks up a live room.
    pub fn get(&mut self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        match self.rooms.get(code).cloned() {
            Some(handle) if !handle.is_closed() => Ok(handle),
            Some(_) => {
                self.rooms.remove(code);
                Err(RoomError::RoomNotFound(code.clone()))
            }
            None => Err(RoomError::RoomNotFound(code.clone())),
        }
    }

    /// Codes of the rooms `player_id` is seated in.
    pub fn rooms_of(&self, player_id: PlayerId) -> Vec<RoomCode> {
        self.player_rooms
            .get(&player_id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of rooms still registered, including any not yet pruned.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drops rooms whose actor has exited and forgets their players.
    pub fn prune_closed(&mut self) -> usize {
        let closed: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|(_, handle)| handle.is_closed())
            .map(|(code, _)| code.clone())
            .collect();

        for code in &closed {
            self.rooms.remove(code);
            self.player_rooms.retain(|_, codes| {
                codes.remove(code);
                !codes.is_empty()
            });
            tracing::debug!(room = %code, "pruned finished room");
        }
        closed.len()
    }

    fn forget(&mut self, player_id: PlayerId, code: &RoomCode) {
        if let Some(codes) = self.player_rooms.get_mut(&player_id) {
            codes.remove(code);
            if codes.is_empty() {
                self.player_rooms.remove(&player_id);
            }
        }
    }

    fn generate_code(&mut self) -> RoomCode {
        let alphabet = RoomCode::ALPHABET;
        let code: String = (0..RoomCode::LEN)
            .map(|_| char::from(alphabet[self.rng.random_range(0..alphabet.len())]))
            .collect();
        RoomCode::from(code)
    }

    /// Inserts a handle directly; lets tests force a code collision.
    #[cfg(test)]
    fn insert_handle(&mut self, handle: RoomHandle) {
        self.rooms.insert(handle.code().clone(), handle);
    }
}
