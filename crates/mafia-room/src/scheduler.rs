//! The phase state machine.
//!
//! [`PhaseScheduler`] drives one [`Room`] from the lobby to the end of the
//! game:
//!
//! ```text
//! Lobby → NightMafia → NightMedic → NightDetective → NightResolve
//!       → Day → VoteResolve → NightMafia … → GameEnd
//! ```
//!
//! Every timed phase lasts its full configured duration; recorded actions
//! never shorten it. The two resolve phases run synchronously inside the
//! deadline handler that enters them.
//!
//! The scheduler owns the room's single [`PhaseTimer`] and its
//! [`RandomSource`]. It performs no I/O: each operation returns an
//! [`Outbox`] the room actor delivers.

use mafia_protocol::{Phase, PlayerId, Role, ServerEvent, Team};
use mafia_rules::{assign_roles, evaluate_win, tally_votes, RandomSource, Verdict};
use mafia_timer::{Deadline, PhaseTimer};
use tracing::{debug, info, warn};

use crate::broadcast::{Outbox, Recipient};
use crate::state::{NightAction, Room};
use crate::{RoomConfig, RoomError};

/// Boxed randomness, so tests can script it.
pub type BoxedRandom = Box<dyn RandomSource + Send>;

/// Drives one room through its phases.
pub struct PhaseScheduler {
    config: RoomConfig,
    timer: PhaseTimer<Phase>,
    rng: BoxedRandom,
}

impl PhaseScheduler {
    pub fn new(config: RoomConfig, rng: BoxedRandom) -> Self {
        Self {
            config,
            timer: PhaseTimer::new(),
            rng,
        }
    }

    /// The room's phase timer.
    pub fn timer(&self) -> &PhaseTimer<Phase> {
        &self.timer
    }

    /// Resolves when the armed phase deadline passes. Pends forever while
    /// nothing is armed.
    pub async fn next_deadline(&mut self) -> Deadline<Phase> {
        self.timer.wait().await
    }

    /// Disarms the pending deadline. Called when the room is destroyed.
    pub fn halt(&mut self) {
        if let Some(phase) = self.timer.cancel() {
            debug!(%phase, "phase timer cancelled");
        }
    }

    // -- Start ----------------------------------------------------------

    /// Deals roles and opens the first night.
    ///
    /// # Errors
    /// - [`RoomError::NotHost`] if `requester` is not the host
    /// - [`RoomError::GameInProgress`] outside the lobby
    /// - [`RoomError::InsufficientPlayers`] below the configured minimum or
    ///   too few to seat every role
    pub fn start_game(&mut self, room: &mut Room, requester: PlayerId) -> Result<Outbox, RoomError> {
        if requester != room.host() {
            return Err(RoomError::NotHost);
        }
        if room.phase() != Phase::Lobby {
            return Err(RoomError::GameInProgress(room.code().clone()));
        }

        let needed = room.settings().players_needed();
        let have = room.players().len();
        if have < needed {
            return Err(RoomError::InsufficientPlayers { needed, have });
        }

        let roles = assign_roles(&room.player_ids(), room.settings().mafia_count, &mut self.rng)?;
        room.apply_roles(&roles);

        info!(room = %room.code(), players = have, "game started");

        let mut out: Outbox = room
            .players()
            .iter()
            .map(|p| (Recipient::Player(p.id), ServerEvent::YourRole { role: p.role }))
            .collect();
        self.enter_night(room, &mut out);
        Ok(out)
    }

    // -- Player input ---------------------------------------------------

    /// Records a night choice. An accepted investigation is answered
    /// immediately and privately.
    pub fn submit_night_action(
        &mut self,
        room: &mut Room,
        actor: PlayerId,
        action: NightAction,
        target: PlayerId,
    ) -> Result<Outbox, RoomError> {
        room.record_night_choice(actor, action, target)?;
        debug!(room = %room.code(), %actor, ?action, %target, "night choice recorded");

        let mut out = Outbox::new();
        if action == NightAction::Investigate {
            let is_mafia = room.player(target).is_some_and(|p| p.role == Role::Mafia);
            out.push((
                Recipient::Player(actor),
                ServerEvent::DetectiveResult { target_id: target, is_mafia },
            ));
        }
        Ok(out)
    }

    /// Records a day ballot and broadcasts the updated tally.
    pub fn submit_vote(
        &mut self,
        room: &mut Room,
        voter: PlayerId,
        target: Option<PlayerId>,
    ) -> Result<Outbox, RoomError> {
        room.record_vote(voter, target)?;
        Ok(vec![(Recipient::Room, vote_update(room))])
    }

    /// Re-evaluates the game after someone left mid-game.
    ///
    /// The departure can hand either side the win. During the day the
    /// ballots may also have changed.
    pub fn on_player_left(&mut self, room: &mut Room) -> Outbox {
        let mut out = Outbox::new();
        if !room.phase().is_in_game() {
            return out;
        }
        if self.check_win(room, &mut out) {
            return out;
        }
        if room.phase() == Phase::Day {
            out.push((Recipient::Room, vote_update(room)));
        }
        out
    }

    // -- Deadlines ------------------------------------------------------

    /// Advances the room after a phase deadline.
    ///
    /// A deadline armed for a phase the room has already left is ignored.
    pub fn on_deadline(&mut self, room: &mut Room, deadline: Deadline<Phase>) -> Outbox {
        let mut out = Outbox::new();
        if deadline.key != room.phase() {
            debug!(
                room = %room.code(),
                armed_for = %deadline.key,
                phase = %room.phase(),
                "stale deadline ignored"
            );
            return out;
        }

        match deadline.key {
            Phase::NightMafia => {
                self.fallback_mafia_target(room);
                self.enter(room, Phase::NightMedic, &mut out);
            }
            Phase::NightMedic => self.enter(room, Phase::NightDetective, &mut out),
            Phase::NightDetective => self.resolve_night(room, &mut out),
            Phase::Day => self.resolve_vote(room, &mut out),
            other => warn!(room = %room.code(), phase = %other, "deadline for untimed phase"),
        }
        out
    }

    /// Picks a random victim when the mafia let the clock run out.
    fn fallback_mafia_target(&mut self, room: &mut Room) {
        if room.night().mafia_target.is_some() {
            return;
        }
        let candidates = room.alive_non_mafia();
        if candidates.is_empty() {
            return;
        }
        let pick = candidates[self.rng.below(candidates.len())];
        debug!(room = %room.code(), target = %pick, "mafia target chosen at random");
        room.set_mafia_target(Some(pick));
    }

    fn resolve_night(&mut self, room: &mut Room, out: &mut Outbox) {
        room.set_phase(Phase::NightResolve);

        let night = *room.night();
        let saved = night.mafia_target.is_some() && night.medic_save == night.mafia_target;
        let victim = night
            .mafia_target
            .filter(|_| !saved)
            .and_then(|id| room.kill(id).map(|name| (id, name)));

        info!(
            room = %room.code(),
            killed = ?victim.as_ref().map(|(id, _)| *id),
            saved,
            "night resolved"
        );

        let (killed_id, killed_name) = victim.unzip();
        out.push((
            Recipient::Room,
            ServerEvent::NightResult {
                killed_id,
                medic_saved: saved,
                killed_name,
            },
        ));
        if let Some(id) = killed_id {
            out.push((Recipient::Player(id), ServerEvent::YouDied));
        }

        if self.check_win(room, out) {
            return;
        }
        room.reset_votes();
        self.enter(room, Phase::Day, out);
    }

    fn resolve_vote(&mut self, room: &mut Room, out: &mut Outbox) {
        room.set_phase(Phase::VoteResolve);

        let lynched = tally_votes(room.votes()).and_then(|id| room.kill(id).map(|name| (id, name)));
        info!(
            room = %room.code(),
            lynched = ?lynched.as_ref().map(|(id, _)| *id),
            ballots = room.votes().len(),
            "vote resolved"
        );

        let (lynched, lynched_name) = lynched.unzip();
        out.push((Recipient::Room, ServerEvent::VoteResult { lynched, lynched_name }));

        if self.check_win(room, out) {
            return;
        }
        self.enter_night(room, out);
    }

    // -- Transitions ----------------------------------------------------

    fn enter_night(&mut self, room: &mut Room, out: &mut Outbox) {
        room.reset_night();
        room.reset_votes();
        self.enter(room, Phase::NightMafia, out);
    }

    /// Moves to `phase`, arming its deadline if it is timed.
    fn enter(&mut self, room: &mut Room, phase: Phase, out: &mut Outbox) {
        room.set_phase(phase);
        if let Some(duration) = self.config.phase_duration(phase) {
            self.timer.arm(phase, duration);
            out.push((
                Recipient::Room,
                ServerEvent::PhaseMessage {
                    phase,
                    timeout_ms: duration.as_millis() as u64,
                },
            ));
        }
        debug!(room = %room.code(), %phase, "phase entered");
    }

    /// Ends the game if either side has won. Returns whether it did.
    fn check_win(&mut self, room: &mut Room, out: &mut Outbox) -> bool {
        match evaluate_win(room.living_roles()) {
            Verdict::Continue => false,
            Verdict::Over(winner) => {
                self.finish(room, winner, out);
                true
            }
        }
    }

    fn finish(&mut self, room: &mut Room, winner: Team, out: &mut Outbox) {
        self.timer.cancel();
        room.set_phase(Phase::GameEnd);
        info!(room = %room.code(), %winner, "game over");
        out.push((
            Recipient::Room,
            ServerEvent::GameEnd {
                winner,
                reveal: room.reveal(),
            },
        ));
    }
}

fn vote_update(room: &Room) -> ServerEvent {
    ServerEvent::VoteUpdate {
        votes: room.votes().to_vec(),
    }
}
