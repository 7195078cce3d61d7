//! Pure game rules for the mafia room server.
//!
//! Nothing in this crate touches time, channels, or rooms. Each function
//! takes plain data and returns a decision, which keeps the rules easy to
//! test exhaustively and lets the room layer own every side effect.
//!
//! # Key items
//!
//! - [`assign_roles`]: shuffle players into mafia/medic/detective/villagers
//! - [`tally_votes`]: plurality with first-seen tie-break
//! - [`evaluate_win`]: town or mafia victory, or keep playing
//! - [`RandomSource`]: injectable randomness for shuffles and picks

mod error;
mod random;
mod roles;
mod tally;
mod win;

pub use error::RulesError;
pub use random::{RandomSource, ScriptedRandom};
pub use roles::{assign_roles, shuffle};
pub use tally::tally_votes;
pub use win::{evaluate_win, Verdict};
