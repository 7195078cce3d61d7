//! # Mafia
//!
//! A WebSocket server for short-lived mafia games.
//!
//! Players connect, create or join a room by its six-character code, and
//! the host starts the game. From then on each room runs its own timed
//! night/day cycle until town or mafia wins.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mafia::MafiaServer;
//!
//! # async fn run() -> Result<(), mafia::ServerError> {
//! let server = MafiaServer::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use server::{MafiaServer, MafiaServerBuilder};

pub use mafia_protocol::{ClientAction, ServerEvent};
pub use mafia_room::RoomConfig;
