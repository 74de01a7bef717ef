//! Crossroom server components.
//!
//! Wires the core engines into the pieces a realtime backend needs:
//! - Tokio for the prediction timeout task
//! - System monotonic time
//!
//! ## Architecture
//!
//! ```text
//! crossroom-server
//!   ├─ SystemEnv          (production Environment impl)
//!   ├─ RoomManager        (participants, lifecycle, authorization)
//!   └─ PredictionSession  (PredictionEngine + Tokio timeout task)
//! ```
//!
//! `RoomManager` is Sans-IO like the engines: it returns [`RoomAction`]s for
//! the transport layer to execute.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod room_manager;
mod session;
mod system_env;

pub use error::RoomError;
pub use room_manager::{
    Participant, RoomAction, RoomEvent, RoomId, RoomManager, RoomMetadata, RoomSettings, UserId,
};
pub use session::{PredictionSession, SessionConfig};
pub use system_env::SystemEnv;
