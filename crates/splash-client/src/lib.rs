//! Splash client library.
//!
//! A [`GameSession`] connects to a relay room, replicates the
//! authoritative snapshot the relay fans out, and dispatches actions
//! after validating them with the local rules engine. The relay trusts
//! whoever holds the turn, so every client runs the same pure rules
//! code and converges on the same state.

mod error;
mod events;
mod session;

pub use error::{ActionError, SessionError};
pub use events::{EventBus, SessionEvent, SubscriptionId};
pub use session::{GameSession, SessionConfig, SessionPhase};
