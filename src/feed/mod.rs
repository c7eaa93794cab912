//! Feed Module
//!
//! Live match sessions and the shapes pushed to scoreboards and overlays.
//! Not deterministic: ids, timestamps and locking live here, never in
//! `score`.
//!
//! ## Module Structure
//!
//! - `protocol`: Commands, updates, overlay record, error codes
//! - `session`: Per-match sessions and the session registry

pub mod protocol;
pub mod session;

pub use protocol::{ApiError, ErrorCode, FeedMessage, OverlayRecord, ScoreCommand, ScoreUpdate, TeamNames};
pub use session::{MatchId, MatchSession, SessionConfig, SessionError, SessionManager};
