//! Scoring Module
//!
//! Tennis and padel scoring. Pure and synchronous.
//!
//! ## Module Structure
//!
//! - `point`: Point markers and game tallies
//! - `format`: Match format and settings resolution
//! - `serve`: Serve rotation strategies
//! - `state`: Match, set and game snapshot
//! - `transition`: Point application
//! - `signals`: Game/set/match point derivation
//! - `events`: Score events for fan-out and replay
//! - `error`: Transition errors

pub mod point;
pub mod format;
pub mod serve;
pub mod state;
pub mod transition;
pub mod signals;
pub mod events;
pub mod error;

// Re-export key types
pub use point::{GamePoints, PointMarker, RawPoint, point_index};
pub use format::{MatchFormat, FormatSettings, FormatSource, ResolvedFormat, FinalSet, Sport, resolve_format};
pub use serve::{ServeRotation, ServeRules, ServeState};
pub use state::{MatchState, GameState, SetState, SetScore, Side, PerSide};
pub use transition::{apply_point, apply_point_with, replay_points, PointOutcome};
pub use signals::{ImportantPoint, Signals};
pub use events::{ScoreEvent, ScoreEventData};
pub use error::ScoreError;
