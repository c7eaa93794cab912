//! Feed Protocol
//!
//! Shapes exchanged with scoreboard clients and overlay tooling. Commands
//! and updates are JSON; the overlay record is deliberately flat because
//! broadcast graphics packages bind to plain field names.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::score::events::ScoreEvent;
use crate::score::point::GamePoints;
use crate::score::signals::{self, Signals};
use crate::score::state::{MatchState, PerSide, Side};

/// Display names of both sides.
pub type TeamNames = PerSide<String>;

/// Minimum number of set slots in an overlay record.
pub const MIN_SET_SLOTS: u32 = 5;

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

/// Commands from a point-entry client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreCommand {
    /// Award a point.
    Point {
        /// Point winner
        side: Side,
    },

    /// Remove the last point.
    Undo,
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

/// Messages pushed to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// Score changed.
    Update(ScoreUpdate),

    /// A command was rejected.
    Error(ApiError),
}

/// Score change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUpdate {
    /// Match identifier (hyphenated UUID).
    pub match_id: String,
    /// Points played after the change.
    pub points_played: u32,
    /// Events the change produced (empty for an undo).
    pub events: Vec<ScoreEvent>,
    /// Fresh overlay record.
    pub overlay: OverlayRecord,
}

/// Serving-boundary error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown match or court.
    NotFound,
    /// Malformed request or snapshot.
    BadRequest,
    /// Request conflicts with the match state.
    Conflict,
    /// Internal error.
    InternalError,
}

impl ErrorCode {
    /// Matching HTTP status.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::BadRequest => 400,
            ErrorCode::Conflict => 409,
            ErrorCode::InternalError => 500,
        }
    }
}

// =============================================================================
// OVERLAY RECORD
// =============================================================================

/// Flat, fixed-shape score record for broadcast overlays.
///
/// Set slots are flattened into `set{n}_a`, `set{n}_b`, `set{n}_tiebreak_a`
/// and `set{n}_tiebreak_b` for every slot up to `max(5, total_sets)`. Slots
/// that carry no value hold an empty string so the shape never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayRecord {
    /// Side A name
    pub team_a: String,
    /// Side B name
    pub team_b: String,
    /// Side A point label
    pub points_a: String,
    /// Side B point label
    pub points_b: String,
    /// Side A games in the displayed set
    pub games_a: u32,
    /// Side B games in the displayed set
    pub games_b: u32,
    /// Sets won by side A
    pub sets_a: u32,
    /// Sets won by side B
    pub sets_b: u32,
    /// Side A is serving
    pub serving_a: bool,
    /// Side B is serving
    pub serving_b: bool,
    /// Team slot of the current server
    pub server_slot: u8,
    /// A tiebreak is being played
    pub tiebreak: bool,
    /// Match has finished
    pub completed: bool,
    /// Winner's name once completed
    pub winner: Option<String>,
    /// Set number (1-based)
    pub current_set: u32,
    /// Important point label
    pub important_point: Option<String>,
    /// Side holding the important point
    pub important_point_side: Option<Side>,
    /// Name of the side holding the important point
    pub important_point_team: Option<String>,
    /// Someone is at match point
    pub match_point: bool,
    /// Someone is at set point
    pub set_point: bool,
    /// Someone is at game point
    pub game_point: bool,
    /// Per-set slots
    #[serde(flatten)]
    pub sets: BTreeMap<String, String>,
}

impl OverlayRecord {
    /// Build the record from a snapshot. Never fails.
    pub fn build(state: &MatchState, teams: &TeamNames) -> Self {
        let signals = Signals::derive(state);
        let name = |side: Side| teams.side(side).clone();

        let (points, games) = match state.current_set() {
            Some(set) => (
                PerSide::new(set.game.points.label(Side::A), set.game.points.label(Side::B)),
                set.games,
            ),
            None => (
                PerSide::new("0".to_string(), "0".to_string()),
                state.completed_sets.last().map(|s| s.games).unwrap_or_default(),
            ),
        };

        let serving = |side: Side| !state.completed && state.serve.side == side;
        let important = signals.important_point;

        Self {
            team_a: name(Side::A),
            team_b: name(Side::B),
            points_a: points.a,
            points_b: points.b,
            games_a: games.a,
            games_b: games.b,
            sets_a: signals.sets_won.a,
            sets_b: signals.sets_won.b,
            serving_a: serving(Side::A),
            serving_b: serving(Side::B),
            server_slot: state.serve.slot(),
            tiebreak: signals.tiebreak,
            completed: state.completed,
            winner: state.winner.map(name),
            current_set: signals.current_set,
            important_point: important.map(|p| p.label().to_string()),
            important_point_side: important.and_then(|p| p.side()),
            important_point_team: important.and_then(|p| p.side()).map(name),
            match_point: signals.match_point.is_some(),
            set_point: signals.set_point.is_some(),
            game_point: signals.game_point.is_some(),
            sets: set_slots(state),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Value of a set slot field such as `set2_a`.
    pub fn set_slot(&self, key: &str) -> Option<&str> {
        self.sets.get(key).map(String::as_str)
    }
}

fn set_slots(state: &MatchState) -> BTreeMap<String, String> {
    let slots = MIN_SET_SLOTS.max(signals::total_sets(state));
    let mut fields = BTreeMap::new();

    for n in 1..=slots {
        let index = (n - 1) as usize;
        let (games, tiebreak) = match state.completed_sets.get(index) {
            Some(set) => (Some(set.games), set.tiebreak),
            None if index == state.completed_sets.len() => match state.current_set() {
                Some(set) => {
                    let live = match set.game.points {
                        GamePoints::Tiebreak { a, b, .. } => Some(PerSide::new(a, b)),
                        GamePoints::Standard { .. } => None,
                    };
                    (Some(set.games), live)
                }
                None => (None, None),
            },
            None => (None, None),
        };

        for side in Side::BOTH {
            fields.insert(
                format!("set{}_{}", n, side.key()),
                games.map(|g| g.get(side).to_string()).unwrap_or_default(),
            );
            fields.insert(
                format!("set{}_tiebreak_{}", n, side.key()),
                tiebreak.map(|t| t.get(side).to_string()).unwrap_or_default(),
            );
        }
    }

    fields
}

impl FeedMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ScoreCommand {
    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
