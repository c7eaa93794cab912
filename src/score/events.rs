//! Score Events
//!
//! Events produced by point application, in the order they happened within
//! the point. Used for live fan-out and for replay inspection.

use serde::{Serialize, Deserialize};

use crate::score::state::{PerSide, Side};

/// Score event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreEventData {
    /// A side won the point
    PointWon {
        /// Point winner
        side: Side,
    },

    /// A side won the game
    GameWon {
        /// Game winner
        side: Side,
        /// Set the game belongs to (1-based)
        set_number: u32,
        /// Set game tally after the game
        games: PerSide<u32>,
        /// The game was a tiebreak
        tiebreak: bool,
    },

    /// The next game is a tiebreak
    TiebreakStarted {
        /// Set the tiebreak belongs to (1-based)
        set_number: u32,
        /// Points needed to win it
        target: u32,
    },

    /// A side won the set
    SetWon {
        /// Set winner
        side: Side,
        /// Finished set (1-based)
        set_number: u32,
        /// Final game tally
        games: PerSide<u32>,
    },

    /// Match finished
    MatchCompleted {
        /// Match winner
        winner: Side,
        /// Final set tally
        sets: PerSide<u32>,
    },
}

/// A score event stamped with the point that caused it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    /// 1-based number of the point that produced this event
    pub point_number: u32,

    /// Side the event concerns, when there is one
    pub side: Option<Side>,

    /// Event data
    pub data: ScoreEventData,
}

impl ScoreEvent {
    /// Create a new event.
    pub fn new(point_number: u32, data: ScoreEventData) -> Self {
        let side = match &data {
            ScoreEventData::PointWon { side } => Some(*side),
            ScoreEventData::GameWon { side, .. } => Some(*side),
            ScoreEventData::SetWon { side, .. } => Some(*side),
            ScoreEventData::MatchCompleted { winner, .. } => Some(*winner),
            ScoreEventData::TiebreakStarted { .. } => None,
        };

        Self {
            point_number,
            side,
            data,
        }
    }

    /// Create point won event.
    pub fn point_won(point_number: u32, side: Side) -> Self {
        Self::new(point_number, ScoreEventData::PointWon { side })
    }

    /// Create game won event.
    pub fn game_won(
        point_number: u32,
        side: Side,
        set_number: u32,
        games: PerSide<u32>,
        tiebreak: bool,
    ) -> Self {
        Self::new(
            point_number,
            ScoreEventData::GameWon {
                side,
                set_number,
                games,
                tiebreak,
            },
        )
    }

    /// Create tiebreak started event.
    pub fn tiebreak_started(point_number: u32, set_number: u32, target: u32) -> Self {
        Self::new(point_number, ScoreEventData::TiebreakStarted { set_number, target })
    }

    /// Create set won event.
    pub fn set_won(point_number: u32, side: Side, set_number: u32, games: PerSide<u32>) -> Self {
        Self::new(
            point_number,
            ScoreEventData::SetWon {
                side,
                set_number,
                games,
            },
        )
    }

    /// Create match completed event.
    pub fn match_completed(point_number: u32, winner: Side, sets: PerSide<u32>) -> Self {
        Self::new(point_number, ScoreEventData::MatchCompleted { winner, sets })
    }

    /// Is this a game, set or match closure?
    pub fn is_closure(&self) -> bool {
        matches!(
            self.data,
            ScoreEventData::GameWon { .. }
                | ScoreEventData::SetWon { .. }
                | ScoreEventData::MatchCompleted { .. }
        )
    }
}
