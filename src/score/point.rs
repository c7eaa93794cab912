//! Point Values
//!
//! Standard games count 0/15/30/40/Ad through [`PointMarker`]; tiebreak games
//! count plain integers. [`GamePoints`] tags which encoding a game uses so the
//! two can never be mixed.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::score::state::Side;

// =============================================================================
// RAW POINT (wire form)
// =============================================================================

/// Loosely typed point value as it appears in stored snapshots.
///
/// Stored data mixes numbers (`0`, `15`, `30`, `40`, tiebreak counts) with a
/// string sentinel for advantage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPoint {
    /// Numeric value.
    Number(u32),
    /// Text value such as `"AD"` or `"15"`.
    Text(String),
}

impl fmt::Display for RawPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawPoint::Number(n) => write!(f, "{}", n),
            RawPoint::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Map a raw point value to its index.
///
/// `0, 15, 30, 40, Advantage` map to `0..=4`. Values above 40 count as
/// advantage. Any other number (a tiebreak count) passes through unchanged.
/// Unrecognised text maps to 0.
pub fn point_index(value: &RawPoint) -> u32 {
    match value {
        RawPoint::Number(n) => numeric_index(*n),
        RawPoint::Text(text) => {
            let text = text.trim();
            if is_advantage_text(text) {
                return PointMarker::Advantage.index();
            }
            text.parse::<u32>().map(numeric_index).unwrap_or(0)
        }
    }
}

fn numeric_index(n: u32) -> u32 {
    match n {
        0 => 0,
        15 => 1,
        30 => 2,
        40 => 3,
        n if n > 40 => 4,
        n => n,
    }
}

fn is_advantage_text(text: &str) -> bool {
    ["a", "ad", "adv", "advantage"]
        .iter()
        .any(|candidate| text.eq_ignore_ascii_case(candidate))
}

// =============================================================================
// POINT MARKER
// =============================================================================

/// Score of one side inside a standard (non-tiebreak) game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
#[repr(u8)]
pub enum PointMarker {
    /// 0
    #[default]
    Love = 0,
    /// 15
    Fifteen = 1,
    /// 30
    Thirty = 2,
    /// 40
    Forty = 3,
    /// Advantage, only ever held against 40
    Advantage = 4,
}

impl PointMarker {
    /// Ordinal index (0..=4).
    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Marker for an index, if it is in 0..=4.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(PointMarker::Love),
            1 => Some(PointMarker::Fifteen),
            2 => Some(PointMarker::Thirty),
            3 => Some(PointMarker::Forty),
            4 => Some(PointMarker::Advantage),
            _ => None,
        }
    }

    /// Next marker after winning a point, ignoring game closure.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Conventional scoreboard label.
    pub fn label(self) -> &'static str {
        match self {
            PointMarker::Love => "0",
            PointMarker::Fifteen => "15",
            PointMarker::Thirty => "30",
            PointMarker::Forty => "40",
            PointMarker::Advantage => "Ad",
        }
    }

    /// Numeric tennis value (`0, 15, 30, 40`), `None` for advantage.
    pub fn tennis_value(self) -> Option<u32> {
        match self {
            PointMarker::Love => Some(0),
            PointMarker::Fifteen => Some(15),
            PointMarker::Thirty => Some(30),
            PointMarker::Forty => Some(40),
            PointMarker::Advantage => None,
        }
    }
}

impl TryFrom<RawPoint> for PointMarker {
    type Error = String;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        PointMarker::from_index(point_index(&raw))
            .ok_or_else(|| format!("{} is not a standard game score", raw))
    }
}

impl From<PointMarker> for RawPoint {
    fn from(marker: PointMarker) -> Self {
        match marker.tennis_value() {
            Some(value) => RawPoint::Number(value),
            None => RawPoint::Text("AD".to_string()),
        }
    }
}

impl fmt::Display for PointMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// GAME POINTS
// =============================================================================

/// Point tally of the game in progress, tagged by scoring system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GamePoints {
    /// Standard 0/15/30/40/Ad game.
    Standard {
        /// Side A's marker
        a: PointMarker,
        /// Side B's marker
        b: PointMarker,
    },
    /// Integer-counted tiebreak.
    Tiebreak {
        /// Side A's count
        a: u32,
        /// Side B's count
        b: u32,
        /// Points needed to win (with a two-point lead)
        target: u32,
    },
}

impl Default for GamePoints {
    fn default() -> Self {
        Self::standard()
    }
}

impl GamePoints {
    /// Fresh standard game at 0-0.
    pub const fn standard() -> Self {
        GamePoints::Standard {
            a: PointMarker::Love,
            b: PointMarker::Love,
        }
    }

    /// Fresh tiebreak at 0-0.
    pub const fn tiebreak(target: u32) -> Self {
        GamePoints::Tiebreak { a: 0, b: 0, target }
    }

    /// Is this a tiebreak game?
    #[inline]
    pub fn is_tiebreak(&self) -> bool {
        matches!(self, GamePoints::Tiebreak { .. })
    }

    /// Tiebreak target, if this is a tiebreak.
    pub fn tiebreak_target(&self) -> Option<u32> {
        match self {
            GamePoints::Tiebreak { target, .. } => Some(*target),
            GamePoints::Standard { .. } => None,
        }
    }

    /// Index of a side's score: marker index for standard games, raw count
    /// in a tiebreak.
    pub fn index(&self, side: Side) -> u32 {
        match (self, side) {
            (GamePoints::Standard { a, .. }, Side::A) => a.index(),
            (GamePoints::Standard { b, .. }, Side::B) => b.index(),
            (GamePoints::Tiebreak { a, .. }, Side::A) => *a,
            (GamePoints::Tiebreak { b, .. }, Side::B) => *b,
        }
    }

    /// Scoreboard label for a side (`"0"`..`"Ad"`, or the tiebreak count).
    pub fn label(&self, side: Side) -> String {
        match (self, side) {
            (GamePoints::Standard { a, .. }, Side::A) => a.label().to_string(),
            (GamePoints::Standard { b, .. }, Side::B) => b.label().to_string(),
            (GamePoints::Tiebreak { a, .. }, Side::A) => a.to_string(),
            (GamePoints::Tiebreak { b, .. }, Side::B) => b.to_string(),
        }
    }

    /// Points played in a tiebreak (0 for standard games).
    pub fn tiebreak_points_played(&self) -> u32 {
        match self {
            GamePoints::Tiebreak { a, b, .. } => a.saturating_add(*b),
            GamePoints::Standard { .. } => 0,
        }
    }

    /// Is the standard game at 40-40?
    pub fn is_deuce(&self) -> bool {
        matches!(
            self,
            GamePoints::Standard { a: PointMarker::Forty, b: PointMarker::Forty }
        )
    }

    /// Side that has already won this tally, if any.
    ///
    /// Only a tiebreak can be "won" as a standing tally; standard games close
    /// on the winning point and never persist a winning marker.
    pub fn decided(&self) -> Option<Side> {
        match *self {
            GamePoints::Tiebreak { a, b, target } => {
                if a >= target && a >= b.saturating_add(2) {
                    Some(Side::A)
                } else if b >= target && b >= a.saturating_add(2) {
                    Some(Side::B)
                } else {
                    None
                }
            }
            GamePoints::Standard { .. } => None,
        }
    }

    /// Is the tally itself well formed? (Advantage only against 40.)
    pub fn is_consistent(&self) -> bool {
        match *self {
            GamePoints::Standard { a: PointMarker::Advantage, b } => b == PointMarker::Forty,
            GamePoints::Standard { a, b: PointMarker::Advantage } => a == PointMarker::Forty,
            GamePoints::Standard { .. } => true,
            GamePoints::Tiebreak { target, .. } => target > 0,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
