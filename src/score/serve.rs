//! Serve Rotation
//!
//! Who serves next is a strategy, not a hardcoded sequence: singles and
//! doubles rotate differently and tiebreak cadence varies by competition.
//! [`ServeRules`] is the built-in, serializable strategy stored in the match
//! format; anything implementing [`ServeRotation`] can be injected into the
//! transition engine instead.

use serde::{Serialize, Deserialize};

use crate::score::format::Sport;
use crate::score::state::{PerSide, Side};

/// Current server: the serving side and, for each side, which team member
/// serves that side's next service game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServeState {
    /// Side serving now
    pub side: Side,
    /// Per-side server slot (0-based position within the team)
    pub slots: PerSide<u8>,
}

impl ServeState {
    /// First server of a match; both teams start from their first player.
    pub const fn new(side: Side) -> Self {
        Self {
            side,
            slots: PerSide::new(0, 0),
        }
    }

    /// Slot of the player currently serving.
    #[inline]
    pub fn slot(&self) -> u8 {
        self.slots.get(self.side)
    }
}

impl Default for ServeState {
    fn default() -> Self {
        Self::new(Side::A)
    }
}

/// Serve rotation strategy.
pub trait ServeRotation {
    /// Server of the next game after `serve` finished a service game.
    fn next_after_game(&self, serve: ServeState) -> ServeState;

    /// Server inside a tiebreak, given the first server of the tiebreak and
    /// the number of tiebreak points already played.
    fn tiebreak_server(&self, opener: ServeState, points_played: u32) -> ServeState;
}

/// Built-in rotation parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServeRules {
    /// Players per team (1 for singles, 2 for doubles)
    pub team_size: u8,
    /// Tiebreak points served by the opener before the first change
    pub first_change_after: u32,
    /// Tiebreak points per server after the first change
    pub change_every: u32,
}

impl ServeRules {
    /// One player per side.
    pub const fn singles() -> Self {
        Self {
            team_size: 1,
            first_change_after: 1,
            change_every: 2,
        }
    }

    /// Two players per side, rotating A1, B1, A2, B2.
    pub const fn doubles() -> Self {
        Self {
            team_size: 2,
            first_change_after: 1,
            change_every: 2,
        }
    }

    /// Conventional rules for a sport, optionally forcing doubles.
    pub fn for_sport(sport: Sport, doubles: Option<bool>) -> Self {
        let doubles = doubles.unwrap_or(matches!(sport, Sport::Padel));
        if doubles {
            Self::doubles()
        } else {
            Self::singles()
        }
    }
}

impl Default for ServeRules {
    fn default() -> Self {
        Self::singles()
    }
}

impl ServeRotation for ServeRules {
    fn next_after_game(&self, serve: ServeState) -> ServeState {
        let team_size = self.team_size.max(1);
        let mut next = serve;
        let slot = next.slots.get_mut(serve.side);
        *slot = (*slot % team_size + 1) % team_size;
        next.side = serve.side.opponent();
        next
    }

    fn tiebreak_server(&self, opener: ServeState, points_played: u32) -> ServeState {
        let changes = if points_played < self.first_change_after {
            0
        } else {
            1 + (points_played - self.first_change_after) / self.change_every.max(1)
        };
        (0..changes).fold(opener, |serve, _| self.next_after_game(serve))
    }
}
