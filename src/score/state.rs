//! Score State Definitions
//!
//! The canonical snapshot of a match. Values here are plain data; every
//! change goes through [`crate::score::transition`] so that each stored
//! snapshot is rule-valid.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::score::error::ScoreError;
use crate::score::format::{FinalSet, MatchFormat, SetRules};
use crate::score::point::GamePoints;
use crate::score::serve::ServeState;

// =============================================================================
// SIDE
// =============================================================================

/// One of the two competing sides (player or team).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    /// First side
    A = 0,
    /// Second side
    B = 1,
}

impl Side {
    /// Both sides in canonical order.
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    /// The other side.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Lowercase key used in flat records (`"a"` / `"b"`).
    pub fn key(self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }

    /// Parse `"a"`/`"b"` (case insensitive).
    pub fn from_key(key: &str) -> Option<Side> {
        match key.trim() {
            k if k.eq_ignore_ascii_case("a") => Some(Side::A),
            k if k.eq_ignore_ascii_case("b") => Some(Side::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// One value per side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerSide<T> {
    /// Side A's value
    pub a: T,
    /// Side B's value
    pub b: T,
}

impl<T> PerSide<T> {
    /// Build from both values.
    pub const fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Borrow a side's value.
    pub fn side(&self, side: Side) -> &T {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    /// Mutably borrow a side's value.
    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}

impl<T: Copy> PerSide<T> {
    /// Copy out a side's value.
    #[inline]
    pub fn get(&self, side: Side) -> T {
        *self.side(side)
    }
}

// =============================================================================
// GAME
// =============================================================================

/// The game in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Point tally (standard or tiebreak encoding)
    pub points: GamePoints,
    /// Set on the closing point, just before the game folds into its set
    pub winner: Option<Side>,
}

impl GameState {
    /// Fresh game with the given encoding.
    pub const fn new(points: GamePoints) -> Self {
        Self { points, winner: None }
    }

    /// Is this game a tiebreak?
    #[inline]
    pub fn is_tiebreak(&self) -> bool {
        self.points.is_tiebreak()
    }
}

// =============================================================================
// SET
// =============================================================================

/// The set in progress. Owns its current game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetState {
    /// Games won by each side in this set
    pub games: PerSide<u32>,
    /// Game in progress
    pub game: GameState,
    /// Tiebreak has been triggered in this set
    pub tiebreak: bool,
    /// Side at the left end when the set started (display only)
    pub left: Side,
}

impl SetState {
    /// Fresh set at 0-0.
    pub fn new(left: Side, first_game: GamePoints) -> Self {
        Self {
            games: PerSide::default(),
            game: GameState::new(first_game),
            tiebreak: first_game.is_tiebreak(),
            left,
        }
    }
}

/// A finished set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    /// Final game tally
    pub games: PerSide<u32>,
    /// Tiebreak points, when a tiebreak decided the set
    pub tiebreak: Option<PerSide<u32>>,
    /// Winner of the set
    pub winner: Side,
    /// Side at the left end when the set started (display only)
    pub left: Side,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete scoring state of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    /// Resolved format, fixed for the life of the match
    pub format: MatchFormat,

    /// Finished sets in order (always present, possibly empty)
    pub completed_sets: Vec<SetScore>,

    /// Set in progress; `None` once the match is complete
    pub current: Option<SetState>,

    /// Current server
    pub serve: ServeState,

    /// First server of the tiebreak in progress
    pub tiebreak_opener: Option<ServeState>,

    /// Total points applied so far
    pub points_played: u32,

    /// Match has finished
    pub completed: bool,

    /// Winner once completed
    pub winner: Option<Side>,
}

impl MatchState {
    /// New match, side A serving first.
    pub fn new(format: MatchFormat) -> Self {
        Self::with_server(format, Side::A)
    }

    /// New match with a chosen first server.
    pub fn with_server(format: MatchFormat, first_server: Side) -> Self {
        let mut state = Self {
            format,
            completed_sets: Vec::new(),
            current: None,
            serve: ServeState::new(first_server),
            tiebreak_opener: None,
            points_played: 0,
            completed: false,
            winner: None,
        };
        state.open_set(Side::A);
        state
    }

    /// Start the next set. Returns true when the set opens as a tiebreak
    /// (a deciding match tiebreak).
    pub(crate) fn open_set(&mut self, left: Side) -> bool {
        let rules = self.set_rules();
        let first_game = match rules.match_tiebreak {
            Some(target) => {
                self.tiebreak_opener = Some(self.serve);
                GamePoints::tiebreak(target)
            }
            None => GamePoints::standard(),
        };
        self.current = Some(SetState::new(left, first_game));
        first_game.is_tiebreak()
    }

    /// Sets won by a side.
    pub fn sets_won(&self, side: Side) -> u32 {
        self.completed_sets.iter().filter(|s| s.winner == side).count() as u32
    }

    /// Sets won by both sides.
    pub fn sets_won_pair(&self) -> PerSide<u32> {
        PerSide::new(self.sets_won(Side::A), self.sets_won(Side::B))
    }

    /// Rules of the set in progress (or of the next set to be played).
    pub fn set_rules(&self) -> SetRules {
        self.format.set_rules(&self.sets_won_pair())
    }

    /// Set in progress.
    pub fn current_set(&self) -> Option<&SetState> {
        self.current.as_ref()
    }

    /// Game in progress.
    pub fn current_game(&self) -> Option<&GameState> {
        self.current.as_ref().map(|set| &set.game)
    }

    /// Is the game in progress a tiebreak?
    pub fn in_tiebreak(&self) -> bool {
        self.current_game().is_some_and(GameState::is_tiebreak)
    }

    /// Has the match finished?
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Check structural invariants.
    ///
    /// The transition engine refuses to advance a snapshot that fails here.
    pub fn validate(&self) -> Result<(), ScoreError> {
        let malformed = |reason: &str| Err(ScoreError::MalformedState(reason.to_string()));

        // Room for every set of a match that goes the distance
        let longest = self
            .format
            .sets_to_win
            .checked_mul(2)
            .and_then(|n| n.checked_sub(1));
        if !longest.is_some_and(|longest| self.format.total_sets >= longest) {
            return malformed("format set counts are inconsistent");
        }
        if self.format.tiebreak_target == 0
            || matches!(self.format.final_set, FinalSet::MatchTiebreak { target: 0 })
        {
            return malformed("format tiebreak target is zero");
        }
        if self.completed != self.winner.is_some() {
            return malformed("completion flag and winner disagree");
        }
        if self.completed_sets.len() > self.format.total_sets as usize {
            return malformed("more completed sets than the format allows");
        }

        let sets_won = self.sets_won_pair();
        match self.winner {
            Some(winner) => {
                if sets_won.get(winner) != self.format.sets_to_win {
                    return malformed("winner does not hold the required sets");
                }
                if self.current.is_some() {
                    return malformed("completed match still has a set in progress");
                }
            }
            None => {
                if sets_won.a >= self.format.sets_to_win || sets_won.b >= self.format.sets_to_win {
                    return malformed("a side has enough sets but the match is open");
                }
                let Some(set) = &self.current else {
                    return malformed("match in progress has no current set");
                };
                if set.game.winner.is_some() || set.game.points.decided().is_some() {
                    return malformed("current game is already decided");
                }
                if !set.game.points.is_consistent() {
                    return malformed("advantage held against a score other than 40");
                }
                if set.tiebreak != set.game.is_tiebreak() {
                    return malformed("set tiebreak flag does not match the current game");
                }
                if self.tiebreak_opener.is_some() != set.game.is_tiebreak() {
                    return malformed("tiebreak opener missing or stale");
                }
                if self.set_rules().set_winner(&set.games).is_some() {
                    return malformed("current set is already decided");
                }
            }
        }

        Ok(())
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, ScoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compute hash of the scoring state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.points_played, |hasher| {
            hash_format(hasher, &self.format);

            hasher.update_u32(self.completed_sets.len() as u32);
            for set in &self.completed_sets {
                hash_games(hasher, &set.games);
                match &set.tiebreak {
                    Some(points) => {
                        hasher.update_u8(1);
                        hash_games(hasher, points);
                    }
                    None => hasher.update_u8(0),
                }
                hasher.update_u8(set.winner as u8);
                hasher.update_u8(set.left as u8);
            }

            match &self.current {
                Some(set) => {
                    hasher.update_u8(1);
                    hash_games(hasher, &set.games);
                    hasher.update_bool(set.tiebreak);
                    hasher.update_u8(set.left as u8);
                    hash_points(hasher, &set.game.points);
                }
                None => hasher.update_u8(0),
            }

            hash_serve(hasher, &self.serve);
            match &self.tiebreak_opener {
                Some(opener) => {
                    hasher.update_u8(1);
                    hash_serve(hasher, opener);
                }
                None => hasher.update_u8(0),
            }

            hasher.update_bool(self.completed);
            hasher.update_u8(self.winner.map(|w| w as u8 + 1).unwrap_or(0));
        })
    }
}

fn hash_format(hasher: &mut StateHasher, format: &MatchFormat) {
    hasher.update_u8(format.sport as u8);
    hasher.update_u32(format.sets_to_win);
    hasher.update_u32(format.total_sets);
    hasher.update_u32(format.games_per_set);
    hasher.update_opt_u32(format.tiebreak_at);
    hasher.update_u32(format.tiebreak_target);
    match format.final_set {
        FinalSet::Standard => hasher.update_u8(0),
        FinalSet::Advantage => hasher.update_u8(1),
        FinalSet::MatchTiebreak { target } => {
            hasher.update_u8(2);
            hasher.update_u32(target);
        }
    }
    hasher.update_u8(format.serve.team_size);
    hasher.update_u32(format.serve.first_change_after);
    hasher.update_u32(format.serve.change_every);
}

fn hash_games(hasher: &mut StateHasher, games: &PerSide<u32>) {
    hasher.update_u32(games.a);
    hasher.update_u32(games.b);
}

fn hash_points(hasher: &mut StateHasher, points: &GamePoints) {
    match *points {
        GamePoints::Standard { a, b } => {
            hasher.update_u8(0);
            hasher.update_u8(a as u8);
            hasher.update_u8(b as u8);
        }
        GamePoints::Tiebreak { a, b, target } => {
            hasher.update_u8(1);
            hasher.update_u32(a);
            hasher.update_u32(b);
            hasher.update_u32(target);
        }
    }
}

fn hash_serve(hasher: &mut StateHasher, serve: &ServeState) {
    hasher.update_u8(serve.side as u8);
    hasher.update_u8(serve.slots.a);
    hasher.update_u8(serve.slots.b);
}

// =============================================================================
// TESTS
// =============================================================================
