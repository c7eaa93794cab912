//! Signal Derivation
//!
//! Game, set and match point predicates plus format helpers, recomputed
//! from a snapshot on every call. Nothing here is cached and nothing fails:
//! a completed match or a snapshot without a current set simply yields no
//! signal.

use serde::{Serialize, Deserialize};

use crate::score::point::GamePoints;
use crate::score::state::{MatchState, PerSide, Side};

pub use crate::score::point::point_index;

/// Side one point away from winning the current game.
pub fn is_game_point(state: &MatchState) -> Option<Side> {
    if state.completed {
        return None;
    }
    let game = state.current_game()?;
    game_point_side(&game.points)
}

fn game_point_side(points: &GamePoints) -> Option<Side> {
    Side::BOTH.into_iter().find(|&side| {
        let mine = points.index(side);
        let theirs = points.index(side.opponent());
        match points {
            GamePoints::Tiebreak { target, .. } => {
                mine.saturating_add(1) >= *target && mine > theirs
            }
            GamePoints::Standard { .. } => (mine == 4 && theirs <= 3) || (mine == 3 && theirs <= 2),
        }
    })
}

/// Side one point away from winning the current set.
pub fn is_set_point(state: &MatchState) -> Option<Side> {
    let side = is_game_point(state)?;
    let set = state.current_set()?;

    if set.game.is_tiebreak() {
        return Some(side);
    }

    let mut games = set.games;
    let won = games.get_mut(side);
    *won = won.saturating_add(1);
    (state.set_rules().set_winner(&games) == Some(side)).then_some(side)
}

/// Side one point away from winning the match.
pub fn is_match_point(state: &MatchState) -> Option<Side> {
    let side = is_set_point(state)?;
    (state.sets_won(side).saturating_add(1) >= state.format.sets_to_win).then_some(side)
}

/// The most significant situation of the current point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "side", rename_all = "snake_case")]
pub enum ImportantPoint {
    /// Winning the point wins the match
    MatchPoint(Side),
    /// Winning the point wins the set
    SetPoint(Side),
    /// Winning the point wins a standard game
    GamePoint(Side),
    /// Winning the point wins a tiebreak game
    TiebreakPoint(Side),
    /// A tiebreak is being played, nobody is at game point
    TiebreakInProgress,
}

impl ImportantPoint {
    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            ImportantPoint::MatchPoint(_) => "MATCH POINT",
            ImportantPoint::SetPoint(_) => "SET POINT",
            ImportantPoint::GamePoint(_) => "GAME POINT",
            ImportantPoint::TiebreakPoint(_) => "TIEBREAK POINT",
            ImportantPoint::TiebreakInProgress => "TIEBREAK",
        }
    }

    /// Side holding the point, when there is one.
    pub fn side(&self) -> Option<Side> {
        match *self {
            ImportantPoint::MatchPoint(side)
            | ImportantPoint::SetPoint(side)
            | ImportantPoint::GamePoint(side)
            | ImportantPoint::TiebreakPoint(side) => Some(side),
            ImportantPoint::TiebreakInProgress => None,
        }
    }
}

/// Highest-priority signal: match point, set point, game point (tiebreak
/// point inside a tiebreak), then a bare tiebreak indicator.
pub fn important_point(state: &MatchState) -> Option<ImportantPoint> {
    if let Some(side) = is_match_point(state) {
        return Some(ImportantPoint::MatchPoint(side));
    }
    if let Some(side) = is_set_point(state) {
        return Some(ImportantPoint::SetPoint(side));
    }

    let in_tiebreak = !state.completed && state.in_tiebreak();
    match is_game_point(state) {
        Some(side) if in_tiebreak => Some(ImportantPoint::TiebreakPoint(side)),
        Some(side) => Some(ImportantPoint::GamePoint(side)),
        None if in_tiebreak => Some(ImportantPoint::TiebreakInProgress),
        None => None,
    }
}

// =============================================================================
// FORMAT HELPERS
// =============================================================================

/// Sets in the match format.
pub fn total_sets(state: &MatchState) -> u32 {
    state.format.total_sets
}

/// Sets needed to win the match.
pub fn sets_to_win(state: &MatchState) -> u32 {
    state.format.sets_to_win
}

/// 1-based number of the set in play, or of the last set once completed.
pub fn current_set_number(state: &MatchState) -> u32 {
    let completed = state.completed_sets.len() as u32;
    if state.completed {
        completed
    } else {
        completed + 1
    }
}

/// Every signal of a snapshot, derived at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// Side at game point
    pub game_point: Option<Side>,
    /// Side at set point
    pub set_point: Option<Side>,
    /// Side at match point
    pub match_point: Option<Side>,
    /// Highest-priority situation
    pub important_point: Option<ImportantPoint>,
    /// Current game is a tiebreak
    pub tiebreak: bool,
    /// Set number (1-based)
    pub current_set: u32,
    /// Sets won per side
    pub sets_won: PerSide<u32>,
}

impl Signals {
    /// Derive every signal from a snapshot.
    pub fn derive(state: &MatchState) -> Self {
        Self {
            game_point: is_game_point(state),
            set_point: is_set_point(state),
            match_point: is_match_point(state),
            important_point: important_point(state),
            tiebreak: !state.completed && state.in_tiebreak(),
            current_set: current_set_number(state),
            sets_won: state.sets_won_pair(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::format::{MatchFormat, FinalSet};
    use crate::score::point::PointMarker;
    use crate::score::serve::ServeState;
    use crate::score::state::{SetScore, SetState};

    fn with_game(games: PerSide<u32>, points: GamePoints) -> MatchState {
        let mut state = MatchState::new(MatchFormat::default());
        let mut set = SetState::new(Side::A, points);
        set.games = games;
        if points.is_tiebreak() {
            state.tiebreak_opener = Some(ServeState::new(Side::A));
        }
        state.current = Some(set);
        state
    }

    fn standard(a: PointMarker, b: PointMarker) -> GamePoints {
        GamePoints::Standard { a, b }
    }

    fn won_first_set(mut state: MatchState, winner: Side) -> MatchState {
        let games = match winner {
            Side::A => PerSide::new(6, 3),
            Side::B => PerSide::new(3, 6),
        };
        state.completed_sets.push(SetScore { games, tiebreak: None, winner, left: Side::A });
        state
    }

    #[test]
    fn test_game_point_standard() {
        use PointMarker::*;
        let cases = [
            (standard(Forty, Thirty), Some(Side::A)),
            (standard(Forty, Forty), None),
            (standard(Advantage, Forty), Some(Side::A)),
            (standard(Fifteen, Forty), Some(Side::B)),
            (standard(Thirty, Thirty), None),
        ];
        for (points, expected) in cases {
            let state = with_game(PerSide::new(0, 0), points);
            assert_eq!(is_game_point(&state), expected, "{:?}", points);
        }
    }

    #[test]
    fn test_game_point_tiebreak() {
        let state = with_game(PerSide::new(6, 6), GamePoints::Tiebreak { a: 6, b: 5, target: 7 });
        assert_eq!(is_game_point(&state), Some(Side::A));

        let state = with_game(PerSide::new(6, 6), GamePoints::Tiebreak { a: 6, b: 6, target: 7 });
        assert_eq!(is_game_point(&state), None);

        let state = with_game(PerSide::new(6, 6), GamePoints::Tiebreak { a: 5, b: 3, target: 7 });
        assert_eq!(is_game_point(&state), None);
    }

    #[test]
    fn test_set_point_standard_set() {
        let state = with_game(PerSide::new(5, 4), standard(PointMarker::Forty, PointMarker::Love));
        assert_eq!(is_set_point(&state), Some(Side::A));

        let state = with_game(PerSide::new(5, 5), standard(PointMarker::Forty, PointMarker::Love));
        assert_eq!(is_set_point(&state), None);

        let state = with_game(PerSide::new(6, 5), standard(PointMarker::Forty, PointMarker::Love));
        assert_eq!(is_set_point(&state), Some(Side::A));

        // Game point for the trailing side is not a set point
        let state = with_game(PerSide::new(5, 3), standard(PointMarker::Love, PointMarker::Forty));
        assert_eq!(is_game_point(&state), Some(Side::B));
        assert_eq!(is_set_point(&state), None);
    }

    #[test]
    fn test_set_point_advantage_set() {
        let mut state = with_game(PerSide::new(7, 6), standard(PointMarker::Forty, PointMarker::Love));
        state.format.tiebreak_at = None;
        assert_eq!(is_set_point(&state), Some(Side::A));

        let mut state = with_game(PerSide::new(6, 6), standard(PointMarker::Forty, PointMarker::Love));
        state.format.tiebreak_at = None;
        assert_eq!(is_set_point(&state), None);
    }

    #[test]
    fn test_match_point_in_tiebreak() {
        let state = won_first_set(
            with_game(PerSide::new(6, 6), GamePoints::Tiebreak { a: 6, b: 5, target: 7 }),
            Side::A,
        );

        assert_eq!(is_game_point(&state), Some(Side::A));
        assert_eq!(is_set_point(&state), Some(Side::A));
        assert_eq!(is_match_point(&state), Some(Side::A));
        let important = important_point(&state).unwrap();
        assert_eq!(important, ImportantPoint::MatchPoint(Side::A));
        assert_eq!(important.label(), "MATCH POINT");
    }

    #[test]
    fn test_priority_order() {
        // First set, tiebreak: set point outranks tiebreak point
        let state = with_game(PerSide::new(6, 6), GamePoints::Tiebreak { a: 6, b: 2, target: 7 });
        assert_eq!(important_point(&state), Some(ImportantPoint::SetPoint(Side::A)));

        let state = with_game(PerSide::new(6, 6), GamePoints::Tiebreak { a: 3, b: 2, target: 7 });
        assert_eq!(important_point(&state), Some(ImportantPoint::TiebreakInProgress));
        assert_eq!(ImportantPoint::TiebreakInProgress.label(), "TIEBREAK");

        let state = with_game(PerSide::new(1, 0), standard(PointMarker::Love, PointMarker::Forty));
        assert_eq!(important_point(&state), Some(ImportantPoint::GamePoint(Side::B)));

        let state = with_game(PerSide::new(1, 0), standard(PointMarker::Fifteen, PointMarker::Love));
        assert_eq!(important_point(&state), None);
    }

    #[test]
    fn test_match_tiebreak_point_is_match_point() {
        let format = MatchFormat {
            final_set: FinalSet::MatchTiebreak { target: 10 },
            ..MatchFormat::default()
        };
        let mut state = MatchState::new(format);
        state = won_first_set(state, Side::A);
        state = won_first_set(state, Side::B);
        state.open_set(Side::A);
        if let Some(set) = state.current.as_mut() {
            set.game.points = GamePoints::Tiebreak { a: 4, b: 9, target: 10 };
        }

        assert_eq!(is_match_point(&state), Some(Side::B));
    }

    #[test]
    fn test_no_signal_without_current_set() {
        let mut state = MatchState::new(MatchFormat::default());
        state.current = None;

        assert_eq!(is_game_point(&state), None);
        assert_eq!(is_set_point(&state), None);
        assert_eq!(is_match_point(&state), None);
        assert_eq!(important_point(&state), None);
    }

    #[test]
    fn test_current_set_number() {
        let mut state = won_first_set(MatchState::new(MatchFormat::default()), Side::A);
        assert_eq!(current_set_number(&state), 2);

        state = won_first_set(state, Side::A);
        state.current = None;
        state.completed = true;
        state.winner = Some(Side::A);
        assert_eq!(current_set_number(&state), 2);
        assert_eq!(Signals::derive(&state).important_point, None);
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let state = with_game(PerSide::new(5, 4), standard(PointMarker::Advantage, PointMarker::Forty));
        let first = Signals::derive(&state);
        let second = Signals::derive(&state);

        assert_eq!(first, second);
        assert_eq!(first.set_point, Some(Side::A));
    }
}
