//! Point Transition Engine
//!
//! The only way a [`MatchState`] changes. Each call records exactly one
//! point and returns a new snapshot; the input is never touched, so a failed
//! call leaves the caller's copy exactly as it was.

use tracing::{debug, info, warn};

use crate::score::error::ScoreError;
use crate::score::events::ScoreEvent;
use crate::score::point::{GamePoints, PointMarker};
use crate::score::serve::ServeRotation;
use crate::score::state::{GameState, MatchState, PerSide, SetScore, Side};

/// Result of applying a point.
#[derive(Clone, Debug)]
pub struct PointOutcome {
    /// Snapshot after the point
    pub state: MatchState,
    /// Events the point produced, in order
    pub events: Vec<ScoreEvent>,
    /// Whether the match ended on this point
    pub match_completed: bool,
    /// Winner (if the match ended)
    pub winner: Option<Side>,
}

/// Apply one point using the format's own serve rules.
pub fn apply_point(state: &MatchState, side: Side) -> Result<PointOutcome, ScoreError> {
    let rotation = state.format.serve;
    apply_point_with(state, side, &rotation)
}

/// Apply one point with an injected serve rotation.
///
/// # Errors
///
/// * [`ScoreError::AlreadyCompleted`] when the match has finished
/// * [`ScoreError::MalformedState`] when the snapshot fails validation
pub fn apply_point_with<R: ServeRotation + ?Sized>(
    state: &MatchState,
    side: Side,
    rotation: &R,
) -> Result<PointOutcome, ScoreError> {
    if state.completed {
        warn!(points_played = state.points_played, %side, "point rejected: match already completed");
        return Err(ScoreError::AlreadyCompleted);
    }
    if let Err(err) = state.validate() {
        warn!(points_played = state.points_played, %side, "point rejected: {}", err);
        return Err(err);
    }

    let mut next = state.clone();
    let mut events = Vec::new();

    next.points_played = next.points_played.saturating_add(1);
    let point_number = next.points_played;
    events.push(ScoreEvent::point_won(point_number, side));

    let mut set = next
        .current
        .take()
        .ok_or_else(|| ScoreError::MalformedState("no set in progress".to_string()))?;

    let Some(game_winner) = score_point(&mut set.game.points, side) else {
        if set.game.is_tiebreak() {
            let opener = next.tiebreak_opener.unwrap_or(next.serve);
            next.serve = rotation.tiebreak_server(opener, set.game.points.tiebreak_points_played());
        }
        next.current = Some(set);
        return finish(next, events);
    };

    // Game closed: fold it into the set
    let was_tiebreak = set.game.is_tiebreak();
    let tiebreak_points = match set.game.points {
        GamePoints::Tiebreak { a, b, .. } => Some(PerSide::new(a, b)),
        GamePoints::Standard { .. } => None,
    };
    let won = set.games.get_mut(game_winner);
    *won = won.saturating_add(1);

    let set_number = next.completed_sets.len() as u32 + 1;
    debug!(
        set_number,
        games_a = set.games.a,
        games_b = set.games.b,
        tiebreak = was_tiebreak,
        "game won by {}", game_winner
    );
    events.push(ScoreEvent::game_won(point_number, game_winner, set_number, set.games, was_tiebreak));

    next.serve = if was_tiebreak {
        let opener = next.tiebreak_opener.take().unwrap_or(next.serve);
        rotation.next_after_game(opener)
    } else {
        rotation.next_after_game(next.serve)
    };

    let rules = next.set_rules();

    if let Some(set_winner) = rules.set_winner(&set.games) {
        debug!(set_number, games_a = set.games.a, games_b = set.games.b, "set won by {}", set_winner);
        events.push(ScoreEvent::set_won(point_number, set_winner, set_number, set.games));

        let games_played = set.games.a.wrapping_add(set.games.b);
        let left = if games_played % 2 == 1 { set.left.opponent() } else { set.left };

        next.completed_sets.push(SetScore {
            games: set.games,
            tiebreak: tiebreak_points,
            winner: set_winner,
            left: set.left,
        });

        if next.sets_won(set_winner) >= next.format.sets_to_win {
            let sets = next.sets_won_pair();
            next.completed = true;
            next.winner = Some(set_winner);
            next.tiebreak_opener = None;
            info!(
                points_played = point_number,
                sets_a = sets.a,
                sets_b = sets.b,
                "match completed, winner {}", set_winner
            );
            events.push(ScoreEvent::match_completed(point_number, set_winner, sets));
        } else if next.open_set(left) {
            let target = next
                .current_game()
                .and_then(|game| game.points.tiebreak_target())
                .unwrap_or(rules.tiebreak_target);
            events.push(ScoreEvent::tiebreak_started(point_number, set_number + 1, target));
        }
    } else if rules.starts_tiebreak(&set.games) {
        set.game = GameState::new(GamePoints::tiebreak(rules.tiebreak_target));
        set.tiebreak = true;
        next.tiebreak_opener = Some(next.serve);
        debug!(set_number, target = rules.tiebreak_target, "tiebreak started");
        events.push(ScoreEvent::tiebreak_started(point_number, set_number, rules.tiebreak_target));
        next.current = Some(set);
    } else {
        set.game = GameState::default();
        next.current = Some(set);
    }

    finish(next, events)
}

fn finish(state: MatchState, events: Vec<ScoreEvent>) -> Result<PointOutcome, ScoreError> {
    if let Err(err) = state.validate() {
        warn!(points_played = state.points_played, "point produced an invalid snapshot: {}", err);
        return Err(err);
    }
    Ok(PointOutcome {
        match_completed: state.completed,
        winner: state.winner,
        state,
        events,
    })
}

/// Advance a game tally by one point for `side`.
///
/// Returns the game winner when the point closes the game. The tally is left
/// as it stood on the closing point.
fn score_point(points: &mut GamePoints, side: Side) -> Option<Side> {
    match points {
        GamePoints::Standard { a, b } => {
            let (mine, theirs) = match side {
                Side::A => (a, b),
                Side::B => (b, a),
            };
            match (*mine, *theirs) {
                (PointMarker::Advantage, _) => Some(side),
                (PointMarker::Forty, PointMarker::Forty) => {
                    *mine = PointMarker::Advantage;
                    None
                }
                (PointMarker::Forty, PointMarker::Advantage) => {
                    *theirs = PointMarker::Forty;
                    None
                }
                (PointMarker::Forty, _) => Some(side),
                (marker, _) => {
                    *mine = marker.next().unwrap_or(PointMarker::Forty);
                    None
                }
            }
        }
        GamePoints::Tiebreak { a, b, target } => {
            let (mine, theirs) = match side {
                Side::A => (a, b),
                Side::B => (b, a),
            };
            *mine = mine.saturating_add(1);
            if *mine >= *target && *mine >= theirs.saturating_add(2) {
                Some(side)
            } else {
                None
            }
        }
    }
}

/// Apply a sequence of points, stopping at the first error.
pub fn replay_points(
    initial: &MatchState,
    points: &[Side],
) -> Result<(MatchState, Vec<ScoreEvent>), ScoreError> {
    let mut state = initial.clone();
    let mut events = Vec::new();

    for &side in points {
        let outcome = apply_point(&state, side)?;
        state = outcome.state;
        events.extend(outcome.events);
    }

    Ok((state, events))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::events::ScoreEventData;
    use crate::score::format::{FinalSet, MatchFormat};

    fn games(winners: &[Side]) -> Vec<Side> {
        winners.iter().flat_map(|&side| [side; 4]).collect()
    }

    fn play(state: &MatchState, points: &[Side]) -> MatchState {
        replay_points(state, points).unwrap().0
    }

    fn alternating_games(count: usize) -> Vec<Side> {
        let winners: Vec<Side> = (0..count)
            .map(|i| if i % 2 == 0 { Side::A } else { Side::B })
            .collect();
        games(&winners)
    }

    fn points_of(state: &MatchState) -> GamePoints {
        state.current_game().unwrap().points
    }

    #[test]
    fn test_deuce_and_advantage() {
        use Side::{A, B};
        let start = MatchState::new(MatchFormat::default());

        let deuce = play(&start, &[A, A, A, B, B, B]);
        assert!(points_of(&deuce).is_deuce());

        let advantage = play(&deuce, &[A]);
        assert_eq!(
            points_of(&advantage),
            GamePoints::Standard { a: PointMarker::Advantage, b: PointMarker::Forty }
        );

        let back = play(&advantage, &[B]);
        assert!(points_of(&back).is_deuce());
        assert_eq!(back.current_set().unwrap().games, PerSide::new(0, 0));
    }

    #[test]
    fn test_forty_thirty_wins_game() {
        use Side::{A, B};
        let start = MatchState::new(MatchFormat::default());
        let forty_thirty = play(&start, &[A, A, A, B, B]);

        let outcome = apply_point(&forty_thirty, A).unwrap();
        let set = outcome.state.current_set().unwrap();
        assert_eq!(set.games, PerSide::new(1, 0));
        assert_eq!(set.game.points, GamePoints::standard());
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e.data, ScoreEventData::GameWon { side: Side::A, .. })));
    }

    #[test]
    fn test_input_state_untouched() {
        let start = MatchState::new(MatchFormat::default());
        let copy = start.clone();
        let outcome = apply_point(&start, Side::B).unwrap();

        assert_eq!(start, copy);
        assert_eq!(outcome.state.points_played, 1);
    }

    #[test]
    fn test_tiebreak_at_six_all() {
        let start = MatchState::new(MatchFormat::default());
        let six_all = play(&start, &alternating_games(12));

        let set = six_all.current_set().unwrap();
        assert_eq!(set.games, PerSide::new(6, 6));
        assert!(set.tiebreak);
        assert_eq!(set.game.points, GamePoints::tiebreak(7));
        assert!(six_all.tiebreak_opener.is_some());
    }

    #[test]
    fn test_tiebreak_closes_set_seven_six() {
        let start = MatchState::new(MatchFormat::default());
        let six_all = play(&start, &alternating_games(12));

        let mut tiebreak = vec![Side::B; 5];
        tiebreak.extend([Side::A; 7]);
        let after = play(&six_all, &tiebreak);

        assert_eq!(after.completed_sets.len(), 1);
        let set = &after.completed_sets[0];
        assert_eq!(set.games, PerSide::new(7, 6));
        assert_eq!(set.tiebreak, Some(PerSide::new(7, 5)));
        assert_eq!(set.winner, Side::A);
        assert!(after.tiebreak_opener.is_none());
        assert!(!after.in_tiebreak());
    }

    #[test]
    fn test_seven_five_set() {
        use Side::A;
        let start = MatchState::new(MatchFormat::default());
        let mut points = alternating_games(10);
        points.extend(games(&[A, A]));
        let after = play(&start, &points);

        assert_eq!(after.completed_sets.len(), 1);
        assert_eq!(after.completed_sets[0].games, PerSide::new(7, 5));
        assert_eq!(after.completed_sets[0].tiebreak, None);
    }

    #[test]
    fn test_tiebreak_needs_two_point_lead() {
        let start = MatchState::new(MatchFormat::default());
        let six_all = play(&start, &alternating_games(12));

        let mut points = Vec::new();
        for _ in 0..7 {
            points.extend([Side::A, Side::B]);
        }
        let level = play(&six_all, &points);
        assert_eq!(points_of(&level), GamePoints::Tiebreak { a: 7, b: 7, target: 7 });

        let after = play(&level, &[Side::B, Side::B]);
        assert_eq!(after.completed_sets[0].tiebreak, Some(PerSide::new(7, 9)));
        assert_eq!(after.completed_sets[0].winner, Side::B);
    }

    #[test]
    fn test_tiebreak_serve_and_following_set() {
        let start = MatchState::new(MatchFormat::default());
        let six_all = play(&start, &alternating_games(12));
        let opener = six_all.tiebreak_opener.unwrap();
        assert_eq!(opener.side, Side::A);

        let one = play(&six_all, &[Side::A]);
        assert_eq!(one.serve.side, Side::B);
        let three = play(&one, &[Side::A, Side::A]);
        assert_eq!(three.serve.side, Side::A);

        let after = play(&three, &[Side::A; 4]);
        assert_eq!(after.completed_sets.len(), 1);
        assert_eq!(after.serve.side, Side::B);
    }

    #[test]
    fn test_advantage_set_plays_on() {
        let format = MatchFormat {
            tiebreak_at: None,
            ..MatchFormat::default()
        };
        let start = MatchState::new(format);
        let six_all = play(&start, &alternating_games(12));

        let set = six_all.current_set().unwrap();
        assert!(!set.tiebreak);
        assert_eq!(set.games, PerSide::new(6, 6));

        let seven_six = play(&six_all, &games(&[Side::A]));
        assert!(seven_six.completed_sets.is_empty());

        let eight_six = play(&seven_six, &games(&[Side::A]));
        assert_eq!(eight_six.completed_sets[0].games, PerSide::new(8, 6));
    }

    #[test]
    fn test_match_tiebreak_deciding_set() {
        let format = MatchFormat {
            final_set: FinalSet::MatchTiebreak { target: 10 },
            ..MatchFormat::default()
        };
        let start = MatchState::new(format);
        let (one_all, events) = replay_points(&start, &games(&[[Side::A; 6], [Side::B; 6]].concat())).unwrap();

        assert!(one_all.in_tiebreak());
        assert_eq!(points_of(&one_all), GamePoints::tiebreak(10));
        assert!(events
            .iter()
            .any(|e| matches!(e.data, ScoreEventData::TiebreakStarted { set_number: 3, target: 10 })));

        let outcome = replay_points(&one_all, &[Side::A; 10]).unwrap().0;
        assert!(outcome.completed);
        assert_eq!(outcome.winner, Some(Side::A));
        let decider = &outcome.completed_sets[2];
        assert_eq!(decider.games, PerSide::new(1, 0));
        assert_eq!(decider.tiebreak, Some(PerSide::new(10, 0)));
    }

    #[test]
    fn test_display_ends_follow_odd_sets() {
        use Side::{A, B};
        let start = MatchState::new(MatchFormat::default());
        let after = play(&start, &games(&[A, A, A, A, A, B, A]));

        assert_eq!(after.completed_sets[0].games, PerSide::new(6, 1));
        assert_eq!(after.completed_sets[0].left, Side::A);
        assert_eq!(after.current_set().unwrap().left, Side::B);
    }

    #[test]
    fn test_straight_sets_completion() {
        let start = MatchState::new(MatchFormat::default());
        let points = games(&[Side::A; 12]);
        let (done, events) = replay_points(&start, &points).unwrap();

        assert!(done.completed);
        assert_eq!(done.winner, Some(Side::A));
        assert!(done.current.is_none());
        assert_eq!(done.completed_sets.len(), 2);
        assert_eq!(done.points_played, 48);
        assert!(matches!(
            events.last().map(|e| &e.data),
            Some(ScoreEventData::MatchCompleted { winner: Side::A, .. })
        ));

        assert!(matches!(apply_point(&done, Side::B), Err(ScoreError::AlreadyCompleted)));
    }

    #[test]
    fn test_malformed_state_rejected() {
        let mut broken = MatchState::new(MatchFormat::default());
        broken.current = None;

        assert!(matches!(apply_point(&broken, Side::A), Err(ScoreError::MalformedState(_))));
    }

    #[test]
    fn test_unfinishable_format_fails_instead_of_panicking() {
        use Side::{A, B};
        let two_of_two = MatchFormat {
            sets_to_win: 2,
            total_sets: 2,
            ..MatchFormat::default()
        };
        let start = MatchState::new(two_of_two);

        let mut sets = games(&[A; 6]);
        sets.extend(games(&[B; 6]));
        sets.extend(games(&[A; 6]));
        assert!(matches!(replay_points(&start, &sets), Err(ScoreError::MalformedState(_))));
    }

    #[test]
    fn test_zero_match_tiebreak_target_rejected() {
        let format = MatchFormat {
            final_set: FinalSet::MatchTiebreak { target: 0 },
            ..MatchFormat::best_of(3)
        };
        let start = MatchState::new(format);

        assert!(matches!(apply_point(&start, Side::A), Err(ScoreError::MalformedState(_))));
        assert_eq!(start.points_played, 0);
    }
}
