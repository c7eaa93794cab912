//! Whole-match scenarios driven through the public API.

use courtside::score::signals::{self, ImportantPoint};
use courtside::score::{
    apply_point, resolve_format, FinalSet, FormatSettings, FormatSource, GamePoints, MatchFormat,
    MatchState, PerSide, PointMarker, ScoreError, Side, Signals,
};
use courtside::OverlayRecord;

fn play(state: &MatchState, points: &[Side]) -> MatchState {
    points.iter().fold(state.clone(), |state, &side| {
        apply_point(&state, side).unwrap().state
    })
}

fn win_games(state: &MatchState, side: Side, games: usize) -> MatchState {
    play(state, &vec![side; games * 4])
}

/// Alternating love games, A first.
fn alternate_games(state: &MatchState, games: usize) -> MatchState {
    (0..games).fold(state.clone(), |state, game| {
        let side = if game % 2 == 0 { Side::A } else { Side::B };
        win_games(&state, side, 1)
    })
}

#[test]
fn test_straight_sets_whitewash() {
    let start = MatchState::new(MatchFormat::best_of(3));
    let state = play(&start, &[Side::A; 48]);

    assert!(state.completed);
    assert_eq!(state.winner, Some(Side::A));
    assert_eq!(signals::current_set_number(&state), 2);
    assert_eq!(state.sets_won_pair(), PerSide::new(2, 0));
    assert!(state.completed_sets.iter().all(|set| set.games == PerSide::new(6, 0)));

    // Completed matches reject further points and keep the snapshot
    assert!(matches!(apply_point(&state, Side::B), Err(ScoreError::AlreadyCompleted)));
    assert_eq!(signals::important_point(&state), None);
}

#[test]
fn test_game_from_forty_thirty() {
    let start = MatchState::new(MatchFormat::default());
    let state = play(&start, &[Side::A, Side::A, Side::A, Side::B, Side::B]);

    assert_eq!(
        state.current_game().unwrap().points,
        GamePoints::Standard {
            a: PointMarker::Forty,
            b: PointMarker::Thirty,
        }
    );
    assert_eq!(signals::is_game_point(&state), Some(Side::A));

    let outcome = apply_point(&state, Side::A).unwrap();
    let set = outcome.state.current_set().unwrap();
    assert_eq!(set.games, PerSide::new(1, 0));
    assert_eq!(set.game.points, GamePoints::standard());
}

#[test]
fn test_match_point_in_tiebreak() {
    let start = MatchState::new(MatchFormat::best_of(3));
    let state = win_games(&start, Side::A, 6);
    let state = alternate_games(&state, 12);
    assert!(state.in_tiebreak());

    let mut rally = Vec::new();
    for _ in 0..5 {
        rally.extend([Side::A, Side::B]);
    }
    rally.push(Side::A);
    let state = play(&state, &rally);

    let signals = Signals::derive(&state);
    assert_eq!(signals.game_point, Some(Side::A));
    assert_eq!(signals.set_point, Some(Side::A));
    assert_eq!(signals.match_point, Some(Side::A));
    assert_eq!(signals.important_point, Some(ImportantPoint::MatchPoint(Side::A)));
    assert_eq!(signals.important_point.unwrap().label(), "MATCH POINT");
    assert!(signals.tiebreak);

    let overlay = OverlayRecord::build(&state, &PerSide::new("Ana".to_string(), "Bea".to_string()));
    assert_eq!(overlay.points_a, "6");
    assert_eq!(overlay.points_b, "5");

    let outcome = apply_point(&state, Side::A).unwrap();
    assert!(outcome.match_completed);
    assert_eq!(outcome.winner, Some(Side::A));
    assert_eq!(outcome.state.completed_sets[1].tiebreak, Some(PerSide::new(7, 5)));
    assert_eq!(outcome.state.completed_sets[1].games, PerSide::new(7, 6));
}

#[test]
fn test_unconfigured_format_is_best_of_three() {
    let resolved = resolve_format(&[FormatSettings::default()]);

    assert_eq!(resolved.format.total_sets, 3);
    assert_eq!(resolved.format.sets_to_win, 2);
    assert_eq!(resolved.source, FormatSource::Default);
    assert_eq!(resolve_format(&[]).source, FormatSource::Default);
}

#[test]
fn test_advantage_final_set_has_no_tiebreak() {
    let format = MatchFormat {
        final_set: FinalSet::Advantage,
        ..MatchFormat::best_of(3)
    };
    let start = MatchState::new(format);
    let state = win_games(&start, Side::A, 6);
    let state = win_games(&state, Side::B, 6);
    let state = alternate_games(&state, 12);

    assert!(!state.in_tiebreak());
    assert_eq!(state.current_set().unwrap().games, PerSide::new(6, 6));

    // A one-game lead is not enough
    let state = win_games(&state, Side::A, 1);
    assert!(!state.completed);
    assert_eq!(signals::is_set_point(&state), None);

    let state = win_games(&state, Side::B, 1);
    let state = win_games(&state, Side::A, 1);
    assert!(!state.completed);

    let state = win_games(&state, Side::A, 1);
    assert!(state.completed);
    assert_eq!(state.completed_sets[2].games, PerSide::new(9, 7));
    assert_eq!(state.completed_sets[2].tiebreak, None);
}

#[test]
fn test_match_tiebreak_decider() {
    let format = MatchFormat {
        final_set: FinalSet::MatchTiebreak { target: 10 },
        ..MatchFormat::best_of(3)
    };
    let start = MatchState::new(format);
    let state = win_games(&start, Side::A, 6);
    let state = win_games(&state, Side::B, 6);

    assert!(state.in_tiebreak());
    assert_eq!(
        state.current_game().unwrap().points.tiebreak_target(),
        Some(10)
    );
    assert_eq!(signals::current_set_number(&state), 3);

    // 9-9 needs a two-point lead
    let mut rally = Vec::new();
    for _ in 0..9 {
        rally.extend([Side::B, Side::A]);
    }
    let state = play(&state, &rally);
    assert_eq!(signals::important_point(&state), Some(ImportantPoint::TiebreakInProgress));

    let state = play(&state, &[Side::B]);
    assert_eq!(signals::is_match_point(&state), Some(Side::B));

    let state = play(&state, &[Side::B]);
    assert!(state.completed);
    assert_eq!(state.winner, Some(Side::B));
    let decider = &state.completed_sets[2];
    assert_eq!(decider.games, PerSide::new(0, 1));
    assert_eq!(decider.tiebreak, Some(PerSide::new(9, 11)));
}

#[test]
fn test_padel_doubles_serve_order() {
    let start = MatchState::new(MatchFormat::padel());
    let mut order = vec![(start.serve.side, start.serve.slot())];

    let mut state = start;
    for _ in 0..4 {
        state = win_games(&state, Side::A, 1);
        order.push((state.serve.side, state.serve.slot()));
    }

    assert_eq!(
        order,
        vec![(Side::A, 0), (Side::B, 0), (Side::A, 1), (Side::B, 1), (Side::A, 0)]
    );
}

#[test]
fn test_snapshot_survives_json_mid_game() {
    let start = MatchState::new(MatchFormat::padel());
    let state = play(&start, &[Side::B, Side::A, Side::B]);

    let restored = MatchState::from_json(&state.to_json().unwrap()).unwrap();
    assert_eq!(restored, state);
    assert_eq!(restored.compute_hash(), state.compute_hash());
    assert_eq!(Signals::derive(&restored), Signals::derive(&state));
}
