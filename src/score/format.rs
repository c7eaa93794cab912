//! Match Format
//!
//! [`MatchFormat`] is fixed at match creation. Partial configuration coming
//! from settings documents is folded into it by [`resolve_format`], the one
//! place where set-count precedence lives.
//!
//! ## Set-count precedence
//!
//! 1. The first layer with an explicit `sets_to_win` wins.
//! 2. Otherwise the first layer with `total_sets` gives
//!    `sets_to_win = ceil(total_sets / 2)`.
//! 3. Otherwise the format falls back to best of three.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::score::serve::ServeRules;
use crate::score::state::{PerSide, Side};

/// Default number of sets when nothing is configured.
pub const DEFAULT_TOTAL_SETS: u32 = 3;

/// Default games needed to win a set.
pub const DEFAULT_GAMES_PER_SET: u32 = 6;

/// Default set tiebreak target.
pub const DEFAULT_TIEBREAK_TARGET: u32 = 7;

/// Default match tiebreak target.
pub const DEFAULT_MATCH_TIEBREAK_TARGET: u32 = 10;

/// Largest set count accepted from settings; larger values are clamped.
pub const MAX_SETS_TO_WIN: u32 = 99;

/// Racket sport being scored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    /// Tennis
    #[default]
    Tennis,
    /// Padel
    Padel,
}

/// How the deciding set is played.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSet {
    /// Same rules as every other set.
    #[default]
    Standard,
    /// No tiebreak; play on until a two-game lead.
    Advantage,
    /// Single tiebreak game instead of a full set.
    MatchTiebreak {
        /// Points needed to win (with a two-point lead)
        target: u32,
    },
}

// =============================================================================
// MATCH FORMAT
// =============================================================================

/// Immutable match configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchFormat {
    /// Sport being played
    pub sport: Sport,
    /// Sets needed to win the match
    pub sets_to_win: u32,
    /// Maximum sets in the format
    pub total_sets: u32,
    /// Games needed to win a set
    pub games_per_set: u32,
    /// Games-each tally that starts a tiebreak (`None` = advantage sets)
    pub tiebreak_at: Option<u32>,
    /// Points needed to win a set tiebreak
    pub tiebreak_target: u32,
    /// Deciding-set variant
    pub final_set: FinalSet,
    /// Serve rotation
    pub serve: ServeRules,
}

impl Default for MatchFormat {
    fn default() -> Self {
        Self {
            sport: Sport::Tennis,
            sets_to_win: 2,
            total_sets: DEFAULT_TOTAL_SETS,
            games_per_set: DEFAULT_GAMES_PER_SET,
            tiebreak_at: Some(DEFAULT_GAMES_PER_SET),
            tiebreak_target: DEFAULT_TIEBREAK_TARGET,
            final_set: FinalSet::Standard,
            serve: ServeRules::singles(),
        }
    }
}

impl MatchFormat {
    /// Best-of-`total_sets` format with default set rules.
    pub fn best_of(total_sets: u32) -> Self {
        let total_sets = total_sets.max(1);
        Self {
            sets_to_win: total_sets.div_ceil(2),
            total_sets,
            ..Self::default()
        }
    }

    /// Padel: best of three, doubles rotation.
    pub fn padel() -> Self {
        Self {
            sport: Sport::Padel,
            serve: ServeRules::doubles(),
            ..Self::default()
        }
    }

    /// Is the set about to be played with these set tallies the deciding set?
    pub fn is_deciding_set(&self, sets_won: &PerSide<u32>) -> bool {
        let needed = self.sets_to_win.saturating_sub(1);
        sets_won.a == needed && sets_won.b == needed
    }

    /// Rules of the set played with the given set tallies.
    pub fn set_rules(&self, sets_won: &PerSide<u32>) -> SetRules {
        let regular = SetRules {
            games: self.games_per_set,
            tiebreak_at: self.tiebreak_at,
            tiebreak_target: self.tiebreak_target,
            match_tiebreak: None,
        };

        if !self.is_deciding_set(sets_won) {
            return regular;
        }

        match self.final_set {
            FinalSet::Standard => regular,
            FinalSet::Advantage => SetRules {
                tiebreak_at: None,
                ..regular
            },
            FinalSet::MatchTiebreak { target } => SetRules {
                match_tiebreak: Some(target),
                ..regular
            },
        }
    }
}

// =============================================================================
// SET RULES
// =============================================================================

/// Closure rules of a single set, derived from the format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetRules {
    /// Games needed to win
    pub games: u32,
    /// Games-each tally that starts a tiebreak
    pub tiebreak_at: Option<u32>,
    /// Tiebreak target
    pub tiebreak_target: u32,
    /// Set is a single match tiebreak to this target
    pub match_tiebreak: Option<u32>,
}

impl SetRules {
    /// Winner of a set with this game tally, if the tally closes it.
    pub fn set_winner(&self, games: &PerSide<u32>) -> Option<Side> {
        Side::BOTH.into_iter().find(|&side| {
            let mine = games.get(side);
            let theirs = games.get(side.opponent());

            if self.match_tiebreak.is_some() {
                return mine >= 1;
            }
            if mine >= self.games && mine >= theirs.saturating_add(2) {
                return true;
            }
            matches!(self.tiebreak_at, Some(at) if mine.checked_sub(1) == Some(at) && theirs == at)
        })
    }

    /// Does this tally start a tiebreak as the next game?
    pub fn starts_tiebreak(&self, games: &PerSide<u32>) -> bool {
        self.match_tiebreak.is_none()
            && matches!(self.tiebreak_at, Some(at) if games.a == at && games.b == at)
    }
}

// =============================================================================
// FORMAT RESOLUTION
// =============================================================================

/// Partial format configuration as found in settings documents.
///
/// Every field is optional; [`resolve_format`] merges layers of these.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSettings {
    /// Sets needed to win
    #[serde(alias = "setsToWin")]
    pub sets_to_win: Option<u32>,
    /// Total sets ("best of")
    #[serde(alias = "totalSets", alias = "best_of", alias = "bestOf")]
    pub total_sets: Option<u32>,
    /// Games needed to win a set
    #[serde(alias = "gamesPerSet")]
    pub games_per_set: Option<u32>,
    /// Games-each tally that starts a tiebreak
    #[serde(alias = "tiebreakAt")]
    pub tiebreak_at: Option<u32>,
    /// Disable set tiebreaks (advantage sets)
    #[serde(alias = "noTiebreak")]
    pub no_tiebreak: Option<bool>,
    /// Set tiebreak target
    #[serde(alias = "tiebreakTarget")]
    pub tiebreak_target: Option<u32>,
    /// Deciding-set variant
    #[serde(alias = "finalSet")]
    pub final_set: Option<FinalSet>,
    /// Sport
    pub sport: Option<Sport>,
    /// Force doubles serve rotation on or off
    pub doubles: Option<bool>,
}

/// Where the resolved set count came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatSource {
    /// An explicit `sets_to_win`
    Explicit,
    /// Derived from `total_sets`
    Derived,
    /// Nothing usable was configured; best of three
    Default,
}

/// Result of format resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedFormat {
    /// The resolved format
    pub format: MatchFormat,
    /// Origin of the set count
    pub source: FormatSource,
}

fn first<T>(layers: &[FormatSettings], field: impl Fn(&FormatSettings) -> Option<T>) -> Option<T> {
    layers.iter().find_map(field)
}

/// Resolve a format from settings layers, highest priority first.
///
/// Zero counts are treated as absent and set counts above
/// [`MAX_SETS_TO_WIN`] are clamped. Never fails: with no set-count
/// information anywhere the format is best of three.
pub fn resolve_format(layers: &[FormatSettings]) -> ResolvedFormat {
    let max_total_sets = 2 * MAX_SETS_TO_WIN - 1;
    let sets_to_win = first(layers, |l| l.sets_to_win.filter(|n| *n > 0))
        .map(|n| n.min(MAX_SETS_TO_WIN));
    let total_sets = first(layers, |l| l.total_sets.filter(|n| *n > 0))
        .map(|n| n.min(max_total_sets));

    let (sets_to_win, total_sets, source) = match (sets_to_win, total_sets) {
        (Some(win), Some(total)) => (win, total.max(2 * win - 1), FormatSource::Explicit),
        (Some(win), None) => (win, 2 * win - 1, FormatSource::Explicit),
        (None, Some(total)) => (total.div_ceil(2), total, FormatSource::Derived),
        (None, None) => {
            debug!("no set count configured, falling back to best of {}", DEFAULT_TOTAL_SETS);
            (DEFAULT_TOTAL_SETS.div_ceil(2), DEFAULT_TOTAL_SETS, FormatSource::Default)
        }
    };

    let games_per_set = first(layers, |l| l.games_per_set.filter(|n| *n > 0))
        .unwrap_or(DEFAULT_GAMES_PER_SET);

    let tiebreak_at = first(layers, |l| match (l.no_tiebreak, l.tiebreak_at) {
        (Some(true), _) => Some(None),
        (_, Some(at)) => Some(Some(at)),
        _ => None,
    })
    .unwrap_or(Some(games_per_set));

    let tiebreak_target = first(layers, |l| l.tiebreak_target.filter(|n| *n > 0))
        .unwrap_or(DEFAULT_TIEBREAK_TARGET);

    let sport = first(layers, |l| l.sport).unwrap_or_default();
    let final_set = match first(layers, |l| l.final_set).unwrap_or_default() {
        FinalSet::MatchTiebreak { target: 0 } => FinalSet::MatchTiebreak {
            target: DEFAULT_MATCH_TIEBREAK_TARGET,
        },
        final_set => final_set,
    };
    let serve = ServeRules::for_sport(sport, first(layers, |l| l.doubles));

    ResolvedFormat {
        format: MatchFormat {
            sport,
            sets_to_win,
            total_sets,
            games_per_set,
            tiebreak_at,
            tiebreak_target,
            final_set,
            serve,
        },
        source,
    }
}

/// Total sets from settings layers.
pub fn total_sets(layers: &[FormatSettings]) -> u32 {
    resolve_format(layers).format.total_sets
}

/// Sets to win from settings layers.
pub fn sets_to_win(layers: &[FormatSettings]) -> u32 {
    resolve_format(layers).format.sets_to_win
}
