//! # Courtside Score Engine
//!
//! Tennis and padel scoring: point application, game/set/match point
//! signals, and the live-match plumbing around them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     COURTSIDE SCORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  └── hash.rs      - Snapshot hashing for verification        │
//! │                                                              │
//! │  score/           - Scoring rules (pure, synchronous)        │
//! │  ├── point.rs     - Point markers and game tallies           │
//! │  ├── format.rs    - Match format and settings resolution     │
//! │  ├── serve.rs     - Serve rotation strategies                │
//! │  ├── state.rs     - Match snapshot                           │
//! │  ├── transition.rs- Point application                        │
//! │  ├── signals.rs   - Game/set/match point derivation          │
//! │  └── events.rs    - Score events                             │
//! │                                                              │
//! │  feed/            - Live matches (async)                     │
//! │  ├── protocol.rs  - Commands, updates, overlay record        │
//! │  └── session.rs   - Match sessions and court registry        │
//! │                                                              │
//! │  replay/          - Transcripts                              │
//! │  ├── transcript.rs- Point log with hash checkpoints          │
//! │  └── verify.rs    - Replay and verification                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Re-derivation
//!
//! Signals are never stored. Every game, set or match point indicator is
//! recomputed from the current snapshot, so it cannot drift from the score.
//! Snapshots only change through [`score::transition::apply_point`], which
//! returns a new value and leaves the input untouched.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod score;
pub mod feed;
pub mod replay;

// Re-export commonly used types
pub use core::hash::StateHash;
pub use score::{
    apply_point, apply_point_with, replay_points, resolve_format,
    FormatSettings, ImportantPoint, MatchFormat, MatchState, PointOutcome, ScoreError, Side, Signals,
};
pub use feed::{OverlayRecord, SessionConfig, SessionManager};
pub use replay::{verify_transcript, MatchTranscript};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
