//! Verification API
//!
//! Verify a recorded match by deterministic replay, and rebuild a match
//! from a transcript for import.

use tracing::{debug, warn};

use crate::core::hash::StateHash;
use crate::replay::transcript::{points_digest, MatchTranscript, TRANSCRIPT_VERSION};
use crate::score::events::ScoreEvent;
use crate::score::state::MatchState;
use crate::score::transition::apply_point;

/// Verification result.
#[derive(Debug)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Points replayed before stopping.
    pub points_replayed: u32,

    /// Final state hash (from replay).
    pub computed_final_hash: StateHash,

    /// Expected final hash (from transcript).
    pub expected_final_hash: StateHash,

    /// Checkpoint verification results.
    pub checkpoint_results: Vec<CheckpointResult>,

    /// Detailed error if verification failed.
    pub error: Option<VerificationError>,
}

/// Result of verifying a single checkpoint.
#[derive(Debug)]
pub struct CheckpointResult {
    /// Point number.
    pub point_number: u32,
    /// Expected hash from transcript.
    pub expected: StateHash,
    /// Computed hash from replay.
    pub computed: StateHash,
    /// Did this checkpoint match?
    pub valid: bool,
}

/// Errors that can occur during verification.
#[derive(Debug, Clone)]
pub enum VerificationError {
    /// Transcript version mismatch.
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },

    /// Starting snapshot could not be decoded.
    InvalidSnapshot(String),

    /// Initial state hash mismatch.
    InitialStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// A recorded point could not be applied.
    PointRejected {
        /// 1-based point number.
        point_number: u32,
        /// Engine error message.
        reason: String,
    },

    /// Checkpoint hash mismatch.
    CheckpointMismatch {
        /// Point where mismatch occurred.
        point_number: u32,
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Final state hash mismatch.
    FinalStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Point sequence does not match its recorded digest.
    PointsDigestMismatch,

    /// Recorded result disagrees with the replayed outcome.
    ResultMismatch,

    /// Transcript is incomplete.
    IncompleteTranscript,
}

fn short(hash: &StateHash) -> String {
    hex::encode(&hash[..4])
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionMismatch { expected, got } => {
                write!(f, "Version mismatch: expected {}, got {}", expected, got)
            }
            Self::InvalidSnapshot(msg) => write!(f, "Invalid starting snapshot: {}", msg),
            Self::InitialStateMismatch { expected, computed } => {
                write!(f, "Initial state hash mismatch: expected {}, computed {}", short(expected), short(computed))
            }
            Self::PointRejected { point_number, reason } => {
                write!(f, "Point {} rejected: {}", point_number, reason)
            }
            Self::CheckpointMismatch { point_number, expected, computed } => {
                write!(
                    f,
                    "Checkpoint mismatch at point {}: expected {}, computed {}",
                    point_number,
                    short(expected),
                    short(computed)
                )
            }
            Self::FinalStateMismatch { expected, computed } => {
                write!(f, "Final state hash mismatch: expected {}, computed {}", short(expected), short(computed))
            }
            Self::PointsDigestMismatch => write!(f, "Point sequence digest mismatch"),
            Self::ResultMismatch => write!(f, "Match result mismatch"),
            Self::IncompleteTranscript => write!(f, "Transcript is incomplete"),
        }
    }
}

impl std::error::Error for VerificationError {}

impl VerificationResult {
    fn failed(error: VerificationError, points_replayed: u32, checkpoint_results: Vec<CheckpointResult>) -> Self {
        let (expected_final_hash, computed_final_hash) = match &error {
            VerificationError::InitialStateMismatch { expected, computed }
            | VerificationError::CheckpointMismatch { expected, computed, .. }
            | VerificationError::FinalStateMismatch { expected, computed } => (*expected, *computed),
            _ => ([0; 32], [0; 32]),
        };
        warn!(points_replayed, "transcript verification failed: {}", error);

        Self {
            valid: false,
            points_replayed,
            computed_final_hash,
            expected_final_hash,
            checkpoint_results,
            error: Some(error),
        }
    }
}

/// Replay a transcript's points from its starting snapshot.
///
/// Works on incomplete transcripts too; this is how a recorded match is
/// imported. Checkpoints are not consulted.
pub fn replay_transcript(
    transcript: &MatchTranscript,
) -> Result<(MatchState, Vec<ScoreEvent>), VerificationError> {
    let mut state = transcript
        .initial_state()
        .map_err(|e| VerificationError::InvalidSnapshot(e.to_string()))?;
    let mut events = Vec::new();

    for (index, &side) in transcript.points.iter().enumerate() {
        let outcome = apply_point(&state, side).map_err(|e| VerificationError::PointRejected {
            point_number: index as u32 + 1,
            reason: e.to_string(),
        })?;
        state = outcome.state;
        events.extend(outcome.events);
    }

    Ok((state, events))
}

/// Verify a match transcript by full replay.
///
/// Replays every point and compares state hashes at each checkpoint and at
/// the end.
pub fn verify_transcript(transcript: &MatchTranscript) -> VerificationResult {
    if transcript.version != TRANSCRIPT_VERSION {
        return VerificationResult::failed(
            VerificationError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: transcript.version,
            },
            0,
            vec![],
        );
    }

    // Check transcript is complete
    let result = match &transcript.result {
        Some(r) => r,
        None => return VerificationResult::failed(VerificationError::IncompleteTranscript, 0, vec![]),
    };

    // 1. Reconstruct and check the starting snapshot
    let mut state = match transcript.initial_state() {
        Ok(state) => state,
        Err(e) => {
            return VerificationResult::failed(VerificationError::InvalidSnapshot(e.to_string()), 0, vec![])
        }
    };
    let initial_hash = state.compute_hash();
    if initial_hash != transcript.initial.state_hash {
        return VerificationResult::failed(
            VerificationError::InitialStateMismatch {
                expected: transcript.initial.state_hash,
                computed: initial_hash,
            },
            0,
            vec![],
        );
    }

    // 2. Point sequence integrity
    if points_digest(&transcript.points) != result.points_digest {
        return VerificationResult::failed(VerificationError::PointsDigestMismatch, 0, vec![]);
    }

    // 3. Replay point by point with checkpoint verification
    let mut checkpoint_results = Vec::new();
    let mut checkpoints = transcript.checkpoints.iter().peekable();

    for (index, &side) in transcript.points.iter().enumerate() {
        let point_number = index as u32 + 1;
        state = match apply_point(&state, side) {
            Ok(outcome) => outcome.state,
            Err(e) => {
                return VerificationResult::failed(
                    VerificationError::PointRejected {
                        point_number,
                        reason: e.to_string(),
                    },
                    index as u32,
                    checkpoint_results,
                )
            }
        };

        while let Some(checkpoint) = checkpoints.next_if(|c| c.point_number == point_number) {
            let computed = state.compute_hash();
            let valid = computed == checkpoint.state_hash;

            checkpoint_results.push(CheckpointResult {
                point_number,
                expected: checkpoint.state_hash,
                computed,
                valid,
            });

            if !valid {
                return VerificationResult::failed(
                    VerificationError::CheckpointMismatch {
                        point_number,
                        expected: checkpoint.state_hash,
                        computed,
                    },
                    point_number,
                    checkpoint_results,
                );
            }
        }
    }

    let points_replayed = transcript.points.len() as u32;

    // 4. Verify final state
    let final_hash = state.compute_hash();
    if final_hash != result.final_state_hash {
        return VerificationResult::failed(
            VerificationError::FinalStateMismatch {
                expected: result.final_state_hash,
                computed: final_hash,
            },
            points_replayed,
            checkpoint_results,
        );
    }

    if state.winner != Some(result.winner)
        || state.sets_won_pair() != result.sets
        || state.points_played != result.points_played
    {
        return VerificationResult::failed(VerificationError::ResultMismatch, points_replayed, checkpoint_results);
    }

    debug!(points_replayed, checkpoints = checkpoint_results.len(), "transcript verified");

    VerificationResult {
        valid: true,
        points_replayed,
        computed_final_hash: final_hash,
        expected_final_hash: result.final_state_hash,
        checkpoint_results,
        error: None,
    }
}
