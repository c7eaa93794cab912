//! Match Transcript Recording
//!
//! Records everything needed to re-derive a match: the starting snapshot and
//! the ordered point winners, plus periodic state hashes so a replay can
//! pinpoint where it diverged. Serialized compactly with bincode.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::score::error::ScoreError;
use crate::score::state::{MatchState, PerSide, Side};

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Default checkpoint interval in points.
pub const CHECKPOINT_INTERVAL: u32 = 24;

/// Point-by-point match transcript.
///
/// The starting snapshot is kept as JSON text: bincode cannot carry the
/// tagged game tally directly, and JSON is the snapshot's canonical form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchTranscript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Match metadata.
    pub metadata: MatchMetadata,

    /// Starting snapshot.
    pub initial: InitialSnapshot,

    /// Point winners in order.
    pub points: Vec<Side>,

    /// State hash checkpoints (every `checkpoint_interval` points).
    pub checkpoints: Vec<StateCheckpoint>,

    /// Final match result, once completed.
    pub result: Option<MatchResult>,
}

/// Match metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Unique match identifier (UUID bytes).
    pub match_id: [u8; 16],

    /// When recording started.
    pub started_at: DateTime<Utc>,

    /// Points between checkpoints (0 disables checkpoints).
    pub checkpoint_interval: u32,
}

/// Snapshot the transcript starts from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialSnapshot {
    /// Snapshot as JSON.
    pub snapshot: String,

    /// Hash of the snapshot.
    pub state_hash: StateHash,
}

/// State checkpoint for partial verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    /// Points played at the checkpoint.
    pub point_number: u32,

    /// State hash after that point.
    pub state_hash: StateHash,
}

/// Final match outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Match winner.
    pub winner: Side,

    /// Final set tally.
    pub sets: PerSide<u32>,

    /// Total points played.
    pub points_played: u32,

    /// Final state hash.
    pub final_state_hash: StateHash,

    /// Digest of the point sequence.
    pub points_digest: StateHash,
}

/// Digest of a point sequence.
pub fn points_digest(points: &[Side]) -> StateHash {
    let mut hasher = StateHasher::for_point_log();
    hasher.update_u32(points.len() as u32);
    for side in points {
        hasher.update_u8(*side as u8);
    }
    hasher.finalize()
}

impl MatchTranscript {
    /// Start a transcript from a snapshot.
    pub fn new(metadata: MatchMetadata, initial: &MatchState) -> Result<Self, TranscriptError> {
        Ok(Self {
            version: TRANSCRIPT_VERSION,
            metadata,
            initial: InitialSnapshot {
                snapshot: initial.to_json()?,
                state_hash: initial.compute_hash(),
            },
            points: Vec::new(),
            checkpoints: Vec::new(),
            result: None,
        })
    }

    /// Record a point and the snapshot it produced.
    ///
    /// Adds a checkpoint on interval boundaries and finalizes the transcript
    /// when the snapshot is completed.
    pub fn record_point(&mut self, side: Side, after: &MatchState) {
        self.points.push(side);

        let point_number = self.points.len() as u32;
        let interval = self.metadata.checkpoint_interval;
        if interval > 0 && point_number % interval == 0 {
            self.add_checkpoint(point_number, after.compute_hash());
        }

        if after.completed {
            self.finalize(after);
        }
    }

    /// Record a state checkpoint.
    pub fn add_checkpoint(&mut self, point_number: u32, state_hash: StateHash) {
        self.checkpoints.push(StateCheckpoint {
            point_number,
            state_hash,
        });
    }

    /// Finalize with the completed snapshot. Ignored while the match is open.
    pub fn finalize(&mut self, final_state: &MatchState) {
        let Some(winner) = final_state.winner else {
            return;
        };
        self.result = Some(MatchResult {
            winner,
            sets: final_state.sets_won_pair(),
            points_played: self.points.len() as u32,
            final_state_hash: final_state.compute_hash(),
            points_digest: points_digest(&self.points),
        });
    }

    /// Drop every point after the first `len`, with their checkpoints and
    /// any result.
    pub fn truncate(&mut self, len: usize) {
        self.points.truncate(len);
        self.checkpoints.retain(|c| c.point_number as usize <= len);
        self.result = None;
    }

    /// Check if transcript is complete.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Decode the starting snapshot.
    pub fn initial_state(&self) -> Result<MatchState, TranscriptError> {
        Ok(MatchState::from_json(&self.initial.snapshot)?)
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes, rejecting other versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: Self = bincode::deserialize(data)?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: transcript.version,
            });
        }
        Ok(transcript)
    }
}

/// Errors that can occur with transcripts.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    /// Binary encoding failed.
    #[error("transcript encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    /// Starting snapshot could not be encoded or decoded.
    #[error("transcript snapshot: {0}")]
    Snapshot(#[from] ScoreError),

    /// Version mismatch.
    #[error("transcript version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version.
        expected: u8,
        /// Version found.
        got: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::format::MatchFormat;
    use crate::score::transition::apply_point;

    fn create_test_metadata(checkpoint_interval: u32) -> MatchMetadata {
        MatchMetadata {
            match_id: [1; 16],
            started_at: Utc::now(),
            checkpoint_interval,
        }
    }

    fn record(transcript: &mut MatchTranscript, state: &mut MatchState, points: &[Side]) {
        for &side in points {
            *state = apply_point(state, side).unwrap().state;
            transcript.record_point(side, state);
        }
    }

    #[test]
    fn test_transcript_creation() {
        let state = MatchState::new(MatchFormat::default());
        let transcript = MatchTranscript::new(create_test_metadata(4), &state).unwrap();

        assert_eq!(transcript.version, TRANSCRIPT_VERSION);
        assert_eq!(transcript.initial.state_hash, state.compute_hash());
        assert_eq!(transcript.initial_state().unwrap(), state);
        assert!(!transcript.is_complete());
    }

    #[test]
    fn test_checkpoints_on_interval() {
        let mut state = MatchState::new(MatchFormat::default());
        let mut transcript = MatchTranscript::new(create_test_metadata(4), &state).unwrap();
        record(&mut transcript, &mut state, &[Side::A; 10]);

        let numbers: Vec<u32> = transcript.checkpoints.iter().map(|c| c.point_number).collect();
        assert_eq!(numbers, vec![4, 8]);
        assert_eq!(transcript.checkpoints[1].state_hash, {
            let mut replayed = MatchState::new(MatchFormat::default());
            for _ in 0..8 {
                replayed = apply_point(&replayed, Side::A).unwrap().state;
            }
            replayed.compute_hash()
        });
    }

    #[test]
    fn test_finalize_on_completion() {
        let mut state = MatchState::new(MatchFormat::best_of(1));
        let mut transcript = MatchTranscript::new(create_test_metadata(0), &state).unwrap();
        record(&mut transcript, &mut state, &[Side::B; 24]);

        let result = transcript.result.as_ref().unwrap();
        assert_eq!(result.winner, Side::B);
        assert_eq!(result.points_played, 24);
        assert_eq!(result.final_state_hash, state.compute_hash());
        assert_eq!(result.points_digest, points_digest(&transcript.points));
        assert!(transcript.checkpoints.is_empty());
    }

    #[test]
    fn test_truncate() {
        let mut state = MatchState::new(MatchFormat::best_of(1));
        let mut transcript = MatchTranscript::new(create_test_metadata(4), &state).unwrap();
        record(&mut transcript, &mut state, &[Side::A; 24]);
        assert!(transcript.is_complete());

        transcript.truncate(23);
        assert_eq!(transcript.points.len(), 23);
        assert_eq!(transcript.checkpoints.last().map(|c| c.point_number), Some(20));
        assert!(!transcript.is_complete());
    }

    #[test]
    fn test_transcript_serialization_roundtrip() {
        let mut state = MatchState::new(MatchFormat::default());
        let mut transcript = MatchTranscript::new(create_test_metadata(2), &state).unwrap();
        record(&mut transcript, &mut state, &[Side::A, Side::B, Side::B]);

        let bytes = transcript.to_bytes().unwrap();
        let decoded = MatchTranscript::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.metadata, transcript.metadata);
        assert_eq!(decoded.points, transcript.points);
        assert_eq!(decoded.checkpoints, transcript.checkpoints);
        assert_eq!(decoded.initial, transcript.initial);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let state = MatchState::new(MatchFormat::default());
        let mut transcript = MatchTranscript::new(create_test_metadata(2), &state).unwrap();
        transcript.version = 9;
        let bytes = transcript.to_bytes().unwrap();

        assert!(matches!(
            MatchTranscript::from_bytes(&bytes),
            Err(TranscriptError::VersionMismatch { expected: 1, got: 9 })
        ));
    }

    #[test]
    fn test_points_digest_order_sensitive() {
        assert_ne!(points_digest(&[Side::A, Side::B]), points_digest(&[Side::B, Side::A]));
        assert_ne!(points_digest(&[]), points_digest(&[Side::A]));
    }
}
