//! Replay Module
//!
//! Point-by-point transcripts and their verification by replay.

pub mod transcript;
pub mod verify;

pub use transcript::{MatchTranscript, MatchMetadata, MatchResult, TranscriptError, TRANSCRIPT_VERSION};
pub use verify::{verify_transcript, replay_transcript, VerificationResult, VerificationError};
