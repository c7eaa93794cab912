//! Match Session Management
//!
//! Live matches held in memory, keyed by match id and optionally by court.
//! Each match sits behind its own lock so point application is serialized
//! per match while reads of other matches proceed freely.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::feed::protocol::{
    ApiError, ErrorCode, FeedMessage, OverlayRecord, ScoreCommand, ScoreUpdate, TeamNames,
};
use crate::replay::transcript::{MatchMetadata, MatchTranscript, TranscriptError, CHECKPOINT_INTERVAL};
use crate::score::error::ScoreError;
use crate::score::events::ScoreEvent;
use crate::score::format::MatchFormat;
use crate::score::signals::Signals;
use crate::score::state::{MatchState, Side};
use crate::score::transition::{apply_point, replay_points, PointOutcome};

/// Unique match identifier.
pub type MatchId = Uuid;

/// Configuration for match sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of each match's update channel.
    pub event_capacity: usize,
    /// Points between transcript checkpoints.
    pub checkpoint_interval: u32,
    /// Record a transcript for every match.
    pub record_transcripts: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            checkpoint_interval: CHECKPOINT_INTERVAL,
            record_transcripts: true,
        }
    }
}

/// A live match.
pub struct MatchSession {
    /// Unique match identifier.
    pub id: MatchId,
    /// Court the match is displayed on, if assigned.
    pub court: Option<u32>,
    /// Display names.
    pub teams: TeamNames,
    /// Snapshot the point log starts from.
    initial: MatchState,
    /// Current snapshot.
    state: MatchState,
    /// Point winners applied since `initial`.
    points: Vec<Side>,
    /// Transcript (if recording).
    transcript: Option<MatchTranscript>,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// Update broadcast channel.
    event_tx: broadcast::Sender<FeedMessage>,
}

impl MatchSession {
    /// Create a session for a fresh match.
    pub fn new(
        id: MatchId,
        format: MatchFormat,
        teams: TeamNames,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        Self::from_snapshot(id, MatchState::new(format), teams, config)
    }

    /// Create a session resuming from a stored snapshot.
    pub fn from_snapshot(
        id: MatchId,
        state: MatchState,
        teams: TeamNames,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        state.validate()?;

        let created_at = Utc::now();
        let transcript = if config.record_transcripts {
            let metadata = MatchMetadata {
                match_id: id.into_bytes(),
                started_at: created_at,
                checkpoint_interval: config.checkpoint_interval,
            };
            Some(MatchTranscript::new(metadata, &state)?)
        } else {
            None
        };

        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));

        Ok(Self {
            id,
            court: None,
            teams,
            initial: state.clone(),
            state,
            points: Vec::new(),
            transcript,
            created_at,
            event_tx,
        })
    }

    /// Current snapshot.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Points applied since the session started.
    pub fn points(&self) -> &[Side] {
        &self.points
    }

    /// Transcript, if recording.
    pub fn transcript(&self) -> Option<&MatchTranscript> {
        self.transcript.as_ref()
    }

    /// When the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Derived signals of the current snapshot.
    pub fn signals(&self) -> Signals {
        Signals::derive(&self.state)
    }

    /// Overlay record of the current snapshot.
    pub fn overlay(&self) -> OverlayRecord {
        OverlayRecord::build(&self.state, &self.teams)
    }

    /// Subscribe to score updates.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedMessage> {
        self.event_tx.subscribe()
    }

    /// Apply a point. On error the session is left unchanged.
    pub fn apply_point(&mut self, side: Side) -> Result<PointOutcome, SessionError> {
        let outcome = apply_point(&self.state, side)?;

        self.points.push(side);
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.record_point(side, &outcome.state);
        }
        self.state = outcome.state.clone();

        if outcome.match_completed {
            info!(match_id = %self.id, points = self.points.len(), "match completed");
        }
        self.publish(outcome.events.clone());

        Ok(outcome)
    }

    /// Remove the last point by replaying every earlier one from the
    /// starting snapshot.
    pub fn undo(&mut self) -> Result<&MatchState, SessionError> {
        let Some((_, earlier)) = self.points.split_last() else {
            return Err(SessionError::NothingToUndo);
        };
        let (state, _) = replay_points(&self.initial, earlier)?;

        self.points.pop();
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.truncate(self.points.len());
        }
        self.state = state;

        debug!(match_id = %self.id, points = self.points.len(), "point undone");
        self.publish(Vec::new());

        Ok(&self.state)
    }

    /// Execute a client command.
    pub fn handle_command(&mut self, command: ScoreCommand) -> Result<(), SessionError> {
        let result = match command {
            ScoreCommand::Point { side } => self.apply_point(side).map(|_| ()),
            ScoreCommand::Undo => self.undo().map(|_| ()),
        };

        if let Err(err) = &result {
            let _ = self.event_tx.send(FeedMessage::Error(ApiError::from(err)));
        }
        result
    }

    fn publish(&self, events: Vec<ScoreEvent>) {
        let update = ScoreUpdate {
            match_id: self.id.to_string(),
            points_played: self.state.points_played,
            events,
            overlay: self.overlay(),
        };
        // No subscribers is fine
        let _ = self.event_tx.send(FeedMessage::Update(update));
    }
}

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown match id.
    #[error("match not found")]
    MatchNotFound,

    /// No match assigned to the court.
    #[error("no match on court {0}")]
    CourtNotFound(u32),

    /// Court already shows another match.
    #[error("court {0} is already assigned")]
    CourtOccupied(u32),

    /// No point to undo.
    #[error("nothing to undo")]
    NothingToUndo,

    /// Scoring error.
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// Transcript error.
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl SessionError {
    /// Serving-boundary code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::MatchNotFound | SessionError::CourtNotFound(_) => ErrorCode::NotFound,
            SessionError::CourtOccupied(_) | SessionError::NothingToUndo => ErrorCode::Conflict,
            SessionError::Score(err) => err.code(),
            SessionError::Transcript(_) => ErrorCode::InternalError,
        }
    }
}

impl From<&SessionError> for ApiError {
    fn from(err: &SessionError) -> Self {
        ApiError {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Manages all live matches.
pub struct SessionManager {
    /// Live matches.
    sessions: RwLock<BTreeMap<MatchId, Arc<RwLock<MatchSession>>>>,
    /// Court to match mapping.
    courts: RwLock<BTreeMap<u32, MatchId>>,
    /// Configuration for new sessions.
    config: SessionConfig,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            courts: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Create a fresh match.
    pub async fn create_match(&self, format: MatchFormat, teams: TeamNames) -> Result<MatchId, SessionError> {
        let id = Uuid::new_v4();
        let session = MatchSession::new(id, format, teams, &self.config)?;
        self.insert(session).await;

        info!(match_id = %id, sets_to_win = format.sets_to_win, "match created");
        Ok(id)
    }

    /// Register a match from a stored snapshot.
    pub async fn import_match(&self, state: MatchState, teams: TeamNames) -> Result<MatchId, SessionError> {
        let id = Uuid::new_v4();
        let points_played = state.points_played;
        let session = MatchSession::from_snapshot(id, state, teams, &self.config)?;
        self.insert(session).await;

        info!(match_id = %id, points_played, "match imported");
        Ok(id)
    }

    async fn insert(&self, session: MatchSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, Arc::new(RwLock::new(session)));
    }

    /// Get a match by id.
    pub async fn get(&self, id: &MatchId) -> Option<Arc<RwLock<MatchSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Get the match assigned to a court.
    pub async fn get_by_court(&self, court: u32) -> Option<Arc<RwLock<MatchSession>>> {
        let id = {
            let courts = self.courts.read().await;
            courts.get(&court).copied()?
        };
        self.get(&id).await
    }

    async fn require(&self, id: &MatchId) -> Result<Arc<RwLock<MatchSession>>, SessionError> {
        self.get(id).await.ok_or(SessionError::MatchNotFound)
    }

    /// Show a match on a court. A match moves courts if it already had one.
    pub async fn assign_court(&self, court: u32, id: &MatchId) -> Result<(), SessionError> {
        // Look the match up under the courts lock so a concurrent removal
        // cannot leave the court pointing at a deleted match
        let mut courts = self.courts.write().await;
        let session = self.require(id).await?;

        if let Some(existing) = courts.get(&court).copied() {
            if existing != *id && self.get(&existing).await.is_some() {
                warn!(court, match_id = %id, "court already assigned");
                return Err(SessionError::CourtOccupied(court));
            }
        }
        courts.retain(|_, assigned| assigned != id);
        courts.insert(court, *id);

        session.write().await.court = Some(court);
        debug!(court, match_id = %id, "court assigned");
        Ok(())
    }

    /// Free a court. Returns the match that was on it.
    pub async fn release_court(&self, court: u32) -> Option<MatchId> {
        let id = {
            let mut courts = self.courts.write().await;
            courts.remove(&court)?
        };
        if let Some(session) = self.get(&id).await {
            session.write().await.court = None;
        }
        Some(id)
    }

    /// Apply a point to a match.
    pub async fn apply_point(&self, id: &MatchId, side: Side) -> Result<PointOutcome, SessionError> {
        let session = self.require(id).await?;
        let mut session = session.write().await;
        session.apply_point(side)
    }

    /// Undo the last point of a match.
    pub async fn undo(&self, id: &MatchId) -> Result<MatchState, SessionError> {
        let session = self.require(id).await?;
        let mut session = session.write().await;
        session.undo().cloned()
    }

    /// Current snapshot of a match.
    pub async fn snapshot(&self, id: &MatchId) -> Result<MatchState, SessionError> {
        let session = self.require(id).await?;
        let session = session.read().await;
        Ok(session.state().clone())
    }

    /// Overlay record of a match.
    pub async fn overlay(&self, id: &MatchId) -> Result<OverlayRecord, SessionError> {
        let session = self.require(id).await?;
        let session = session.read().await;
        Ok(session.overlay())
    }

    /// Overlay record of the match on a court.
    pub async fn overlay_for_court(&self, court: u32) -> Result<OverlayRecord, SessionError> {
        let session = self
            .get_by_court(court)
            .await
            .ok_or(SessionError::CourtNotFound(court))?;
        let session = session.read().await;
        Ok(session.overlay())
    }

    /// Remove a match and free its court. Returns its transcript.
    pub async fn remove_match(&self, id: &MatchId) -> Result<Option<MatchTranscript>, SessionError> {
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id).ok_or(SessionError::MatchNotFound)?
        };
        {
            let mut courts = self.courts.write().await;
            courts.retain(|_, assigned| assigned != id);
        }

        info!(match_id = %id, "match removed");
        let session = session.read().await;
        Ok(session.transcript().cloned())
    }

    /// Get live match count.
    pub async fn match_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
