//! Courtside Demo
//!
//! Plays a scripted match through the session registry, logs the important
//! points as they come up, prints the overlay record and verifies the
//! recorded transcript by replay.
//!
//! Usage: `courtside [settings.json]` where the settings file holds one
//! format settings object or an array of them, highest priority first.

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use courtside::{
    resolve_format, verify_transcript, FormatSettings, MatchTranscript, SessionManager, Side,
    VERSION,
    feed::TeamNames,
    score::PerSide,
};

/// Safety cap for formats without tiebreaks.
const MAX_DEMO_POINTS: u32 = 2_000;

/// Demo court.
const DEMO_COURT: u32 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Courtside Score v{}", VERSION);

    let layers = match std::env::args().nth(1) {
        Some(path) => load_settings(&path)?,
        None => Vec::new(),
    };
    let resolved = resolve_format(&layers);
    info!(
        "Format: best of {} ({} to win, source {:?}), {} games per set, tiebreak at {:?}",
        resolved.format.total_sets,
        resolved.format.sets_to_win,
        resolved.source,
        resolved.format.games_per_set,
        resolved.format.tiebreak_at,
    );

    demo_match(resolved.format).await
}

/// Read settings layers from a JSON file.
fn load_settings(path: &str) -> Result<Vec<FormatSettings>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading settings file {}", path))?;
    let value: serde_json::Value = serde_json::from_str(&text).context("settings file is not JSON")?;

    let layers = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(layers)
}

/// Point winner for the scripted rally sequence.
fn scripted_winner(point: u32) -> Side {
    if (point * 7 + point / 5) % 3 == 0 {
        Side::B
    } else {
        Side::A
    }
}

async fn demo_match(format: courtside::MatchFormat) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let manager = SessionManager::default();
    let teams: TeamNames = PerSide::new("Team Blue".to_string(), "Team Red".to_string());
    let match_id = manager.create_match(format, teams).await?;
    manager.assign_court(DEMO_COURT, &match_id).await?;

    info!("Match ID: {}", match_id);

    let session = manager
        .get(&match_id)
        .await
        .context("match vanished after creation")?;
    let mut updates = session.read().await.subscribe();

    let mut last_signal = None;
    let mut point = 0;
    loop {
        if point >= MAX_DEMO_POINTS {
            bail!("match did not finish within {} points", MAX_DEMO_POINTS);
        }

        let outcome = manager.apply_point(&match_id, scripted_winner(point)).await?;
        point += 1;

        let signal = courtside::score::signals::important_point(&outcome.state);
        if signal != last_signal {
            if let Some(signal) = signal {
                let side = signal.side().map(|s| s.to_string()).unwrap_or_default();
                info!("Point {}: {} {}", outcome.state.points_played, signal.label(), side);
            }
            last_signal = signal;
        }

        for event in outcome.events.iter().filter(|e| e.is_closure()) {
            info!("Point {}: {:?}", event.point_number, event.data);
        }

        if outcome.match_completed {
            break;
        }
    }

    // Drain the update channel
    let mut updates_seen = 0;
    while updates.try_recv().is_ok() {
        updates_seen += 1;
    }
    info!("{} updates broadcast", updates_seen);

    // Print final overlay
    info!("=== Overlay Record (court {}) ===", DEMO_COURT);
    let overlay = manager.overlay_for_court(DEMO_COURT).await?;
    println!("{}", serde_json::to_string_pretty(&overlay)?);

    let snapshot = manager.snapshot(&match_id).await?;
    let final_hash = snapshot.compute_hash();
    info!("Final State Hash: {}", hex::encode(final_hash));

    // Verify the transcript by replay
    info!("=== Verifying Transcript ===");
    let transcript = manager
        .remove_match(&match_id)
        .await?
        .context("transcript recording is disabled")?;
    let bytes = transcript.to_bytes()?;
    info!("Transcript: {} points, {} bytes", transcript.points.len(), bytes.len());

    let decoded = MatchTranscript::from_bytes(&bytes)?;
    let result = verify_transcript(&decoded);
    info!("Replay State Hash: {}", hex::encode(result.computed_final_hash));

    if !result.valid {
        bail!(
            "transcript verification failed: {}",
            result.error.map(|e| e.to_string()).unwrap_or_default()
        );
    }
    info!(
        "REPLAY VERIFIED: {} points, {} checkpoints",
        result.points_replayed,
        result.checkpoint_results.len()
    );

    Ok(())
}
