use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Team;
use crate::encode::PackedMove;
use crate::position::Position;

/// Reason the backend declined to persist an otherwise locally legal move,
/// e.g. a stale turn or a concurrent opponent move.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("backend rejected move: {reason}")]
pub struct CommitError {
    pub reason: String,
}

impl CommitError {
    pub fn new(reason: impl Into<String>) -> Self {
        CommitError {
            reason: reason.into(),
        }
    }
}

/// Payload of the sole persistence hook. Coordinates are in the committing
/// player's visual frame; `turn` is the mover, captured before the local
/// turn flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub from: Position,
    pub to: Position,
    pub turn: Team,
    pub black_clock: i64,
    pub white_clock: i64,
}

/// The authoritative backend, seen purely as an asynchronous commit point
/// that can reject a move. The engine never retries; rejection triggers a
/// local rollback.
#[async_trait]
pub trait GameBackend: Send + Sync {
    async fn commit_move(&self, req: CommitRequest) -> Result<(), CommitError>;
}

/// Authoritative match record consumed by the replay feed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRecord {
    pub moves: Vec<PackedMove>,
    pub white_clock: i64,
    pub black_clock: i64,
    pub updated_at: DateTime<Utc>,
    pub white_player_id: String,
    pub black_player_id: String,
}
