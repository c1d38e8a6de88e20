use thiserror::Error;

use crate::position::Position;

/// Unrecoverable engine errors. Illegal taps are not errors (the controller
/// silently deselects) and commit rejections are handled by rollback; what
/// remains is a replay feed the local state cannot follow.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("malformed move descriptor {0}")]
    BadDescriptor(u16),

    #[error("replay desync at move {index}: {from} -> {to} is not a legal transition")]
    Desync {
        index: usize,
        from: Position,
        to: Position,
    },
}
