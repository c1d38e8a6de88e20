use bitflags::bitflags;

use crate::position::Position;
use crate::registry::PieceId;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MoveFlags: u8 {
        const CAPTURE = 0b0001;
        const EN_PASSANT = 0b0010;
        const CASTLE = 0b0100;
        const PROMOTION = 0b1000;
    }
}

/// One entry of the append-only move history. Records carry everything the
/// inverse replay needs, so rolling back a rejected optimistic move is a
/// compensating transaction over the last record rather than general undo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: Position,
    pub to: Position,
    /// Square the captured piece stood on; differs from `to` for en passant.
    pub captured_at: Position,
    pub captured: Option<PieceId>,
    pub moved: PieceId,
    /// Queen created when a pawn reached its last rank.
    pub promoted: Option<PieceId>,
    pub flags: MoveFlags,
    /// En passant target in force before this move.
    pub prior_en_passant: Option<Position>,
    /// Mover team's king-moved flag before this move.
    pub prior_king_moved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_compose() {
        let flags = MoveFlags::CAPTURE | MoveFlags::PROMOTION;
        assert!(flags.contains(MoveFlags::CAPTURE));
        assert!(flags.contains(MoveFlags::PROMOTION));
        assert!(!flags.contains(MoveFlags::CASTLE));
        assert!(MoveFlags::empty().is_empty());
    }
}
