use crate::color::Team;
use crate::pieces::{Piece, PieceKind};

/// Stable identifier of a piece record. Squares reference pieces by id, never
/// by value, so a capture is expressed as a square's occupant becoming empty
/// while the record stays resident for rollback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PieceId(u32);

#[derive(Clone, Debug)]
struct PieceRecord {
    piece: Piece,
    retired: bool,
}

/// Arena of every piece created during the match, keyed by monotonically
/// increasing id. Records are never deleted; promotion retires the pawn's id
/// and rollback restores it.
#[derive(Clone, Debug)]
pub struct PieceRegistry {
    records: Vec<PieceRecord>,
}

impl PieceRegistry {
    pub fn new() -> Self {
        let mut registry = PieceRegistry {
            records: Vec::with_capacity(34),
        };
        // Ids 0 and 1 back the reachability-scan sentinels.
        registry.register(Piece::new(Team::White, PieceKind::None));
        registry.register(Piece::new(Team::Black, PieceKind::None));
        registry
    }

    /// The reserved dummy piece used to occupy the defended square during
    /// reachability scans.
    pub fn sentinel(&self, team: Team) -> PieceId {
        match team {
            Team::White => PieceId(0),
            Team::Black => PieceId(1),
        }
    }

    pub fn register(&mut self, piece: Piece) -> PieceId {
        let id = PieceId(self.records.len() as u32);
        self.records.push(PieceRecord {
            piece,
            retired: false,
        });
        id
    }

    pub fn get(&self, id: PieceId) -> Option<Piece> {
        self.records.get(id.0 as usize).map(|r| r.piece)
    }

    pub fn is_live(&self, id: PieceId) -> bool {
        self.records.get(id.0 as usize).is_some_and(|r| !r.retired)
    }

    pub(crate) fn retire(&mut self, id: PieceId) {
        if let Some(record) = self.records.get_mut(id.0 as usize) {
            record.retired = true;
        }
    }

    pub(crate) fn restore(&mut self, id: PieceId) {
        if let Some(record) = self.records.get_mut(id.0 as usize) {
            record.retired = false;
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for PieceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotone() {
        let mut registry = PieceRegistry::new();
        let a = registry.register(Piece::new(Team::White, PieceKind::Pawn));
        let b = registry.register(Piece::new(Team::Black, PieceKind::Rook));

        assert_ne!(a, b);
        assert_eq!(registry.get(a), Some(Piece::new(Team::White, PieceKind::Pawn)));
        assert_eq!(registry.get(b), Some(Piece::new(Team::Black, PieceKind::Rook)));
    }

    #[test]
    fn test_retire_and_restore() {
        let mut registry = PieceRegistry::new();
        let id = registry.register(Piece::new(Team::White, PieceKind::Pawn));

        assert!(registry.is_live(id));
        registry.retire(id);
        assert!(!registry.is_live(id));
        // The record itself stays resident
        assert!(registry.get(id).is_some());

        registry.restore(id);
        assert!(registry.is_live(id));
    }

    #[test]
    fn test_sentinels_are_move_less_dummies() {
        let registry = PieceRegistry::new();

        let white = registry.get(registry.sentinel(Team::White)).expect("sentinel");
        let black = registry.get(registry.sentinel(Team::Black)).expect("sentinel");
        assert_eq!(white.kind, PieceKind::None);
        assert_eq!(black.kind, PieceKind::None);
        assert_eq!(white.team, Team::White);
        assert_eq!(black.team, Team::Black);
    }
}
