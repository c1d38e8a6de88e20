use arrayvec::ArrayVec;

use crate::board::{Board, BOARD_SIZE};
use crate::color::Team;
use crate::position::Position;
use crate::registry::PieceRegistry;

/// Destinations one piece can reach from one square. 27 is the true ceiling
/// (a queen in the open); the headroom covers the castle and en passant
/// extensions the controller appends.
pub type MoveList = ArrayVec<Position, 32>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    /// Sentinel with an empty move set. Never part of a real position; it
    /// stands in for the defended square during reachability scans so that
    /// pawn captures into that square register without special-casing
    /// emptiness.
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub team: Team,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(team: Team, kind: PieceKind) -> Self {
        Piece { team, kind }
    }

    pub fn to_char(&self) -> char {
        let c = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
            PieceKind::None => '?',
        };

        match self.team {
            Team::White => c.to_ascii_uppercase(),
            Team::Black => c,
        }
    }

    /// Pseudo-legal destinations from `from`, ignoring whether the move
    /// exposes the mover's own king. `downward` is this piece's forward
    /// direction: +y when true, -y when false.
    ///
    /// Castle and en passant destinations are appended by the controller,
    /// not generated here.
    pub fn possible_moves(
        &self,
        board: &Board,
        registry: &PieceRegistry,
        from: Position,
        downward: bool,
    ) -> MoveList {
        match self.kind {
            PieceKind::Pawn => self.pawn_moves(board, registry, from, downward),
            PieceKind::Knight => {
                let offsets = [
                    (-2, -1),
                    (-2, 1),
                    (-1, -2),
                    (-1, 2),
                    (1, -2),
                    (1, 2),
                    (2, -1),
                    (2, 1),
                ];
                self.step_moves(board, registry, from, &offsets)
            }
            PieceKind::Bishop => {
                let directions = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
                self.ray_moves(board, registry, from, &directions)
            }
            PieceKind::Rook => {
                let directions = [(0, 1), (0, -1), (1, 0), (-1, 0)];
                self.ray_moves(board, registry, from, &directions)
            }
            PieceKind::Queen => {
                let directions = [
                    (0, 1),
                    (0, -1),
                    (1, 0),
                    (-1, 0),
                    (1, 1),
                    (1, -1),
                    (-1, 1),
                    (-1, -1),
                ];
                self.ray_moves(board, registry, from, &directions)
            }
            PieceKind::King => {
                let offsets = [
                    (-1, -1),
                    (-1, 0),
                    (-1, 1),
                    (0, -1),
                    (0, 1),
                    (1, -1),
                    (1, 0),
                    (1, 1),
                ];
                self.step_moves(board, registry, from, &offsets)
            }
            PieceKind::None => MoveList::new(),
        }
    }

    fn pawn_moves(
        &self,
        board: &Board,
        registry: &PieceRegistry,
        from: Position,
        downward: bool,
    ) -> MoveList {
        let mut moves = MoveList::new();

        let dir: i32 = if downward { 1 } else { -1 };
        let start_y = if downward { 1 } else { BOARD_SIZE - 2 };

        // Single step onto an empty square
        let step_y = (from.y as i32 + dir) as usize;
        if step_y < BOARD_SIZE {
            let step = Position::new(from.x, step_y);
            if board.occupant(step).is_none() {
                moves.push(step);

                // Double step from the starting rank, both squares empty
                if from.y == start_y {
                    let jump = Position::new(from.x, (from.y as i32 + 2 * dir) as usize);
                    if board.occupant(jump).is_none() {
                        moves.push(jump);
                    }
                }
            }
        }

        // Diagonal steps only into enemy-occupied squares
        for dx in [-1i32, 1] {
            let dst_x = (from.x as i32 + dx) as usize;
            let dst_y = (from.y as i32 + dir) as usize;

            if dst_x < BOARD_SIZE && dst_y < BOARD_SIZE {
                let dst = Position::new(dst_x, dst_y);
                if team_at(board, registry, dst).is_some_and(|t| t != self.team) {
                    moves.push(dst);
                }
            }
        }

        moves
    }

    fn step_moves(
        &self,
        board: &Board,
        registry: &PieceRegistry,
        from: Position,
        offsets: &[(i32, i32)],
    ) -> MoveList {
        let mut moves = MoveList::new();

        for (dx, dy) in offsets {
            let dst_x = (from.x as i32 + dx) as usize;
            let dst_y = (from.y as i32 + dy) as usize;

            if dst_x < BOARD_SIZE && dst_y < BOARD_SIZE {
                let dst = Position::new(dst_x, dst_y);
                if team_at(board, registry, dst) != Some(self.team) {
                    moves.push(dst);
                }
            }
        }

        moves
    }

    fn ray_moves(
        &self,
        board: &Board,
        registry: &PieceRegistry,
        from: Position,
        directions: &[(i32, i32)],
    ) -> MoveList {
        let mut moves = MoveList::new();

        for (dx, dy) in directions {
            let mut distance = 1;

            loop {
                let dst_x = (from.x as i32 + dx * distance) as usize;
                let dst_y = (from.y as i32 + dy * distance) as usize;

                if dst_x >= BOARD_SIZE || dst_y >= BOARD_SIZE {
                    break;
                }

                let dst = Position::new(dst_x, dst_y);

                match team_at(board, registry, dst) {
                    Some(team) => {
                        if team != self.team {
                            moves.push(dst);
                        }
                        break;
                    }
                    None => moves.push(dst),
                }

                distance += 1;
            }
        }

        moves
    }
}

fn team_at(board: &Board, registry: &PieceRegistry, pos: Position) -> Option<Team> {
    board
        .occupant(pos)
        .and_then(|id| registry.get(id))
        .map(|p| p.team)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn put(
        board: &mut Board,
        registry: &mut PieceRegistry,
        x: usize,
        y: usize,
        team: Team,
        kind: PieceKind,
    ) -> Piece {
        let piece = Piece::new(team, kind);
        let id = registry.register(piece);
        board.set_occupant(Position::new(x, y), Some(id));
        piece
    }

    #[rstest]
    #[case(3, 3, 8)] // open center
    #[case(0, 0, 2)] // corner
    #[case(0, 3, 4)] // edge
    fn test_knight_move_counts(#[case] x: usize, #[case] y: usize, #[case] expected: usize) {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let knight = put(&mut board, &mut registry, x, y, Team::White, PieceKind::Knight);

        let moves = knight.possible_moves(&board, &registry, Position::new(x, y), false);
        assert_eq!(moves.len(), expected);
    }

    #[test]
    fn test_knight_skips_friendly_squares() {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let knight = put(&mut board, &mut registry, 3, 3, Team::White, PieceKind::Knight);
        put(&mut board, &mut registry, 5, 4, Team::White, PieceKind::Pawn);
        put(&mut board, &mut registry, 1, 2, Team::Black, PieceKind::Pawn);

        let moves = knight.possible_moves(&board, &registry, Position::new(3, 3), false);
        assert_eq!(moves.len(), 7);
        assert!(!moves.contains(&Position::new(5, 4)));
        assert!(moves.contains(&Position::new(1, 2)));
    }

    #[test]
    fn test_pawn_single_and_double_step() {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let pawn = put(&mut board, &mut registry, 4, 6, Team::White, PieceKind::Pawn);

        // Upward-moving pawn on its starting rank
        let moves = pawn.possible_moves(&board, &registry, Position::new(4, 6), false);
        assert!(moves.contains(&Position::new(4, 5)));
        assert!(moves.contains(&Position::new(4, 4)));
        assert_eq!(moves.len(), 2);

        // Off the starting rank only the single step remains
        let moves = pawn.possible_moves(&board, &registry, Position::new(4, 5), false);
        assert_eq!(moves.as_slice(), [Position::new(4, 4)]);
    }

    #[test]
    fn test_pawn_double_step_blocked() {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let pawn = put(&mut board, &mut registry, 4, 6, Team::White, PieceKind::Pawn);

        // A blocker two squares ahead kills only the double step
        put(&mut board, &mut registry, 4, 4, Team::Black, PieceKind::Rook);
        let moves = pawn.possible_moves(&board, &registry, Position::new(4, 6), false);
        assert_eq!(moves.as_slice(), [Position::new(4, 5)]);

        // A blocker directly ahead kills both
        put(&mut board, &mut registry, 4, 5, Team::Black, PieceKind::Rook);
        let moves = pawn.possible_moves(&board, &registry, Position::new(4, 6), false);
        assert!(moves.is_empty());
    }

    #[test]
    fn test_pawn_captures_diagonally_only_enemies() {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let pawn = put(&mut board, &mut registry, 4, 4, Team::White, PieceKind::Pawn);
        put(&mut board, &mut registry, 3, 3, Team::Black, PieceKind::Pawn);
        put(&mut board, &mut registry, 5, 3, Team::White, PieceKind::Pawn);

        let moves = pawn.possible_moves(&board, &registry, Position::new(4, 4), false);
        assert!(moves.contains(&Position::new(3, 3)));
        assert!(!moves.contains(&Position::new(5, 3)));
        assert!(moves.contains(&Position::new(4, 3)));
    }

    #[test]
    fn test_downward_pawn_direction() {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let pawn = put(&mut board, &mut registry, 2, 1, Team::Black, PieceKind::Pawn);

        let moves = pawn.possible_moves(&board, &registry, Position::new(2, 1), true);
        assert!(moves.contains(&Position::new(2, 2)));
        assert!(moves.contains(&Position::new(2, 3)));
        assert_eq!(moves.len(), 2);
    }

    #[test]
    fn test_rook_rays_stop_at_blockers() {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let rook = put(&mut board, &mut registry, 4, 4, Team::White, PieceKind::Rook);
        put(&mut board, &mut registry, 4, 1, Team::Black, PieceKind::Pawn);
        put(&mut board, &mut registry, 6, 4, Team::White, PieceKind::Pawn);

        let moves = rook.possible_moves(&board, &registry, Position::new(4, 4), false);

        // Enemy blocker is included, squares beyond it are not
        assert!(moves.contains(&Position::new(4, 1)));
        assert!(!moves.contains(&Position::new(4, 0)));

        // Friendly blocker and beyond are excluded
        assert!(moves.contains(&Position::new(5, 4)));
        assert!(!moves.contains(&Position::new(6, 4)));
        assert!(!moves.contains(&Position::new(7, 4)));
    }

    #[test]
    fn test_queen_covers_rook_and_bishop_rays() {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let queen = put(&mut board, &mut registry, 3, 3, Team::White, PieceKind::Queen);

        let moves = queen.possible_moves(&board, &registry, Position::new(3, 3), false);
        assert_eq!(moves.len(), 27);
    }

    #[rstest]
    #[case(4, 4, 8)]
    #[case(0, 0, 3)]
    #[case(7, 3, 5)]
    fn test_king_move_counts(#[case] x: usize, #[case] y: usize, #[case] expected: usize) {
        let mut board = Board::empty();
        let mut registry = PieceRegistry::new();
        let king = put(&mut board, &mut registry, x, y, Team::Black, PieceKind::King);

        let moves = king.possible_moves(&board, &registry, Position::new(x, y), true);
        assert_eq!(moves.len(), expected);
    }

    #[test]
    fn test_sentinel_has_no_moves() {
        let board = Board::empty();
        let registry = PieceRegistry::new();
        let sentinel = Piece::new(Team::White, PieceKind::None);

        let moves = sentinel.possible_moves(&board, &registry, Position::new(3, 3), false);
        assert!(moves.is_empty());
    }
}
