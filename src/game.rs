use std::fmt;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::backend::{CommitRequest, GameBackend, MatchRecord};
use crate::board::{Board, Highlight, BOARD_SIZE};
use crate::color::Team;
use crate::encode::PackedMove;
use crate::error::GameError;
use crate::pieces::{MoveList, Piece, PieceKind};
use crate::position::Position;
use crate::record::{MoveFlags, MoveRecord};
use crate::registry::{PieceId, PieceRegistry};
use crate::status::MateStatus;

/// Starting clock value for both sides, in seconds. The engine only carries
/// clocks through to the backend; it never counts them down.
pub const INITIAL_CLOCK: i64 = 600;

/// What a tap at a square amounted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    Selected,
    Deselected,
    Moved,
    Castled,
    /// The backend declined the commit and the move was rolled back.
    Rejected,
    Ignored,
}

/// Read-only view pushed to the render subscriber on every mutation.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub board: Board,
    pub highlights: Vec<(Position, Highlight)>,
    pub turn: Team,
    pub moves_applied: usize,
}

/// Authoritative local state of one match: board, piece registry, turn and
/// selection state, move history, and the per-viewer orientation needed to
/// decode the replay feed.
pub struct Game {
    board: Board,
    registry: PieceRegistry,

    seat: Team,
    flipped: bool,

    turn: Team,
    selected: Option<Position>,
    current_moves: Vec<Position>,

    white_king: Option<Position>,
    black_king: Option<Position>,
    white_king_moved: bool,
    black_king_moved: bool,

    en_passant_target: Option<Position>,

    moves_applied: usize,
    history: Vec<MoveRecord>,

    white_clock: i64,
    black_clock: i64,

    snapshot_tx: watch::Sender<Snapshot>,
}

impl Game {
    /// Standard match for the given seat, unflipped viewer orientation.
    pub fn new(seat: Team) -> Self {
        Self::with_orientation(seat, false)
    }

    pub fn with_orientation(seat: Team, flipped: bool) -> Self {
        let mut game = Self::bare(seat, flipped);
        game.init_pieces();
        game.publish();
        game
    }

    /// A board with no pieces. Position setup hook for diagnostics and
    /// tests; combine with [`Game::place_piece`].
    pub fn empty(seat: Team) -> Self {
        let game = Self::bare(seat, false);
        game.publish();
        game
    }

    fn bare(seat: Team, flipped: bool) -> Self {
        let board = Board::empty();
        let (snapshot_tx, _) = watch::channel(Snapshot {
            board: board.clone(),
            highlights: Vec::new(),
            turn: Team::White,
            moves_applied: 0,
        });

        Game {
            board,
            registry: PieceRegistry::new(),
            seat,
            flipped,
            turn: Team::White,
            selected: None,
            current_moves: Vec::new(),
            white_king: None,
            black_king: None,
            white_king_moved: false,
            black_king_moved: false,
            en_passant_target: None,
            moves_applied: 0,
            history: Vec::new(),
            white_clock: INITIAL_CLOCK,
            black_clock: INITIAL_CLOCK,
            snapshot_tx,
        }
    }

    fn init_pieces(&mut self) {
        // The viewer's own pieces sit on the near ranks; when White moves
        // "downward" the whole layout is mirrored and king/queen files swap.
        let mirrored = self.downward_for(Team::White);
        let (black_home, black_pawns, white_home, white_pawns) = if mirrored {
            (BOARD_SIZE - 1, BOARD_SIZE - 2, 0, 1)
        } else {
            (0, 1, BOARD_SIZE - 1, BOARD_SIZE - 2)
        };
        let (king_x, queen_x) = if mirrored { (3, 4) } else { (4, 3) };

        for (team, home) in [(Team::Black, black_home), (Team::White, white_home)] {
            self.place_piece(Position::new(0, home), team, PieceKind::Rook);
            self.place_piece(Position::new(7, home), team, PieceKind::Rook);
            self.place_piece(Position::new(1, home), team, PieceKind::Knight);
            self.place_piece(Position::new(6, home), team, PieceKind::Knight);
            self.place_piece(Position::new(2, home), team, PieceKind::Bishop);
            self.place_piece(Position::new(5, home), team, PieceKind::Bishop);
            self.place_piece(Position::new(queen_x, home), team, PieceKind::Queen);
            self.place_piece(Position::new(king_x, home), team, PieceKind::King);
        }

        for x in 0..BOARD_SIZE {
            self.place_piece(Position::new(x, black_pawns), Team::Black, PieceKind::Pawn);
            self.place_piece(Position::new(x, white_pawns), Team::White, PieceKind::Pawn);
        }
    }

    pub fn place_piece(&mut self, pos: Position, team: Team, kind: PieceKind) -> PieceId {
        let id = self.registry.register(Piece::new(team, kind));
        self.board.set_occupant(pos, Some(id));
        if kind == PieceKind::King {
            self.set_king_square(team, pos);
        }
        id
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn registry(&self) -> &PieceRegistry {
        &self.registry
    }

    pub fn seat(&self) -> Team {
        self.seat
    }

    pub fn turn(&self) -> Team {
        self.turn
    }

    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    pub fn highlighted_moves(&self) -> &[Position] {
        &self.current_moves
    }

    pub fn en_passant_target(&self) -> Option<Position> {
        self.en_passant_target
    }

    pub fn moves_applied(&self) -> usize {
        self.moves_applied
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn king_square(&self, team: Team) -> Option<Position> {
        match team {
            Team::White => self.white_king,
            Team::Black => self.black_king,
        }
    }

    pub fn king_moved(&self, team: Team) -> bool {
        match team {
            Team::White => self.white_king_moved,
            Team::Black => self.black_king_moved,
        }
    }

    pub fn clock(&self, team: Team) -> i64 {
        match team {
            Team::White => self.white_clock,
            Team::Black => self.black_clock,
        }
    }

    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.board.occupant(pos).and_then(|id| self.registry.get(id))
    }

    /// Forward direction of `team`'s pieces in this viewer's frame: +y when
    /// true. Also the flip flag used to decode a replay descriptor for a
    /// move made by `team`.
    pub fn downward_for(&self, team: Team) -> bool {
        if team == self.seat {
            self.flipped
        } else {
            !self.flipped
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    fn set_king_square(&mut self, team: Team, pos: Position) {
        match team {
            Team::White => self.white_king = Some(pos),
            Team::Black => self.black_king = Some(pos),
        }
    }

    fn set_king_moved(&mut self, team: Team, moved: bool) {
        match team {
            Team::White => self.white_king_moved = moved,
            Team::Black => self.black_king_moved = moved,
        }
    }

    fn add_clock(&mut self, team: Team, delta: i64) {
        match team {
            Team::White => self.white_clock += delta,
            Team::Black => self.black_clock += delta,
        }
    }

    // ---------------------------------------------------------------------
    // Legality
    // ---------------------------------------------------------------------

    /// Membership test against the currently highlighted destinations.
    pub fn is_highlighted(&self, pos: Position) -> bool {
        self.current_moves.contains(&pos)
    }

    /// Legal destinations for the piece on `from`: pseudo-legal moves that
    /// leave the mover's own king safe, plus castle and en passant
    /// extensions. Independent of whose turn it is.
    pub fn legal_destinations(&self, from: Position) -> MoveList {
        let mut legal = MoveList::new();
        let Some(piece) = self.piece_at(from) else {
            return legal;
        };

        let downward = self.downward_for(piece.team);
        for to in piece.possible_moves(&self.board, &self.registry, from, downward) {
            if self.king_safe_after(piece.team, from, to) {
                legal.push(to);
            }
        }

        // Castle destinations for an unmoved king
        if piece.kind == PieceKind::King && !self.king_moved(piece.team) {
            for dx in [-2i32, 2] {
                let to_x = from.x as i32 + dx;
                if (0..BOARD_SIZE as i32).contains(&to_x) {
                    let to = Position::new(to_x as usize, from.y);
                    if self.can_castle(from, to) {
                        legal.push(to);
                    }
                }
            }
        }

        // En passant destination for a pawn beside the tracked target
        if piece.kind == PieceKind::Pawn {
            if let Some(pp) = self.en_passant_target {
                let adjacent = self.piece_at(pp).is_some_and(|p| p.team != piece.team)
                    && from.y == pp.y
                    && from.x.abs_diff(pp.x) == 1;
                if adjacent {
                    let to_y = if downward { pp.y as i32 + 1 } else { pp.y as i32 - 1 };
                    let to = Position::new(pp.x, to_y as usize);
                    if to.is_valid() && self.king_safe_after(piece.team, from, to) {
                        legal.push(to);
                    }
                }
            }
        }

        legal
    }

    /// All legal `(from, to)` pairs for the side to move.
    pub fn legal_moves(&self) -> Vec<(Position, Position)> {
        let mut moves = Vec::new();

        for square in self.board.squares() {
            let Some(piece) = square.occupant.and_then(|id| self.registry.get(id)) else {
                continue;
            };
            if piece.team != self.turn {
                continue;
            }
            for to in self.legal_destinations(square.pos) {
                moves.push((square.pos, to));
            }
        }

        moves
    }

    pub fn king_is_safe(&self, team: Team) -> bool {
        self.king_safe_sim(team, None)
    }

    /// Would `team`'s king be safe after hypothetically moving the occupant
    /// of `from` to `to`? The simulation runs on a board copy; live state is
    /// untouched.
    pub fn king_safe_after(&self, team: Team, from: Position, to: Position) -> bool {
        self.king_safe_sim(team, Some((from, to)))
    }

    fn king_safe_sim(&self, team: Team, hypothetical: Option<(Position, Position)>) -> bool {
        let Some(mut target) = self.king_square(team) else {
            return true;
        };

        let mut sim = self.board.clone();
        if let Some((from, to)) = hypothetical {
            let occupant = sim.occupant(from);
            sim.set_occupant(to, occupant);
            sim.set_occupant(from, None);
            if Some(from) == self.king_square(team) {
                target = to;
            }
        }

        !self.square_attacked(&mut sim, target, team)
    }

    /// Full-board reachability scan: does any enemy piece's pseudo-legal
    /// move land on `target`? The target square temporarily holds the dummy
    /// sentinel of the defending team so that pawn captures into it register
    /// even when the square is empty (the king may have just vacated it).
    fn square_attacked(&self, board: &mut Board, target: Position, defender: Team) -> bool {
        let saved = board.occupant(target);
        board.set_occupant(target, Some(self.registry.sentinel(defender)));

        let mut attacked = false;
        'scan: for i in 0..BOARD_SIZE * BOARD_SIZE {
            let from = Position::new(i % BOARD_SIZE, i / BOARD_SIZE);
            let Some(piece) = board.occupant(from).and_then(|id| self.registry.get(id)) else {
                continue;
            };
            if piece.team == defender {
                continue;
            }

            let downward = self.downward_for(piece.team);
            if piece
                .possible_moves(board, &self.registry, from, downward)
                .contains(&target)
            {
                attacked = true;
                break 'scan;
            }
        }

        board.set_occupant(target, saved);
        attacked
    }

    /// No escape for `team`: `Checkmate` if its king is currently
    /// capturable, `Stalemate` otherwise; `None` as soon as any hypothetical
    /// move keeps the king safe.
    pub fn mate_status(&self, team: Team) -> MateStatus {
        let downward = self.downward_for(team);

        for i in 0..BOARD_SIZE * BOARD_SIZE {
            let from = Position::new(i % BOARD_SIZE, i / BOARD_SIZE);
            let Some(piece) = self.piece_at(from) else {
                continue;
            };
            if piece.team != team {
                continue;
            }
            for to in piece.possible_moves(&self.board, &self.registry, from, downward) {
                if self.king_safe_after(team, from, to) {
                    return MateStatus::None;
                }
            }
        }

        if self.king_is_safe(team) {
            MateStatus::Stalemate
        } else {
            MateStatus::Checkmate
        }
    }

    // ---------------------------------------------------------------------
    // Special moves
    // ---------------------------------------------------------------------

    /// A castle is a two-file king move on the back rank: king never moved,
    /// all squares between king and the corresponding rook empty, the rook
    /// still in its corner, king currently safe and safe on every square of
    /// its path.
    pub fn can_castle(&self, from: Position, to: Position) -> bool {
        let Some(piece) = self.piece_at(from) else {
            return false;
        };
        if piece.kind != PieceKind::King {
            return false;
        }
        let team = piece.team;

        if !to.is_valid() || (to.y != 0 && to.y != BOARD_SIZE - 1) || to.y != from.y {
            return false;
        }
        if from.x.abs_diff(to.x) != 2 {
            return false;
        }
        if self.king_moved(team) {
            return false;
        }
        if !self.king_is_safe(team) {
            return false;
        }

        let y = from.y;
        let rook_at = |pos: Position| {
            self.piece_at(pos)
                .is_some_and(|p| p.team == team && p.kind == PieceKind::Rook)
        };

        if to.x < from.x {
            if !rook_at(Position::new(0, y)) {
                return false;
            }
            for x in 1..from.x {
                if self.board.occupant(Position::new(x, y)).is_some() {
                    return false;
                }
            }
            self.king_safe_after(team, from, Position::new(from.x - 1, y))
                && self.king_safe_after(team, from, Position::new(from.x - 2, y))
        } else {
            if !rook_at(Position::new(BOARD_SIZE - 1, y)) {
                return false;
            }
            for x in from.x + 1..BOARD_SIZE - 1 {
                if self.board.occupant(Position::new(x, y)).is_some() {
                    return false;
                }
            }
            self.king_safe_after(team, from, Position::new(from.x + 1, y))
                && self.king_safe_after(team, from, Position::new(from.x + 2, y))
        }
    }

    /// Is `from -> to` a legal transition for the side to move? Used to
    /// vet replay descriptors before applying them.
    pub fn is_valid_move(&self, from: Position, to: Position) -> bool {
        let Some(piece) = self.piece_at(from) else {
            return false;
        };
        if piece.team != self.turn {
            return false;
        }
        if self.can_castle(from, to) {
            return true;
        }
        self.legal_destinations(from).contains(&to)
    }

    // ---------------------------------------------------------------------
    // Applying moves
    // ---------------------------------------------------------------------

    /// Apply `from -> to` with all side effects: en passant capture, castle
    /// rook relocation, queen promotion, history append, turn flip. The
    /// caller is responsible for legality; both the tap path and the replay
    /// path validate before calling this.
    pub fn move_piece(&mut self, from: Position, to: Position) {
        let Some(moved_id) = self.board.occupant(from) else {
            return;
        };
        let Some(piece) = self.registry.get(moved_id) else {
            return;
        };

        let captured = self.board.occupant(to);
        let mut record = MoveRecord {
            from,
            to,
            captured_at: to,
            captured,
            moved: moved_id,
            promoted: None,
            flags: if captured.is_some() {
                MoveFlags::CAPTURE
            } else {
                MoveFlags::empty()
            },
            prior_en_passant: self.en_passant_target,
            prior_king_moved: self.king_moved(piece.team),
        };

        self.apply_en_passant(&mut record, piece);
        self.apply_castle(&mut record, piece);

        self.board.set_occupant(to, Some(moved_id));

        self.apply_promotion(&mut record, piece);

        if piece.kind == PieceKind::King {
            self.set_king_square(piece.team, to);
        }
        self.board.set_occupant(from, None);

        self.color_latest_move(from, to);

        self.turn = self.turn.opposite();
        self.moves_applied += 1;
        self.history.push(record);
        self.publish();
    }

    fn apply_en_passant(&mut self, record: &mut MoveRecord, piece: Piece) {
        if let Some(pp) = self.en_passant_target {
            let downward = self.downward_for(piece.team);
            let behind_y = if downward { pp.y as i32 + 1 } else { pp.y as i32 - 1 };

            let is_passant_capture = piece.kind == PieceKind::Pawn
                && record.captured.is_none()
                && record.to.y as i32 == behind_y
                && record.to.x == pp.x
                && record.from.x.abs_diff(pp.x) == 1
                && self.piece_at(pp).is_some_and(|p| p.team != piece.team);

            if is_passant_capture {
                record.captured_at = pp;
                record.captured = self.board.occupant(pp);
                record.flags |= MoveFlags::CAPTURE | MoveFlags::EN_PASSANT;
                self.board.set_occupant(pp, None);
            }
        }

        // A fresh double push arms the target; every other move clears it.
        self.en_passant_target = None;
        if piece.kind == PieceKind::Pawn {
            let downward = self.downward_for(piece.team);
            let double_push = if downward {
                record.from.y + 2 == record.to.y
            } else {
                record.to.y + 2 == record.from.y
            };
            if double_push {
                self.en_passant_target = Some(record.to);
            }
        }
    }

    fn apply_castle(&mut self, record: &mut MoveRecord, piece: Piece) {
        if piece.kind != PieceKind::King {
            return;
        }

        if !self.king_moved(piece.team) {
            let y = record.from.y;
            let dx = record.to.x as i32 - record.from.x as i32;

            if dx == 2 {
                let corner = Position::new(BOARD_SIZE - 1, y);
                let rook = self.board.occupant(corner);
                self.board.set_occupant(Position::new(record.from.x + 1, y), rook);
                self.board.set_occupant(corner, None);
                record.flags |= MoveFlags::CASTLE;
            } else if dx == -2 {
                let corner = Position::new(0, y);
                let rook = self.board.occupant(corner);
                self.board.set_occupant(Position::new(record.from.x - 1, y), rook);
                self.board.set_occupant(corner, None);
                record.flags |= MoveFlags::CASTLE;
            }
        }

        // Once the king moves, castling is gone for the match.
        self.set_king_moved(piece.team, true);
    }

    fn apply_promotion(&mut self, record: &mut MoveRecord, piece: Piece) {
        if piece.kind != PieceKind::Pawn {
            return;
        }

        let downward = self.downward_for(piece.team);
        let arrived = if downward {
            record.to.y == BOARD_SIZE - 1
        } else {
            record.to.y == 0
        };

        if arrived {
            // The pawn is replaced, never mutated: retire its id and put a
            // fresh queen on the square.
            self.registry.retire(record.moved);
            let queen = self.registry.register(Piece::new(piece.team, PieceKind::Queen));
            self.board.set_occupant(record.to, Some(queen));
            record.promoted = Some(queen);
            record.flags |= MoveFlags::PROMOTION;
        }
    }

    fn color_latest_move(&mut self, from: Position, to: Position) {
        self.board.clear_highlights();
        self.current_moves.clear();
        self.selected = None;
        self.board.set_highlight(from, Highlight::LastMove);
        self.board.set_highlight(to, Highlight::LastMove);
    }

    /// Replay the inverse of the last record: the compensating transaction
    /// behind optimistic rollback.
    fn unmove_piece(&mut self) -> bool {
        let Some(record) = self.history.pop() else {
            return false;
        };

        self.turn = self.turn.opposite();
        self.moves_applied -= 1;

        if let Some(queen) = record.promoted {
            self.registry.retire(queen);
            self.registry.restore(record.moved);
        }

        self.board.set_occupant(record.from, Some(record.moved));
        self.board.set_occupant(record.to, None);
        self.board.set_occupant(record.captured_at, record.captured);

        if record.flags.contains(MoveFlags::CASTLE) {
            let y = record.from.y;
            if record.to.x > record.from.x {
                let inner = Position::new(record.from.x + 1, y);
                let rook = self.board.occupant(inner);
                self.board.set_occupant(inner, None);
                self.board.set_occupant(Position::new(BOARD_SIZE - 1, y), rook);
            } else {
                let inner = Position::new(record.from.x - 1, y);
                let rook = self.board.occupant(inner);
                self.board.set_occupant(inner, None);
                self.board.set_occupant(Position::new(0, y), rook);
            }
        }

        if let Some(piece) = self.registry.get(record.moved) {
            if piece.kind == PieceKind::King {
                self.set_king_square(piece.team, record.from);
                self.set_king_moved(piece.team, record.prior_king_moved);
            }
        }

        self.en_passant_target = record.prior_en_passant;

        self.board.clear_highlights();
        self.current_moves.clear();
        self.selected = None;
        self.publish();

        true
    }

    // ---------------------------------------------------------------------
    // Selection state machine
    // ---------------------------------------------------------------------

    /// Handle a tap at `pos`. One of: castle, deselect, select, move. Moves
    /// and castles are applied optimistically, then committed through the
    /// backend; a rejection rolls the local state back.
    pub async fn tap(&mut self, pos: Position, backend: &dyn GameBackend) -> TapOutcome {
        if !pos.is_valid() {
            return TapOutcome::Ignored;
        }

        let is_legal = match self.selected {
            Some(old) => self.is_highlighted(pos) && self.king_safe_after(self.turn, old, pos),
            None => false,
        };

        // A selected king tapped onto a valid castle destination commits
        // immediately; can_castle alone gates it.
        if let Some(old) = self.selected {
            if self.can_castle(old, pos) {
                return if self.commit_and_apply(old, pos, false, backend).await {
                    TapOutcome::Castled
                } else {
                    TapOutcome::Rejected
                };
            }
        }

        // Tapping an illegal square drops the selection.
        let mut deselected = false;
        if self.selected.is_some() && !is_legal {
            self.deselect();
            deselected = true;
        }

        // Tapping a piece of the side to move (re)selects it.
        if self.piece_at(pos).is_some_and(|p| p.team == self.turn) {
            self.select(pos);
            return TapOutcome::Selected;
        }

        // Tapping a highlighted legal destination commits the move.
        if let Some(old) = self.selected {
            if is_legal && self.piece_at(old).is_some() {
                return if self.commit_and_apply(old, pos, true, backend).await {
                    TapOutcome::Moved
                } else {
                    TapOutcome::Rejected
                };
            }
        }

        if deselected {
            TapOutcome::Deselected
        } else {
            TapOutcome::Ignored
        }
    }

    fn select(&mut self, pos: Position) {
        let moves = self.legal_destinations(pos);
        for to in &moves {
            self.board.set_highlight(*to, Highlight::Selectable);
        }
        self.board.set_highlight(pos, Highlight::Selectable);
        self.current_moves = moves.to_vec();
        self.selected = Some(pos);
        debug!(square = %pos, destinations = self.current_moves.len(), "selected");
        self.publish();
    }

    fn deselect(&mut self) {
        self.board.clear_highlights();
        if let Some(old) = self.selected {
            self.board.set_highlight(old, Highlight::Original);
        }
        self.current_moves.clear();
        self.selected = None;
        debug!("deselected");
        self.publish();
    }

    async fn commit_and_apply(
        &mut self,
        from: Position,
        to: Position,
        increment: bool,
        backend: &dyn GameBackend,
    ) -> bool {
        let mover = self.turn;
        let req = CommitRequest {
            from,
            to,
            turn: mover,
            black_clock: self.black_clock,
            white_clock: self.white_clock,
        };

        // Optimistic apply: the move is visible locally before the backend
        // confirms it.
        self.move_piece(from, to);
        if increment {
            self.add_clock(mover, 1);
        }

        match backend.commit_move(req).await {
            Ok(()) => {
                debug!(%from, %to, team = %mover, "move committed");
                true
            }
            Err(err) => {
                warn!(%from, %to, %err, "commit rejected, rolling back");
                if increment {
                    self.add_clock(mover, -1);
                }
                self.unmove_piece();
                false
            }
        }
    }

    // ---------------------------------------------------------------------
    // Replay feed
    // ---------------------------------------------------------------------

    /// Catch the local board up to the authoritative move list, applying
    /// descriptors beyond `moves_applied` in order through the same path as
    /// local moves. A descriptor that is not a legal transition from the
    /// current state is a fatal desynchronization; it is reported, never
    /// applied.
    pub fn sync_match(&mut self, record: &MatchRecord) -> Result<usize, GameError> {
        let mut applied = 0;

        while self.moves_applied < record.moves.len() {
            let index = self.moves_applied;
            let flipped = self.downward_for(self.turn);
            let (from, to) = record.moves[index].unpack(flipped)?;

            if !self.is_valid_move(from, to) {
                error!(index, %from, %to, "authoritative move does not fit local state");
                return Err(GameError::Desync { index, from, to });
            }

            self.move_piece(from, to);
            applied += 1;
        }

        if applied > 0 {
            info!(applied, total = record.moves.len(), "replayed authoritative moves");
        }
        Ok(applied)
    }

    /// Reconcile clock baselines against the record's timestamp: the side to
    /// move is charged the seconds elapsed since the last update.
    pub fn sync_clocks(&mut self, record: &MatchRecord, now: chrono::DateTime<chrono::Utc>) {
        let elapsed = (now - record.updated_at).num_seconds().max(0);

        if self.turn == Team::Black {
            self.white_clock = record.white_clock;
            self.black_clock = record.black_clock - elapsed;
        } else {
            self.black_clock = record.black_clock;
            self.white_clock = record.white_clock - elapsed;
        }
    }

    /// Canonical wire encoding of a move just made by `mover`, as seen from
    /// this viewer's frame.
    pub fn pack_move(&self, mover: Team, from: Position, to: Position) -> PackedMove {
        PackedMove::pack(from, to, self.downward_for(mover))
    }

    // ---------------------------------------------------------------------
    // Snapshot feed
    // ---------------------------------------------------------------------

    fn make_snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            highlights: self
                .board
                .squares()
                .filter(|s| s.highlight != Highlight::None)
                .map(|s| (s.pos, s.highlight))
                .collect(),
            turn: self.turn,
            moves_applied: self.moves_applied,
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.make_snapshot());
    }
}

impl Clone for Game {
    fn clone(&self) -> Self {
        // A clone is a detached simulation copy: it gets its own snapshot
        // channel, and existing subscribers keep following the original.
        let (snapshot_tx, _) = watch::channel(self.make_snapshot());
        Game {
            board: self.board.clone(),
            registry: self.registry.clone(),
            seat: self.seat,
            flipped: self.flipped,
            turn: self.turn,
            selected: self.selected,
            current_moves: self.current_moves.clone(),
            white_king: self.white_king,
            black_king: self.black_king,
            white_king_moved: self.white_king_moved,
            black_king_moved: self.black_king_moved,
            en_passant_target: self.en_passant_target,
            moves_applied: self.moves_applied,
            history: self.history.clone(),
            white_clock: self.white_clock,
            black_clock: self.black_clock,
            snapshot_tx,
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..BOARD_SIZE).rev() {
            write!(f, "{:2} ", y + 1)?;
            for x in 0..BOARD_SIZE {
                match self.piece_at(Position::new(x, y)) {
                    Some(piece) => write!(f, "{} ", piece.to_char())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }

        write!(f, "   ")?;
        for x in 0..BOARD_SIZE {
            write!(f, "{} ", (b'a' + x as u8) as char)?;
        }
        Ok(())
    }
}
