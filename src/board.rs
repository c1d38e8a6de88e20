use crate::position::Position;
use crate::registry::PieceId;

pub const BOARD_SIZE: usize = 8;
const SQUARE_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Advisory display tag carried for the render subscriber; the engine never
/// reads it back for rule decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Highlight {
    #[default]
    None,
    Original,
    Selectable,
    LastMove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Square {
    pub pos: Position,
    pub occupant: Option<PieceId>,
    pub highlight: Highlight,
}

/// Flat fixed-size array of value squares. Cloning is a bulk value copy,
/// cheap enough to snapshot per hypothetical-move simulation. No rule logic
/// lives here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    squares: [Square; SQUARE_COUNT],
}

impl Board {
    pub fn empty() -> Self {
        Board {
            squares: std::array::from_fn(|i| Square {
                pos: Position::new(i % BOARD_SIZE, i / BOARD_SIZE),
                occupant: None,
                highlight: Highlight::None,
            }),
        }
    }

    fn index(pos: Position) -> usize {
        pos.y * BOARD_SIZE + pos.x
    }

    pub fn square(&self, pos: Position) -> Option<&Square> {
        if pos.is_valid() {
            Some(&self.squares[Self::index(pos)])
        } else {
            None
        }
    }

    pub fn occupant(&self, pos: Position) -> Option<PieceId> {
        self.square(pos).and_then(|s| s.occupant)
    }

    pub fn set_occupant(&mut self, pos: Position, occupant: Option<PieceId>) {
        if pos.is_valid() {
            self.squares[Self::index(pos)].occupant = occupant;
        }
    }

    pub fn highlight(&self, pos: Position) -> Highlight {
        self.square(pos).map_or(Highlight::None, |s| s.highlight)
    }

    pub fn set_highlight(&mut self, pos: Position, highlight: Highlight) {
        if pos.is_valid() {
            self.squares[Self::index(pos)].highlight = highlight;
        }
    }

    pub fn clear_highlights(&mut self) {
        for square in &mut self.squares {
            square.highlight = Highlight::None;
        }
    }

    pub fn squares(&self) -> impl Iterator<Item = &Square> {
        self.squares.iter()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}
