use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::BOARD_SIZE;

/// A board coordinate. `x` is the file, `y` the stored rank: `y = 0` is the
/// far rank as laid out at match start, `y = 7` the near rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    pub fn is_valid(&self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }

    /// Point-mirror through the board center, `(x, y) -> (7-x, 7-y)`.
    /// Its own inverse; relates the two seats' coordinate frames.
    pub fn mirrored(&self) -> Position {
        Position {
            x: BOARD_SIZE - 1 - self.x,
            y: BOARD_SIZE - 1 - self.y,
        }
    }

    pub fn to_algebraic(&self) -> String {
        format!("{}{}", (b'a' + self.x as u8) as char, self.y + 1)
    }

    pub fn from_algebraic(s: &str) -> Result<Self, String> {
        if s.len() < 2 {
            return Err("Invalid position string".to_string());
        }

        let file = s.chars().next().ok_or("Empty position string")?;

        let x = if file.is_ascii_lowercase() {
            (file as u8 - b'a') as usize
        } else {
            return Err("Invalid file character".to_string());
        };

        let y = s[1..]
            .parse::<usize>()
            .map_err(|_| "Invalid rank number".to_string())?
            .saturating_sub(1);

        let pos = Position { x, y };
        if !pos.is_valid() {
            return Err("Position out of bounds".to_string());
        }
        Ok(pos)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}
