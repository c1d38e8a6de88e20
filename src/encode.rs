use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::position::Position;

/// Compact reversible wire encoding of one move: four decimal digits,
/// `from.x from.y to.x to.y`, in the canonical frame (the mover's seat,
/// unflipped). The same physical move is read back from either seat by
/// passing the decoder's own flip flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedMove(pub u16);

impl PackedMove {
    /// Encode a move as seen in the packer's visual frame. `flipped` mirrors
    /// both endpoints into the canonical frame; since the mirror is its own
    /// inverse, `unpack` with the same flag reproduces the input exactly.
    pub fn pack(from: Position, to: Position, flipped: bool) -> PackedMove {
        let (from, to) = if flipped {
            (from.mirrored(), to.mirrored())
        } else {
            (from, to)
        };
        PackedMove((from.x * 1000 + from.y * 100 + to.x * 10 + to.y) as u16)
    }

    /// Decode into the caller's visual frame. Fails on digits outside the
    /// board rather than wrapping them.
    pub fn unpack(self, flipped: bool) -> Result<(Position, Position), GameError> {
        let v = self.0;
        let digits = [v / 1000, v / 100 % 10, v / 10 % 10, v % 10];

        if digits.iter().any(|d| *d > 7) {
            return Err(GameError::BadDescriptor(v));
        }

        let from = Position::new(digits[0] as usize, digits[1] as usize);
        let to = Position::new(digits[2] as usize, digits[3] as usize);

        if flipped {
            Ok((from.mirrored(), to.mirrored()))
        } else {
            Ok((from, to))
        }
    }
}

impl fmt::Display for PackedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}
