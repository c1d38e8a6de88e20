use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Team {
    White = 1,
    Black = -1,
}

impl Team {
    pub fn opposite(&self) -> Team {
        match self {
            Team::White => Team::Black,
            Team::Black => Team::White,
        }
    }

    pub fn from_int(i: i8) -> Option<Team> {
        match i {
            1 => Some(Team::White),
            -1 => Some(Team::Black),
            _ => None,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Team::White => "White",
            Team::Black => "Black",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite() {
        assert_eq!(Team::White.opposite(), Team::Black);
        assert_eq!(Team::Black.opposite(), Team::White);
    }

    #[test]
    fn test_from_int() {
        assert_eq!(Team::from_int(1), Some(Team::White));
        assert_eq!(Team::from_int(-1), Some(Team::Black));
        assert_eq!(Team::from_int(0), None);
    }
}
