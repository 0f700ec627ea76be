/// Cell kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum CellKind {
    Free,
    Wall,
    Unknown, // knowledge map only, never ground truth
}

impl CellKind {
    /// Can the drone occupy this cell?
    pub fn is_walkable(self) -> bool {
        matches!(self, CellKind::Free)
    }

    /// Has this cell been resolved against the ground truth?
    pub fn is_known(self) -> bool {
        !matches!(self, CellKind::Unknown)
    }

    /// Level / map character for this kind.
    pub fn symbol(self) -> char {
        match self {
            CellKind::Free => ' ',
            CellKind::Wall => 'X',
            CellKind::Unknown => '?',
        }
    }

    /// Parse a ground-truth level character. `'?'` is not a level cell.
    pub fn from_level_char(ch: char) -> Option<Self> {
        match ch {
            ' ' => Some(CellKind::Free),
            'X' => Some(CellKind::Wall),
            _ => None,
        }
    }
}

impl Default for CellKind {
    fn default() -> Self {
        CellKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_chars_round_trip_through_symbol() {
        for ch in [' ', 'X'] {
            let kind = CellKind::from_level_char(ch).unwrap();
            assert_eq!(kind.symbol(), ch);
        }
    }

    #[test]
    fn unknown_is_not_a_level_char() {
        assert_eq!(CellKind::from_level_char('?'), None);
        assert_eq!(CellKind::from_level_char('#'), None);
    }

    #[test]
    fn only_free_is_walkable() {
        assert!(CellKind::Free.is_walkable());
        assert!(!CellKind::Wall.is_walkable());
        assert!(!CellKind::Unknown.is_walkable());
        assert!(!CellKind::Unknown.is_known());
        assert!(CellKind::Wall.is_known());
    }
}
