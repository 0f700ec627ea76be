/// Rectangular cell grid, positions and compass directions.
///
/// Coordinates are `(row, col)`, zero-indexed, rows counted top to bottom.
/// North decreases the row, west decreases the column.

use std::fmt;

use super::cell::CellKind;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid has no cells")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("cell ({row}, {col}) is unknown in the ground truth")]
    Unresolved { row: usize, col: usize },
}

// ── Position ──

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Chebyshev distance (king moves).
    pub fn chebyshev(self, other: Position) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// `row,col` counted from 1, the way the operator types positions.
    pub fn one_based(self) -> String {
        format!("{},{}", self.row + 1, self.col + 1)
    }
}

/// Agent-facing form: `[row, col]`, zero-based.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}

// ── Direction ──

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    /// Reporting order used by every directional listing.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        }
    }

    /// Screen-relative hint shown next to the compass name.
    pub fn screen_hint(self) -> &'static str {
        match self {
            Direction::North => "up",
            Direction::South => "down",
            Direction::West => "left",
            Direction::East => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Direction::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Grid ──

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    cells: Vec<Vec<CellKind>>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Build from rows, rejecting empty and non-rectangular input.
    /// The width comes from the first non-empty row, so a blank row
    /// anywhere (the first one included) is reported as ragged.
    pub fn from_rows(cells: Vec<Vec<CellKind>>) -> Result<Self, GridError> {
        let rows = cells.len();
        let Some(cols) = cells.iter().map(Vec::len).find(|&len| len > 0) else {
            return Err(GridError::Empty);
        };
        if let Some((row, r)) = cells.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(GridError::Ragged { row, expected: cols, found: r.len() });
        }
        Ok(Grid { cells, rows, cols })
    }

    pub fn filled(rows: usize, cols: usize, kind: CellKind) -> Self {
        Grid { cells: vec![vec![kind; cols]; rows], rows, cols }
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }

    pub fn same_shape(&self, other: &Grid) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Cell at `pos`, `None` outside the grid.
    pub fn get(&self, pos: Position) -> Option<CellKind> {
        self.cells.get(pos.row).and_then(|r| r.get(pos.col)).copied()
    }

    /// Overwrite a cell. Out-of-range writes are ignored.
    pub(super) fn set(&mut self, pos: Position, kind: CellKind) {
        if let Some(cell) = self.cells.get_mut(pos.row).and_then(|r| r.get_mut(pos.col)) {
            *cell = kind;
        }
    }

    /// The orthogonal neighbor of `pos`, if it lies inside the grid.
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position> {
        let next = match dir {
            Direction::North => Position::new(pos.row.checked_sub(1)?, pos.col),
            Direction::South => Position::new(pos.row + 1, pos.col),
            Direction::West => Position::new(pos.row, pos.col.checked_sub(1)?),
            Direction::East => Position::new(pos.row, pos.col + 1),
        };
        self.contains(next).then_some(next)
    }

    /// Every in-bounds cell within Chebyshev distance 1 of `center`,
    /// `center` included.
    pub fn window(&self, center: Position) -> impl Iterator<Item = Position> + '_ {
        let r0 = center.row.saturating_sub(1);
        let c0 = center.col.saturating_sub(1);
        let r1 = (center.row + 1).min(self.rows.saturating_sub(1));
        let c1 = (center.col + 1).min(self.cols.saturating_sub(1));
        (r0..=r1).flat_map(move |row| (c0..=c1).map(move |col| Position::new(row, col)))
    }

    pub fn row_cells(&self) -> impl Iterator<Item = &[CellKind]> {
        self.cells.iter().map(Vec::as_slice)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Position::new(row, col)))
    }

    /// Rows rendered with the cell symbols (no markers).
    #[cfg(test)]
    pub fn to_lines(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|r| r.iter().map(|c| c.symbol()).collect())
            .collect()
    }
}
