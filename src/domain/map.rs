/// The two map layers of a run.
///
///   - `GroundTruth` : the level as loaded. **Never mutated** after load.
///   - `KnowledgeMap`: what the drone has seen so far. Same shape as the
///     ground truth, starts fully unknown apart from the start cell, and only
///     grows through `rules::reveal`.

use super::cell::CellKind;
use super::grid::{Grid, GridError, Position};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroundTruth {
    grid: Grid,
}

impl GroundTruth {
    /// Wrap a loaded grid. Every cell must be resolved (`Free` or `Wall`).
    pub fn new(grid: Grid) -> Result<Self, GridError> {
        if let Some(pos) = grid.positions().find(|&p| grid.get(p) == Some(CellKind::Unknown)) {
            return Err(GridError::Unresolved { row: pos.row, col: pos.col });
        }
        Ok(GroundTruth { grid })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn kind_at(&self, pos: Position) -> Option<CellKind> {
        self.grid.get(pos)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnowledgeMap {
    grid: Grid,
}

impl KnowledgeMap {
    /// Fresh knowledge for a run starting at `start`: everything unknown
    /// except the start cell itself.
    pub fn new(truth: &GroundTruth, start: Position) -> Self {
        let src = truth.grid();
        let mut grid = Grid::filled(src.rows(), src.cols(), CellKind::Unknown);
        if let Some(kind) = truth.kind_at(start) {
            grid.set(start, kind);
        }
        KnowledgeMap { grid }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn kind_at(&self, pos: Position) -> Option<CellKind> {
        self.grid.get(pos)
    }

    pub fn known_count(&self) -> usize {
        self.grid
            .row_cells()
            .map(|r| r.iter().filter(|c| c.is_known()).count())
            .sum()
    }

    /// Copy one ground-truth cell into the map. Only revelation calls this.
    pub(super) fn learn(&mut self, pos: Position, kind: CellKind) {
        self.grid.set(pos, kind);
    }
}
