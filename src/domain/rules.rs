/// Revelation, walkability and move rules, truth-table driven.
///
/// Pure functions over the map layers. `attempt_move` only decides; it
/// never changes the drone position and never reveals. The session composes
/// move → set position → `reveal` → `walkable_directions`.
///
/// ## Revelation
/// Every cell within Chebyshev distance 1 of the drone (3×3 window,
/// diagonals included, clipped at the map edge) is copied from the ground
/// truth into the knowledge map. Nothing outside the window is touched, so
/// knowledge only grows and repeating a reveal changes nothing.
///
/// ## Move Truth Table
/// Classification of the *target* cell, read from the knowledge map:
/// ┌──────────────────────┬──────────┬──────────────────────────────┐
/// │ Target                │ Outcome  │ Narrative                     │
/// ├──────────────────────┼──────────┼──────────────────────────────┤
/// │ outside the map       │ DENY     │ outside the allowed area      │
/// │ Wall                  │ DENY     │ cannot move there, wall       │
/// │ Unknown               │ DENY     │ need to know what is there    │
/// │ Free                  │ ALLOW    │ moved <dir> by one step       │
/// └──────────────────────┴──────────┴──────────────────────────────┘
///
/// ## Walkability
/// A direction is walkable iff its in-bounds neighbor is `Free` in the
/// knowledge map, i.e. exactly when `attempt_move` would allow it.

use super::cell::CellKind;
use super::grid::{Direction, Position};
use super::map::{GroundTruth, KnowledgeMap};

// ── Move result ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    OutOfBounds,
    Wall,
    Unknown,
    Moved(Position),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveResult {
    pub direction: Direction,
    pub outcome: MoveOutcome,
    pub narrative: String,
}

impl MoveResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, MoveOutcome::Moved(_))
    }

    /// New drone position when the move was accepted.
    pub fn destination(&self) -> Option<Position> {
        match self.outcome {
            MoveOutcome::Moved(pos) => Some(pos),
            _ => None,
        }
    }
}

fn narrate(direction: Direction, outcome: MoveOutcome) -> String {
    match outcome {
        MoveOutcome::OutOfBounds => "That is outside the allowed area".to_string(),
        MoveOutcome::Wall => "The drone cannot move there, this is a wall".to_string(),
        MoveOutcome::Unknown => {
            "You need to know what is there to move into that space".to_string()
        }
        MoveOutcome::Moved(to) => format!(
            "The drone moved {} by one step. The new drone position is {}",
            direction, to
        ),
    }
}

// ── Revelation ──

/// Copy the 3×3 neighborhood of `pos` from the ground truth into `knowledge`.
pub fn reveal(truth: &GroundTruth, knowledge: &mut KnowledgeMap, pos: Position) {
    debug_assert!(truth.grid().contains(pos), "reveal outside the map: {pos}");
    debug_assert!(truth.grid().same_shape(knowledge.grid()));

    for cell in truth.grid().window(pos) {
        debug_assert!(cell.chebyshev(pos) <= 1);
        if let Some(kind) = truth.kind_at(cell) {
            knowledge.learn(cell, kind);
        }
    }
}

// ── Walkability ──

/// Orthogonal directions whose neighbor is known to be free, in
/// north, south, west, east order.
pub fn walkable_directions(knowledge: &KnowledgeMap, pos: Position) -> Vec<Direction> {
    Direction::ALL
        .into_iter()
        .filter(|&dir| {
            knowledge
                .grid()
                .neighbor(pos, dir)
                .and_then(|n| knowledge.kind_at(n))
                .map_or(false, CellKind::is_walkable)
        })
        .collect()
}

// ── Move decision ──

/// Classify the cell one step from `pos` in `direction`.
pub fn classify_move(knowledge: &KnowledgeMap, pos: Position, direction: Direction) -> MoveOutcome {
    let Some(target) = knowledge.grid().neighbor(pos, direction) else {
        return MoveOutcome::OutOfBounds;
    };
    match knowledge.kind_at(target) {
        Some(CellKind::Free) => MoveOutcome::Moved(target),
        Some(CellKind::Wall) => MoveOutcome::Wall,
        Some(CellKind::Unknown) => MoveOutcome::Unknown,
        None => MoveOutcome::OutOfBounds,
    }
}

/// Decide a one-step move. Never mutates anything.
pub fn attempt_move(knowledge: &KnowledgeMap, pos: Position, direction: Direction) -> MoveResult {
    let outcome = classify_move(knowledge, pos, direction);
    MoveResult { direction, outcome, narrative: narrate(direction, outcome) }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
