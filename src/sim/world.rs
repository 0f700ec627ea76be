/// RunState: the complete snapshot of a running navigation.
///
/// ## Map Architecture
///
/// Two layers, composed at query time:
///   - `truth`    : the level as loaded. **Never mutated** after load.
///   - `knowledge`: what the drone has seen. Only grows, through `reveal`.
///
/// The drone position only changes in `apply_move`, which composes
/// `attempt_move` → set position → record path → `reveal`. Every other
/// query reads the knowledge map and never the truth.

use crate::domain::grid::{Direction, Position};
use crate::domain::map::{GroundTruth, KnowledgeMap};
use crate::domain::rules::{self, MoveResult};

#[derive(Clone, Debug)]
pub struct RunState {
    level_name: String,
    truth: GroundTruth,
    knowledge: KnowledgeMap,
    drone: Position,
    target: Position,
    /// Start position followed by every accepted move.
    path: Vec<Position>,
    rejected_moves: usize,
}

impl RunState {
    /// Start a run: fresh knowledge at `start`, then the initial reveal.
    pub fn new(level_name: impl Into<String>, truth: GroundTruth, start: Position, target: Position) -> Self {
        let mut knowledge = KnowledgeMap::new(&truth, start);
        rules::reveal(&truth, &mut knowledge, start);
        RunState {
            level_name: level_name.into(),
            truth,
            knowledge,
            drone: start,
            target,
            path: vec![start],
            rejected_moves: 0,
        }
    }

    pub fn level_name(&self) -> &str { &self.level_name }
    pub fn knowledge(&self) -> &KnowledgeMap { &self.knowledge }
    pub fn drone(&self) -> Position { self.drone }
    pub fn target(&self) -> Position { self.target }
    pub fn path(&self) -> &[Position] { &self.path }

    /// Accepted moves so far.
    pub fn moves(&self) -> usize {
        self.path.len() - 1
    }

    pub fn rejected_moves(&self) -> usize {
        self.rejected_moves
    }

    pub fn reached_target(&self) -> bool {
        self.drone == self.target
    }

    pub fn walkable(&self) -> Vec<Direction> {
        rules::walkable_directions(&self.knowledge, self.drone)
    }

    /// Try one step. On success the drone moves and its new window is
    /// revealed; a rejected move changes nothing but the counter.
    pub fn apply_move(&mut self, direction: Direction) -> MoveResult {
        let result = rules::attempt_move(&self.knowledge, self.drone, direction);
        match result.destination() {
            Some(to) => {
                self.drone = to;
                self.path.push(to);
                rules::reveal(&self.truth, &mut self.knowledge, to);
            }
            None => self.rejected_moves += 1,
        }
        result
    }
}
