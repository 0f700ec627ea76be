/// Status queries: the text the agent receives when it asks where things
/// are, what it knows, or where it can go. Pure formatting, never fails.

use super::grid::{Direction, Position};
use super::map::KnowledgeMap;

pub fn positions(drone: Position, target: Position) -> String {
    format!("Your drone is at position {drone}. The target is at position {target}.")
}

/// The knowledge map as a JSON array of rows of one-character cells.
pub fn map_snapshot(knowledge: &KnowledgeMap) -> String {
    format!("The map known to you is {}", map_json(knowledge))
}

fn map_json(knowledge: &KnowledgeMap) -> String {
    let rows: Vec<Vec<String>> = knowledge
        .grid()
        .row_cells()
        .map(|r| r.iter().map(|c| c.symbol().to_string()).collect())
        .collect();
    serde_json::Value::from(rows).to_string()
}

pub fn walkable(directions: &[Direction]) -> String {
    let names: Vec<&str> = directions.iter().map(|d| d.name()).collect();
    format!("You can move to the following directions [{}]", names.join(", "))
}

/// Agent-facing confirmation after a successful move.
pub fn updated_map(knowledge: &KnowledgeMap) -> String {
    format!("This is the updated map after you moved {}", map_json(knowledge))
}
