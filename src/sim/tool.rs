/// The tool surface offered to the agent, and its dispatch.
///
/// Every tool takes no arguments. Wire names are parsed once, at the
/// boundary; inside the crate a call is always one of the closed `Tool`
/// variants, so dispatch is exhaustive.
///
///   check_positions → positions text
///   check_map       → map snapshot
///   check_walkable  → walkable narrative
///   move_<dir>      → [updated map] + move narrative + walkable narrative

use crate::agent::ToolSpec;
use crate::domain::grid::Direction;
use crate::domain::report;
use crate::domain::rules::MoveResult;
use super::world::RunState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    CheckPositions,
    CheckMap,
    CheckWalkable,
    Move(Direction),
}

impl Tool {
    /// Declaration order seen by the agent.
    pub const ALL: [Tool; 7] = [
        Tool::CheckPositions,
        Tool::CheckMap,
        Tool::CheckWalkable,
        Tool::Move(Direction::North),
        Tool::Move(Direction::South),
        Tool::Move(Direction::West),
        Tool::Move(Direction::East),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::CheckPositions => "check_positions",
            Tool::CheckMap => "check_map",
            Tool::CheckWalkable => "check_walkable",
            Tool::Move(Direction::North) => "move_north",
            Tool::Move(Direction::South) => "move_south",
            Tool::Move(Direction::West) => "move_west",
            Tool::Move(Direction::East) => "move_east",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::CheckPositions => "Returns the coordinates of the drone and the target",
            Tool::CheckMap => "You review the map known to you.",
            Tool::CheckWalkable => "You determine in which directions you can walk from this location.",
            Tool::Move(Direction::North) => "Try to move north and update your map",
            Tool::Move(Direction::South) => "Try to move south and update your map.",
            Tool::Move(Direction::West) => "Try to move west and update your map",
            Tool::Move(Direction::East) => "Try to move east and update your map",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        match name {
            "check_positions" => Some(Tool::CheckPositions),
            "check_map" => Some(Tool::CheckMap),
            "check_walkable" => Some(Tool::CheckWalkable),
            _ => name.strip_prefix("move_").and_then(Direction::from_name).map(Tool::Move),
        }
    }

    pub fn spec(self) -> ToolSpec {
        ToolSpec { name: self.name(), description: self.description() }
    }
}

/// Declarations for every tool, in `Tool::ALL` order.
pub fn declarations() -> Vec<ToolSpec> {
    Tool::ALL.into_iter().map(Tool::spec).collect()
}

/// Result of executing one tool call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutput {
    pub tool: Tool,
    pub lines: Vec<String>,
    /// Set for `Move` tools.
    pub movement: Option<MoveResult>,
}

impl ToolOutput {
    /// The text returned to the agent.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

pub fn execute(tool: Tool, state: &mut RunState) -> ToolOutput {
    match tool {
        Tool::CheckPositions => ToolOutput {
            tool,
            lines: vec![report::positions(state.drone(), state.target())],
            movement: None,
        },
        Tool::CheckMap => ToolOutput {
            tool,
            lines: vec![report::map_snapshot(state.knowledge())],
            movement: None,
        },
        Tool::CheckWalkable => ToolOutput {
            tool,
            lines: vec![report::walkable(&state.walkable())],
            movement: None,
        },
        Tool::Move(direction) => {
            let result = state.apply_move(direction);
            let mut lines = Vec::with_capacity(3);
            if result.success() {
                lines.push(report::updated_map(state.knowledge()));
            }
            lines.push(result.narrative.clone());
            lines.push(report::walkable(&state.walkable()));
            ToolOutput { tool, lines, movement: Some(result) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Position;
    use crate::sim::level::parse_level;

    fn courtyard() -> RunState {
        let truth = parse_level("X X \n  X \n XX \n    ").unwrap();
        RunState::new("courtyard", truth, Position::new(3, 0), Position::new(0, 3))
    }

    #[test]
    fn names_round_trip_and_unknown_rejected() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("teleport"), None);
        assert_eq!(declarations().len(), 7);
    }

    #[test]
    fn declarations_keep_order_and_wording() {
        let decls = declarations();
        let names: Vec<_> = decls.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "check_positions", "check_map", "check_walkable",
                "move_north", "move_south", "move_west", "move_east",
            ]
        );
        assert_eq!(decls[0].description, "Returns the coordinates of the drone and the target");
        assert_eq!(
            decls[2].description,
            "You determine in which directions you can walk from this location."
        );
        assert_eq!(decls[4].description, "Try to move south and update your map.");
    }

    #[test]
    fn check_positions_text() {
        let mut run = courtyard();
        let out = execute(Tool::CheckPositions, &mut run);
        assert_eq!(out.text(), "Your drone is at position [3, 0]. The target is at position [0, 3].");
        assert!(out.movement.is_none());
    }

    #[test]
    fn check_map_shows_initial_window() {
        let mut run = courtyard();
        let out = execute(Tool::CheckMap, &mut run);
        assert_eq!(
            out.text(),
            r#"The map known to you is [["?","?","?","?"],["?","?","?","?"],[" ","X","?","?"],[" "," ","?","?"]]"#
        );
    }

    #[test]
    fn check_walkable_text() {
        let mut run = courtyard();
        let out = execute(Tool::CheckWalkable, &mut run);
        assert_eq!(out.text(), "You can move to the following directions [north, east]");
    }

    #[test]
    fn successful_move_prepends_updated_map() {
        let mut run = courtyard();
        let out = execute(Tool::Move(Direction::North), &mut run);
        assert_eq!(out.lines.len(), 3);
        assert!(out.lines[0].starts_with("This is the updated map after you moved [["));
        assert_eq!(out.lines[1], "The drone moved north by one step. The new drone position is [2, 0]");
        assert_eq!(out.lines[2], "You can move to the following directions [north, south]");
        assert!(out.movement.as_ref().is_some_and(MoveResult::success));
    }

    #[test]
    fn rejected_move_has_no_map() {
        let mut run = courtyard();
        let out = execute(Tool::Move(Direction::South), &mut run);
        assert_eq!(
            out.lines,
            vec![
                "That is outside the allowed area".to_string(),
                "You can move to the following directions [north, east]".to_string(),
            ]
        );
        assert_eq!(run.drone(), Position::new(3, 0));
    }
}
