/// Prompt text handed to the model.
///
/// The system prompt explains the map legend and the tools. The user prompt
/// comes in four variants of increasing guidance; `config.toml` picks one.

pub const SYSTEM_PROMPT: &str = "\
You are a drone simulator.

You are positioned on a map given by a 2 dimensional grid. The entries of the grid have the following meaning:
' ' this is a free space, the drone can move into this space
'X' this is a wall, the drone cannot move into this space
'?' this space is currently unknown, but is revealed once you move next to it

You can perform the following actions:
- check_positions (get the position of the drone and the target in the grid)
- check_map (review the map known to you)
- check_walkable (check in which directions you can walk)
- move_west (move west/left on the grid; this updates your map and checks where you can walk next)
- move_east (move east/right on the grid; this updates your map and checks where you can walk next)
- move_north (move north/up on the grid; this updates your map and checks where you can walk next)
- move_south (move south/down on the grid; this updates your map and checks where you can walk next)
";

const USER_PROMPTS: [&str; 4] = [
    "You are operating a drone. Move the drone from the drone location to the target location.",
    "\
You are operating a drone.

Move the drone from the drone location to the target location.

When you are done give the whole movement path of the drone.
When displaying the path, add 1 to all coordinates.",
    "\
You are operating a drone.

Move the drone from the drone location to the target location.

When you are done give the whole movement path of the drone. The path has to consist of spaces that you have explored and know are free, i.e. ' '
When displaying the path, add 1 to all coordinates.",
    "\
You are operating a drone.

Move the drone from the drone location to the target location on a 2 dimensional map.
You do not know what the map looks like. It will be revealed to you while you move.
If you start walking in loops, reveal more spaces to find a different way.

When you are done give the whole movement path of the drone.
When displaying the path, add 1 to all coordinates.",
];

pub const DEFAULT_VARIANT: usize = 3;

/// User prompt for `variant`; out-of-range variants use the last one.
pub fn user_prompt(variant: usize) -> &'static str {
    USER_PROMPTS[variant.min(USER_PROMPTS.len() - 1)]
}
