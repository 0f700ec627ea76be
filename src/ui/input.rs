/// Console prompts and the interactive operator.
///
/// Everything reads from a `BufRead` and writes to a `Write`, so the same
/// code drives stdin/stdout in the binary and in-memory buffers in tests.
/// End of input is treated as "no answer": menus return `None`, the stop
/// confirmation returns `false`.

use std::io::{self, BufRead, Write};

use crate::domain::grid::Position;
use crate::domain::map::GroundTruth;
use crate::domain::report;
use crate::sim::event::RunEvent;
use crate::sim::level::{parse_placement, LevelInfo};
use crate::sim::session::Operator;
use crate::sim::tool::Tool;
use crate::sim::world::RunState;
use super::renderer;

/// Read one line; `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> io::Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;
    read_line(input)
}

// ── Level menu ──

/// List the levels and ask for one by number until a valid index is typed.
pub fn choose_level<R: BufRead, W: Write>(
    levels: &[LevelInfo],
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<usize>> {
    loop {
        writeln!(out, "Available level:")?;
        for (i, level) in levels.iter().enumerate() {
            writeln!(out, "{i}: {}", level.name)?;
        }
        let Some(answer) = prompt(input, out, "Which level (input the number)? ")? else {
            return Ok(None);
        };
        match answer.trim().parse::<usize>() {
            Ok(i) if i < levels.len() => return Ok(Some(i)),
            _ => continue,
        }
    }
}

// ── Placement ──

/// Ask for drone start and target as 1-based `row,col`. Invalid input
/// explains itself and asks again from the start.
pub fn ask_placement<R: BufRead, W: Write>(
    truth: &GroundTruth,
    color: bool,
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<(Position, Position)>> {
    let grid = truth.grid();
    let nowhere = Position::new(usize::MAX, usize::MAX);
    loop {
        writeln!(out, "{}", renderer::render_grid(grid, nowhere, nowhere, color))?;
        writeln!(out, "The level has {} rows and {} columns.", grid.rows(), grid.cols())?;

        let Some(answer) = prompt(input, out, "Where should the drone start (input as row,col)? ")? else {
            return Ok(None);
        };
        let start = match parse_placement(&answer, truth) {
            Ok(pos) => pos,
            Err(e) => {
                writeln!(out, "Drone position not valid: {e}. Try again:")?;
                continue;
            }
        };

        let Some(answer) = prompt(input, out, "Where should the target be (input as row,col)? ")? else {
            return Ok(None);
        };
        match parse_placement(&answer, truth) {
            Ok(target) => return Ok(Some((start, target))),
            Err(e) => writeln!(out, "Target position not valid: {e}. Try again:")?,
        }
    }
}

// ── Operator ──

/// Prints one line per tool call, the drone's map after every move, and
/// asks the stop question on the configured interval.
pub struct ConsoleOperator<R, W> {
    input: R,
    out: W,
    color: bool,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, out: W, color: bool) -> Self {
        ConsoleOperator { input, out, color }
    }

    fn show_event(&mut self, event: &RunEvent, state: &RunState) -> io::Result<()> {
        match event {
            RunEvent::Checked { step, tool, .. } => {
                let what = match tool {
                    Tool::CheckPositions => "Verify coordinates.",
                    Tool::CheckMap => "Review the map.",
                    _ => "Check free directions.",
                };
                writeln!(self.out, "Step {step}: {what}")
            }
            RunEvent::Moved { step, result } | RunEvent::Blocked { step, result } => {
                let verdict = if result.success() { "" } else { " (blocked)" };
                writeln!(
                    self.out,
                    "Step {step}: Move {} ({}){verdict}:",
                    result.direction,
                    result.direction.screen_hint()
                )?;
                let map = renderer::render_grid(
                    state.knowledge().grid(),
                    state.drone(),
                    state.target(),
                    self.color,
                );
                writeln!(self.out, "{map}")?;
                writeln!(self.out, "Open spaces: {}", report::walkable(&state.walkable()))
            }
            RunEvent::UnknownTool { step, name } => {
                writeln!(self.out, "Step {step}: Tried to use function {name}. It does not exist.")
            }
            RunEvent::ServiceError { consecutive, message, .. } => {
                writeln!(self.out, "Model request failed ({consecutive} in a row): {message}")
            }
            RunEvent::TargetReached { step } => {
                writeln!(self.out, "Step {step}: Target reached after {} moves.", state.moves())
            }
            RunEvent::Usage { .. } => Ok(()),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.out)
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn should_stop(&mut self, _iteration: usize) -> bool {
        match prompt(&mut self.input, &mut self.out, "End pathfinding? (y/n) ") {
            Ok(Some(answer)) => answer.trim().eq_ignore_ascii_case("y"),
            _ => false,
        }
    }

    fn on_event(&mut self, event: &RunEvent, state: &RunState) {
        // Console output is best effort.
        let _ = self.show_event(event, state);
    }
}
