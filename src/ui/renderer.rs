/// Presentation layer: grid renderer.
///
/// How it works:
///   1. Compose the grid into rows of `Glyph` (character + optional color)
///   2. Emit terminal commands with `queue!`, flushed once at the end
///
/// Markers override the cell underneath:
///   D (red)  : drone
///   T (cyan) : target
///   D (green): drone standing on the target
///
/// The plain variant drops the colors and is what tests and logs use.

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

use crate::domain::grid::{Grid, Position};

// ── Glyph: the unit of a composed frame ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Option<Color>,
}

const DRONE_FG: Color = Color::Red;
const TARGET_FG: Color = Color::Cyan;
const ARRIVED_FG: Color = Color::Green;

fn compose(grid: &Grid, drone: Position, target: Position) -> Vec<Vec<Glyph>> {
    grid.row_cells()
        .enumerate()
        .map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    let pos = Position::new(row, col);
                    match (pos == drone, pos == target) {
                        (true, true) => Glyph { ch: 'D', fg: Some(ARRIVED_FG) },
                        (true, false) => Glyph { ch: 'D', fg: Some(DRONE_FG) },
                        (false, true) => Glyph { ch: 'T', fg: Some(TARGET_FG) },
                        (false, false) => Glyph { ch: cell.symbol(), fg: None },
                    }
                })
                .collect()
        })
        .collect()
}

/// Write the grid with colored markers to `out`. Rows are separated by
/// `\n`; there is no trailing newline.
pub fn draw<W: Write>(out: &mut W, grid: &Grid, drone: Position, target: Position) -> io::Result<()> {
    for (i, row) in compose(grid, drone, target).iter().enumerate() {
        if i > 0 {
            queue!(out, Print('\n'))?;
        }
        for glyph in row {
            match glyph.fg {
                Some(fg) => queue!(out, SetForegroundColor(fg), Print(glyph.ch), ResetColor)?,
                None => queue!(out, Print(glyph.ch))?,
            }
        }
    }
    out.flush()
}

/// Render to a string, colored or plain.
pub fn render_grid(grid: &Grid, drone: Position, target: Position, color: bool) -> String {
    if !color {
        return compose(grid, drone, target)
            .iter()
            .map(|row| row.iter().map(|g| g.ch).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
    }
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = draw(&mut buf, grid, drone, target);
    String::from_utf8_lossy(&buf).into_owned()
}
