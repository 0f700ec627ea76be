/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.lvl` files, sorted by name)
///   2. Built-in embedded levels
///
/// ## Level format (`.lvl`):
///   One map row per line. Only the line terminator is stripped, so rows
///   may start or end with free cells. Trailing empty lines are ignored.
///
/// ## Cell legend:
///   ' ' = Free        'X' = Wall
///
/// Everything else is rejected: the run never starts on a corrupt map.

use std::path::{Path, PathBuf};

use crate::domain::cell::CellKind;
use crate::domain::grid::{Grid, GridError, Position};
use crate::domain::map::GroundTruth;

pub const LEVEL_EXTENSION: &str = "lvl";

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown cell {ch:?} at row {row}, column {col}")]
    UnknownCell { row: usize, col: usize, ch: char },
    #[error("level file corrupt: {0}")]
    Shape(#[from] GridError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("expected row,col but got {0:?}")]
    Malformed(String),
    #[error("{0} is outside the level")]
    OutOfBounds(String),
    #[error("{0} is not in open space")]
    NotFree(String),
}

/// Where a level comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelSource {
    File(PathBuf),
    Embedded(usize),
}

/// An entry in the level menu.
#[derive(Clone, Debug)]
pub struct LevelInfo {
    pub name: String,
    pub source: LevelSource,
}

/// A parsed, validated level.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub truth: GroundTruth,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// List the levels in `dir`, falling back to the embedded set when the
/// directory is missing or has no level files.
pub fn scan_levels(dir: &Path) -> Vec<LevelInfo> {
    let mut files: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().map_or(false, |x| x == LEVEL_EXTENSION))
            .collect(),
        Err(_) => vec![],
    };
    files.sort();

    if files.is_empty() {
        return embedded_levels()
            .iter()
            .enumerate()
            .map(|(i, level)| LevelInfo {
                name: level.name.to_string(),
                source: LevelSource::Embedded(i),
            })
            .collect();
    }

    files
        .into_iter()
        .map(|path| LevelInfo {
            name: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            source: LevelSource::File(path),
        })
        .collect()
}

pub fn load_level(info: &LevelInfo) -> Result<LevelDef, LevelError> {
    let truth = match &info.source {
        LevelSource::File(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|source| LevelError::Io { path: path.clone(), source })?;
            parse_level(&text)?
        }
        LevelSource::Embedded(idx) => {
            let rows = embedded_levels()
                .get(*idx)
                .map(|level| level.rows.join("\n"))
                .unwrap_or_default();
            parse_level(&rows)?
        }
    };
    Ok(LevelDef { name: info.name.clone(), truth })
}

/// Parse level text into a validated ground truth.
pub fn parse_level(text: &str) -> Result<GroundTruth, LevelError> {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }

    let mut rows = Vec::with_capacity(lines.len());
    for (row, line) in lines.iter().enumerate() {
        let mut cells = Vec::with_capacity(line.len());
        for (col, ch) in line.chars().enumerate() {
            let kind = CellKind::from_level_char(ch)
                .ok_or(LevelError::UnknownCell { row, col, ch })?;
            cells.push(kind);
        }
        rows.push(cells);
    }

    Ok(GroundTruth::new(Grid::from_rows(rows)?)?)
}

/// Parse an operator-typed `row,col` (1-based) and check it lands on a
/// free cell of `truth`.
pub fn parse_placement(input: &str, truth: &GroundTruth) -> Result<Position, PlacementError> {
    let malformed = || PlacementError::Malformed(input.trim().to_string());
    let (r, c) = input.trim().split_once(',').ok_or_else(malformed)?;
    let row: usize = r.trim().parse().map_err(|_| malformed())?;
    let col: usize = c.trim().parse().map_err(|_| malformed())?;

    let label = format!("{row},{col}");
    if row == 0 || col == 0 {
        return Err(PlacementError::OutOfBounds(label));
    }
    let pos = Position::new(row - 1, col - 1);
    match truth.kind_at(pos) {
        None => Err(PlacementError::OutOfBounds(label)),
        Some(CellKind::Free) => Ok(pos),
        Some(_) => Err(PlacementError::NotFree(label)),
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

struct Embedded {
    name: &'static str,
    rows: &'static [&'static str],
}

fn embedded_levels() -> &'static [Embedded] {
    &[
        Embedded { name: "Courtyard (built-in)", rows: &[
            "X X ",
            "  X ",
            " XX ",
            "    ",
        ] },
        Embedded { name: "Switchbacks (built-in)", rows: &[
            "            X       ",
            " XXXXXXXXX  X XXXXX ",
            "         X  X     X ",
            "XXXXXXX  X  XXXXX X ",
            "      X  X      X X ",
            " XXXX X  XXXXXX X X ",
            " X    X       X X   ",
            " X XXXXXXXXX  X XXXX",
            " X         X  X     ",
            " XXXXXXXX  X  XXXXX ",
            "        X  X        ",
            "XXXXXX  X  XXXXXXXX ",
            "        X           ",
        ] },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_without_trimming_spaces() {
        let truth = parse_level("X X \n  X \n XX \n    \n").unwrap();
        assert_eq!(truth.grid().rows(), 4);
        assert_eq!(truth.grid().cols(), 4);
        assert_eq!(truth.kind_at(Position::new(0, 3)), Some(CellKind::Free));
        assert_eq!(truth.kind_at(Position::new(2, 1)), Some(CellKind::Wall));
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let truth = parse_level("X \r\n X\r\n").unwrap();
        assert_eq!(truth.grid().to_lines(), vec!["X ", " X"]);
    }

    #[test]
    fn rejects_ragged_level() {
        let err = parse_level("XXX\nX\nXXX").unwrap_err();
        assert!(matches!(
            err,
            LevelError::Shape(GridError::Ragged { row: 1, expected: 3, found: 1 })
        ));
    }

    #[test]
    fn rejects_unknown_cells() {
        let err = parse_level("X?X\n   ").unwrap_err();
        assert!(matches!(err, LevelError::UnknownCell { row: 0, col: 1, ch: '?' }));
    }

    #[test]
    fn rejects_empty_level() {
        assert!(matches!(parse_level("\n\n").unwrap_err(), LevelError::Shape(GridError::Empty)));
    }

    #[test]
    fn leading_blank_line_is_ragged_not_empty() {
        let err = parse_level("\nXX\nXX").unwrap_err();
        assert!(matches!(
            err,
            LevelError::Shape(GridError::Ragged { row: 0, expected: 2, found: 0 })
        ));
    }

    #[test]
    fn placement_is_one_based_and_must_be_free() {
        let truth = parse_level("X X \n  X \n XX \n    ").unwrap();
        assert_eq!(parse_placement("4,1", &truth), Ok(Position::new(3, 0)));
        assert_eq!(parse_placement(" 1 , 4 ", &truth), Ok(Position::new(0, 3)));
        assert_eq!(parse_placement("1,1", &truth), Err(PlacementError::NotFree("1,1".into())));
        assert_eq!(parse_placement("5,1", &truth), Err(PlacementError::OutOfBounds("5,1".into())));
        assert_eq!(parse_placement("0,2", &truth), Err(PlacementError::OutOfBounds("0,2".into())));
        assert!(matches!(parse_placement("a,b", &truth), Err(PlacementError::Malformed(_))));
        assert!(matches!(parse_placement("3", &truth), Err(PlacementError::Malformed(_))));
    }

    #[test]
    fn embedded_levels_are_valid() {
        for (i, level) in embedded_levels().iter().enumerate() {
            let info = LevelInfo { name: level.name.to_string(), source: LevelSource::Embedded(i) };
            assert!(load_level(&info).is_ok(), "{}", level.name);
        }
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let levels = scan_levels(Path::new("/definitely/not/a/levels/dir"));
        assert_eq!(levels.len(), embedded_levels().len());
        assert!(levels.iter().all(|l| matches!(l.source, LevelSource::Embedded(_))));
    }

    #[test]
    fn scans_lvl_files_sorted() {
        let dir = std::env::temp_dir().join(format!("fogdrone_levels_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.lvl"), "  \n  \n").unwrap();
        std::fs::write(dir.join("a.lvl"), "X \n  \n").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let levels = scan_levels(&dir);
        let names: Vec<_> = levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["a.lvl", "b.lvl"]);
        let def = load_level(&levels[0]).unwrap();
        assert_eq!(def.truth.kind_at(Position::new(0, 0)), Some(CellKind::Wall));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
