/// Events emitted while a session runs.
/// The presentation layer consumes these for the console trace.

use crate::agent::Usage;
use crate::domain::rules::MoveResult;
use super::tool::Tool;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEvent {
    /// A read-only query was answered.
    Checked { step: usize, tool: Tool, text: String },
    Moved { step: usize, result: MoveResult },
    Blocked { step: usize, result: MoveResult },
    UnknownTool { step: usize, name: String },
    ServiceError { iteration: usize, consecutive: usize, message: String },
    Usage { iteration: usize, usage: Usage },
    TargetReached { step: usize },
}
