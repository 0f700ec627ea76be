/// Agent driver seam.
///
/// The session never knows which model is on the other end. It keeps a
/// provider-neutral transcript, hands it to an [`AgentDriver`] together with
/// the tool declarations, and gets back either tool calls or a final text.

pub mod llm;
pub mod prompt;

use crate::error::DriverError;

/// A tool the agent may call. All tools take no arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// One function call requested by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Provider call id. OpenAI ids are synthesized when missing; Gemini
    /// ids stay empty when the model assigns none.
    pub id: String,
    pub name: String,
}

/// What the session sends back for one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolReply {
    Result(String),
    Error(String),
}

impl ToolReply {
    pub fn text(&self) -> &str {
        match self {
            ToolReply::Result(t) | ToolReply::Error(t) => t,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolResponse {
    pub call_id: String,
    pub name: String,
    pub reply: ToolReply,
}

/// One entry of the conversation.
#[derive(Clone, Debug, PartialEq)]
pub enum Turn {
    User(String),
    Model {
        text: Option<String>,
        calls: Vec<ToolInvocation>,
        /// Provider-native content, echoed back verbatim when present.
        raw: Option<serde_json::Value>,
    },
    ToolResults(Vec<ToolResponse>),
}

/// Everything a driver needs to produce the next turn.
pub struct TurnRequest<'a> {
    pub system: &'a str,
    pub transcript: &'a [Turn],
    pub tools: &'a [ToolSpec],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// The model's answer to one request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentTurn {
    pub text: Option<String>,
    pub calls: Vec<ToolInvocation>,
    pub usage: Option<Usage>,
    pub raw: Option<serde_json::Value>,
}

impl AgentTurn {
    /// The transcript entry recording this turn.
    pub fn to_turn(&self) -> Turn {
        Turn::Model {
            text: self.text.clone(),
            calls: self.calls.clone(),
            raw: self.raw.clone(),
        }
    }
}

/// Something that decides the next action.
pub trait AgentDriver {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn next_turn(&mut self, request: &TurnRequest<'_>) -> Result<AgentTurn, DriverError>;
}
