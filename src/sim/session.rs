/// The session loop: the agent drives, the run state answers.
///
/// Processing order per iteration:
///   1. Stop confirmation (every `confirm_every` iterations, never at 0)
///   2. Request the next agent turn
///   3. Driver failure → count, give up after `max_service_retries` in a row
///   4. No tool calls → final answer, run ends
///   5. Dispatch every tool call in order, one event per call
///   6. Append the model turn and the tool results to the transcript
///
/// The session owns the run state and the transcript. Nothing else
/// mutates either while a run is in progress.

use tracing::{debug, info, warn};

use crate::agent::{AgentDriver, ToolReply, ToolResponse, ToolSpec, Turn, TurnRequest};
use crate::config::RunConfig;
use crate::domain::report;
use super::event::RunEvent;
use super::tool::{self, Tool};
use super::world::RunState;

/// The human side of a run: watches events and may stop it.
pub trait Operator {
    /// Asked every `confirm_every` iterations. `true` ends the run.
    fn should_stop(&mut self, iteration: usize) -> bool;

    fn on_event(&mut self, event: &RunEvent, state: &RunState);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The agent stopped calling tools and answered.
    FinalAnswer(String),
    /// The agent stopped calling tools without saying anything.
    EmptyAnswer,
    StoppedByOperator,
    BudgetExhausted,
    /// Too many consecutive driver failures; carries the last error.
    ServiceUnavailable(String),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::FinalAnswer(_) | RunOutcome::EmptyAnswer => 0,
            RunOutcome::StoppedByOperator
            | RunOutcome::BudgetExhausted
            | RunOutcome::ServiceUnavailable(_) => 1,
        }
    }
}

pub struct Session {
    state: RunState,
    system: String,
    transcript: Vec<Turn>,
    tools: Vec<ToolSpec>,
    limits: RunConfig,
    steps: usize,
    target_announced: bool,
}

impl Session {
    /// Seed the transcript with the user prompt, the positions and the
    /// map as known after the initial reveal.
    pub fn new(state: RunState, system: &str, user_prompt: &str, limits: RunConfig) -> Self {
        let transcript = vec![
            Turn::User(user_prompt.to_string()),
            Turn::User(report::positions(state.drone(), state.target())),
            Turn::User(report::map_snapshot(state.knowledge())),
        ];
        Session {
            state,
            system: system.to_string(),
            transcript,
            tools: tool::declarations(),
            limits,
            steps: 0,
            target_announced: false,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Tool calls executed so far, unknown ones included.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn run(&mut self, driver: &mut dyn AgentDriver, operator: &mut dyn Operator) -> RunOutcome {
        info!(
            level = self.state.level_name(),
            driver = driver.name(),
            max_iterations = self.limits.max_iterations,
            "run started"
        );
        let mut failures = 0;

        for iteration in 0..self.limits.max_iterations {
            let confirm = self.limits.confirm_every;
            if confirm > 0 && iteration > 0 && iteration % confirm == 0 && operator.should_stop(iteration) {
                info!(iteration, "run stopped by operator");
                return RunOutcome::StoppedByOperator;
            }

            let request = TurnRequest {
                system: &self.system,
                transcript: &self.transcript,
                tools: &self.tools,
            };
            let turn = match driver.next_turn(&request) {
                Ok(turn) => turn,
                Err(e) => {
                    failures += 1;
                    warn!(
                        iteration,
                        consecutive = failures,
                        overloaded = e.is_overloaded(),
                        "agent request failed: {e}"
                    );
                    operator.on_event(
                        &RunEvent::ServiceError { iteration, consecutive: failures, message: e.to_string() },
                        &self.state,
                    );
                    if failures >= self.limits.max_service_retries {
                        return RunOutcome::ServiceUnavailable(e.to_string());
                    }
                    continue;
                }
            };
            failures = 0;

            if let Some(usage) = turn.usage {
                debug!(iteration, prompt = usage.prompt_tokens, completion = usage.completion_tokens, "token usage");
                operator.on_event(&RunEvent::Usage { iteration, usage }, &self.state);
            }

            if turn.calls.is_empty() {
                info!(iteration, moves = self.state.moves(), reached = self.state.reached_target(), "agent finished");
                return match turn.text {
                    Some(text) if !text.trim().is_empty() => RunOutcome::FinalAnswer(text),
                    _ => RunOutcome::EmptyAnswer,
                };
            }

            let mut results = Vec::with_capacity(turn.calls.len());
            for call in &turn.calls {
                let reply = self.dispatch(&call.name, operator);
                results.push(ToolResponse { call_id: call.id.clone(), name: call.name.clone(), reply });
            }
            self.transcript.push(turn.to_turn());
            self.transcript.push(Turn::ToolResults(results));
        }

        info!(moves = self.state.moves(), "iteration budget exhausted");
        RunOutcome::BudgetExhausted
    }

    fn dispatch(&mut self, name: &str, operator: &mut dyn Operator) -> ToolReply {
        self.steps += 1;
        let step = self.steps;

        let Some(tool) = Tool::from_name(name) else {
            warn!(step, name, "unknown tool requested");
            operator.on_event(&RunEvent::UnknownTool { step, name: name.to_string() }, &self.state);
            return ToolReply::Error(format!("Unknown function: {name}"));
        };

        let output = tool::execute(tool, &mut self.state);
        debug!(step, tool = tool.name(), "tool executed");

        let event = match output.movement.clone() {
            Some(result) if result.success() => RunEvent::Moved { step, result },
            Some(result) => RunEvent::Blocked { step, result },
            None => RunEvent::Checked { step, tool, text: output.text() },
        };
        operator.on_event(&event, &self.state);

        if self.state.reached_target() && !self.target_announced {
            self.target_announced = true;
            info!(step, moves = self.state.moves(), "target reached");
            operator.on_event(&RunEvent::TargetReached { step }, &self.state);
        }

        ToolReply::Result(output.text())
    }
}
