/// Entry point: pick a level, place drone and target, hand the drone to
/// the model and report how it went.

mod agent;
mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::io::{self, IsTerminal, Write};
use std::process;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use agent::llm::{api_key_from_env, create_backend};
use agent::prompt::{user_prompt, SYSTEM_PROMPT};
use config::AppConfig;
use sim::level::{load_level, scan_levels};
use sim::session::{RunOutcome, Session};
use sim::world::RunState;
use ui::input::{ask_placement, choose_level, ConsoleOperator};
use ui::renderer::render_grid;

fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let config = AppConfig::load();
    info!(
        backend = ?config.agent.backend,
        model = config.agent.model,
        levels_dir = %config.levels_dir.display(),
        "configuration loaded"
    );

    process::exit(run(&config));
}

/// Interactive flow; returns the process exit code.
fn run(config: &AppConfig) -> i32 {
    let color = io::stdout().is_terminal();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let api_key = match api_key_from_env(&config.agent) {
        Ok(key) => key,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            return 1;
        }
    };
    let mut backend = match create_backend(&config.agent, api_key) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let levels = scan_levels(&config.levels_dir);
    if levels.is_empty() {
        println!("No levels found!");
        return 1;
    }
    let Ok(Some(index)) = choose_level(&levels, &mut input, &mut out) else {
        return 1;
    };

    let level = match load_level(&levels[index]) {
        Ok(level) => level,
        Err(e) => {
            error!(level = levels[index].name, "{e}");
            println!("Level file corrupt");
            return 1;
        }
    };

    let Ok(Some((start, target))) = ask_placement(&level.truth, color, &mut input, &mut out) else {
        return 1;
    };

    let state = RunState::new(level.name, level.truth, start, target);
    println!("Map visible to the drone:");
    println!("{}", render_grid(state.knowledge().grid(), state.drone(), state.target(), color));

    let mut session = Session::new(
        state,
        SYSTEM_PROMPT,
        user_prompt(config.agent.prompt_variant),
        config.run,
    );
    let mut operator = ConsoleOperator::new(input, out, color);
    let outcome = session.run(&mut backend, &mut operator);
    info!(
        outcome = ?outcome,
        turns = session.transcript().len(),
        steps = session.steps(),
        "run finished"
    );

    report_outcome(&outcome, session.state(), session.steps());
    let _ = io::stdout().flush();
    outcome.exit_code()
}

fn report_outcome(outcome: &RunOutcome, state: &RunState, steps: usize) {
    match outcome {
        RunOutcome::FinalAnswer(text) => {
            println!("Response:");
            println!("{text}");
        }
        RunOutcome::EmptyAnswer => {
            println!("Response:");
            println!("No response, the model ended without an answer.");
        }
        RunOutcome::StoppedByOperator => println!("User stopped search!"),
        RunOutcome::BudgetExhausted => println!("The model did not reach a final response!"),
        RunOutcome::ServiceUnavailable(e) => {
            println!("Model is unavailable. Try again later. ({e})");
        }
    }

    let path: Vec<String> = state.path().iter().map(|p| format!("({})", p.one_based())).collect();
    println!();
    println!(
        "Tool calls: {steps}, moves: {}, rejected moves: {}, cells known: {}, target reached: {}",
        state.moves(),
        state.rejected_moves(),
        state.knowledge().known_count(),
        if state.reached_target() { "yes" } else { "no" },
    );
    println!("Drone path: {}", path.join(" "));
}
