use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;
use tokio::sync::watch;

use focusboard_core::timer::ticker;
use focusboard_core::{
    BoardIndex, Completion, FocusSession, ItemId, ReasonRequest, StartOutcome, StopOutcome,
    TimerEngine, TimerMode, TimerStatus, Toggled,
};

use super::Workspace;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start timing an item
    Start {
        /// Timer mode: stopwatch or pomodoro
        #[arg(long, default_value = "stopwatch")]
        mode: TimerMode,
        /// Item id (see `board items`)
        item: String,
    },
    /// Stop the running timer
    Stop {
        /// Record the session with this reason right away
        #[arg(long, conflicts_with = "no_ask")]
        reason: Option<String>,
        /// Record the session without asking for a reason
        #[arg(long)]
        no_ask: bool,
    },
    /// Answer a pending stop with a reason
    Reason {
        reason: String,
    },
    /// Dismiss a pending stop and keep timing
    Cancel,
    /// Stop if running, otherwise start
    Toggle {
        #[arg(long, default_value = "stopwatch")]
        mode: TimerMode,
        item: String,
    },
    /// Record the current session and continue in the other mode
    Switch,
    /// Print current timer state as JSON
    Status,
    /// Print the timer state every second until it stops
    Watch,
    /// Discard the current session and go idle
    Reset,
}

#[derive(Serialize)]
struct Report {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<FocusSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<ReasonRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    completed: Vec<Completion>,
    status: TimerStatus,
}

impl Report {
    fn new(outcome: &'static str, engine: &TimerEngine) -> Self {
        Self {
            outcome,
            session: None,
            prompt: None,
            completed: Vec::new(),
            status: engine.status(),
        }
    }

    fn print(self) -> Result<(), Box<dyn Error>> {
        println!("{}", serde_json::to_string_pretty(&self)?);
        Ok(())
    }
}

fn known_item(engine: &TimerEngine, item: &str) -> Result<ItemId, Box<dyn Error>> {
    let id = ItemId::from(item);
    if BoardIndex::build(&engine.boards()).locate(&id).is_none() {
        return Err(format!("unknown item: {item}").into());
    }
    Ok(id)
}

fn start_outcome(outcome: StartOutcome) -> &'static str {
    match outcome {
        StartOutcome::Started => "started",
        StartOutcome::AlreadyRunning => "already_running",
        StartOutcome::AwaitingDecision => "awaiting_reason",
    }
}

fn stop_report(outcome: StopOutcome, engine: &TimerEngine) -> Report {
    match outcome {
        StopOutcome::NotRunning => Report::new("not_running", engine),
        StopOutcome::AlreadyAwaiting => Report::new("awaiting_reason", engine),
        StopOutcome::Finalized(session) => Report {
            session: Some(session),
            ..Report::new("stopped", engine)
        },
        StopOutcome::AwaitingReason(request) => Report {
            prompt: Some(request),
            ..Report::new("awaiting_reason", engine)
        },
    }
}

pub fn run(boards: &[PathBuf], action: TimerAction) -> Result<(), Box<dyn Error>> {
    let mut ws = Workspace::open(boards)?;

    if let TimerAction::Watch = action {
        return watch_loop(ws);
    }

    // Complete whatever ran out while no process was ticking.
    let completed = ws.engine.tick_until_idle();
    let engine = &mut ws.engine;
    let mut report = match action {
        TimerAction::Start { mode, item } => {
            let id = known_item(engine, &item)?;
            let outcome = engine.start(mode, Some(id))?;
            Report::new(start_outcome(outcome), engine)
        }
        TimerAction::Stop { reason, no_ask } => {
            let outcome = engine.stop(!no_ask);
            match (reason, outcome) {
                (Some(reason), StopOutcome::AwaitingReason(_)) => {
                    let session = engine.resolve_with_reason(&reason)?;
                    Report {
                        session: Some(session),
                        ..Report::new("stopped", engine)
                    }
                }
                (_, outcome) => stop_report(outcome, engine),
            }
        }
        TimerAction::Reason { reason } => {
            let session = engine.resolve_with_reason(&reason)?;
            Report {
                session: Some(session),
                ..Report::new("stopped", engine)
            }
        }
        TimerAction::Cancel => {
            engine.resolve_cancelled()?;
            Report::new("resumed", engine)
        }
        TimerAction::Toggle { mode, item } => {
            let id = known_item(engine, &item)?;
            match engine.toggle(mode, Some(id))? {
                Toggled::Start(outcome) => Report::new(start_outcome(outcome), engine),
                Toggled::Stop(outcome) => stop_report(outcome, engine),
            }
        }
        TimerAction::Switch => {
            let outcome = engine.switch_mode()?;
            Report::new(start_outcome(outcome), engine)
        }
        TimerAction::Status | TimerAction::Watch => Report::new("status", engine),
        TimerAction::Reset => {
            let mode = engine.state().mode;
            let target = engine.state().target.clone();
            engine.reset(mode, target);
            Report::new("reset", engine)
        }
    };
    report.completed = completed;

    ws.save()?;
    report.print()
}

/// Tick in the background and print one status line per second until the
/// timer stops or Ctrl-C is pressed.
fn watch_loop(ws: Workspace) -> Result<(), Box<dyn Error>> {
    let (engine, state) = ws.into_parts();
    let engine = Arc::new(Mutex::new(engine));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ticking = tokio::spawn(ticker::run(
            Arc::clone(&engine),
            ticker::TICK_INTERVAL,
            shutdown_rx,
            |done| {
                if let Ok(line) = serde_json::to_string(done) {
                    println!("{line}");
                }
            },
        ));

        let mut every_second = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = every_second.tick() => {
                    let status = engine.lock().unwrap_or_else(|e| e.into_inner()).status();
                    if let Ok(line) = serde_json::to_string(&status) {
                        println!("{line}");
                    }
                    if !status.running {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        let _ = shutdown_tx.send(true);
        if let Err(e) = ticking.await {
            tracing::warn!(error = %e, "ticker task failed");
        }
    });

    let engine = Arc::try_unwrap(engine)
        .map_err(|_| "timer is still shared")?
        .into_inner()
        .unwrap_or_else(|e| e.into_inner());
    Workspace::from_parts(engine, state).save()
}
