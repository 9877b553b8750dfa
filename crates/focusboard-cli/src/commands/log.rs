use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use serde_json::json;

use focusboard_core::stats::{format_focused, DayReport};
use focusboard_core::ItemId;

use super::Workspace;

#[derive(Subcommand)]
pub enum LogAction {
    /// Total focused time for one item
    Total {
        item: String,
    },
    /// Sessions started on one day
    Day {
        /// Date in YYYY-MM-DD format (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Focused time per day
    Daily,
    /// Focused time per item
    Items,
    /// Read every board's session lines again
    Reparse,
}

pub fn run(boards: &[PathBuf], action: LogAction) -> Result<(), Box<dyn Error>> {
    let Workspace { mut engine, .. } = Workspace::open(boards)?;

    let output = match action {
        LogAction::Total { item } => {
            let focused_ms = engine.total_focused_ms(&ItemId::from(item.as_str()));
            json!({
                "item": item,
                "focused_ms": focused_ms,
                "focused": format_focused(focused_ms),
            })
        }
        LogAction::Day { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            serde_json::to_value(DayReport::build(engine.sessions(), date))?
        }
        LogAction::Daily => serde_json::to_value(engine.daily_totals())?,
        LogAction::Items => serde_json::to_value(engine.item_totals())?,
        LogAction::Reparse => {
            let added = engine.force_reparse();
            json!({ "added": added, "sessions": engine.sessions().len() })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
