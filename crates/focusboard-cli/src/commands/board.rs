use std::error::Error;
use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

use focusboard_core::board::collect_items;
use focusboard_core::ItemId;

use super::Workspace;

#[derive(Subcommand)]
pub enum BoardAction {
    /// List every item id and title
    Items,
}

#[derive(Serialize)]
struct Listed {
    board: String,
    id: ItemId,
    title: String,
}

pub fn run(boards: &[PathBuf], action: BoardAction) -> Result<(), Box<dyn Error>> {
    let ws = Workspace::open(boards)?;
    match action {
        BoardAction::Items => {
            let items: Vec<Listed> = ws
                .engine
                .boards()
                .iter()
                .flat_map(|board| {
                    collect_items(board).into_iter().map(|(id, title)| Listed {
                        board: board.name.clone(),
                        id,
                        title,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }
    Ok(())
}
