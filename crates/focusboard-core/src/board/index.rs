use std::collections::HashMap;

use super::{Board, BoardId, Item, ItemId};
use std::sync::Arc;

/// Where an item lives: its board and the child-index path from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLocation {
    pub board: BoardId,
    pub path: Vec<usize>,
}

/// `ItemId -> ItemLocation` for a set of board snapshots.
///
/// Built once per pass instead of walking every tree per lookup. Ids are
/// expected to be unique across boards; if one repeats, the first board in
/// snapshot order wins.
#[derive(Debug, Clone, Default)]
pub struct BoardIndex {
    locations: HashMap<ItemId, ItemLocation>,
}

impl BoardIndex {
    pub fn build(boards: &[Board]) -> Self {
        let mut index = Self::default();
        for board in boards {
            let mut path = Vec::new();
            index.visit(&board.id, &board.items, &mut path);
        }
        index
    }

    fn visit(&mut self, board: &BoardId, items: &[Arc<Item>], path: &mut Vec<usize>) {
        for (i, item) in items.iter().enumerate() {
            path.push(i);
            self.locations
                .entry(item.id.clone())
                .or_insert_with(|| ItemLocation {
                    board: board.clone(),
                    path: path.clone(),
                });
            self.visit(board, &item.children, path);
            path.pop();
        }
    }

    pub fn locate(&self, item: &ItemId) -> Option<&ItemLocation> {
        self.locations.get(item)
    }

    pub fn board_of(&self, item: &ItemId) -> Option<&BoardId> {
        self.locate(item).map(|loc| &loc.board)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Look up an item's current title across a set of boards.
pub(crate) fn find_title(boards: &[Board], index: &BoardIndex, item: &ItemId) -> Option<String> {
    let loc = index.locate(item)?;
    boards
        .iter()
        .find(|b| b.id == loc.board)?
        .item_at(&loc.path)
        .map(Item::title)
}
