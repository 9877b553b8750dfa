use std::sync::{Arc, RwLock};

use super::{Board, BoardId, BoardStore, Item};
use crate::error::{BoardError, Result};

/// Board store kept in memory.
///
/// Clones share the same boards, so a caller can hold one handle and edit
/// boards "externally" while the engine holds another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBoardStore {
    boards: Arc<RwLock<Vec<Board>>>,
}

impl MemoryBoardStore {
    pub fn new(boards: Vec<Board>) -> Self {
        Self {
            boards: Arc::new(RwLock::new(boards)),
        }
    }

    pub fn add_board(&self, board: Board) {
        self.write().push(board);
    }

    pub fn remove_board(&self, id: &BoardId) -> bool {
        let mut boards = self.write();
        let before = boards.len();
        boards.retain(|b| &b.id != id);
        boards.len() != before
    }

    pub fn board(&self, id: &BoardId) -> Option<Board> {
        self.read().iter().find(|b| &b.id == id).cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Board>> {
        self.boards.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Board>> {
        self.boards.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl BoardStore for MemoryBoardStore {
    fn boards(&self) -> Vec<Board> {
        self.read().clone()
    }

    fn replace_items(&mut self, board: &BoardId, items: Vec<Arc<Item>>) -> Result<()> {
        let mut boards = self.write();
        let target = boards
            .iter_mut()
            .find(|b| &b.id == board)
            .ok_or_else(|| BoardError::NotFound(board.to_string()))?;
        target.items = items;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let store = MemoryBoardStore::new(vec![Board::new("b", "B", vec![Item::new("i", "x")])]);
        let mut handle = store.clone();
        handle
            .replace_items(&BoardId::from("b"), vec![Arc::new(Item::new("j", "y"))])
            .unwrap();
        assert_eq!(store.boards()[0].items[0].id.as_str(), "j");
    }

    #[test]
    fn replace_unknown_board_fails() {
        let mut store = MemoryBoardStore::default();
        let err = store.replace_items(&BoardId::from("nope"), Vec::new());
        assert!(err.is_err());
    }
}
