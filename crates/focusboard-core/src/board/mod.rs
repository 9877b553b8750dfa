//! Boards and the items they hold.
//!
//! A board is a forest of items: lanes at the top level, cards below them,
//! arbitrarily deep. Item bodies are raw text; the first line is the title
//! and focus sessions are logged as extra lines underneath.
//!
//! Boards are immutable snapshots. Edits go through [`update_at_path`],
//! which rebuilds only the ancestors of the edited item and shares every
//! other subtree, and are committed with [`BoardStore::replace_items`].

mod index;
mod memory;

pub(crate) use index::find_title;
pub use index::{BoardIndex, ItemLocation};
pub use memory::MemoryBoardStore;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(BoardId);
string_id!(ItemId);

/// One entity on a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    /// Raw text. First line is the title.
    pub body: String,
    pub checked: bool,
    pub children: Vec<Arc<Item>>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            checked: false,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Item>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    /// Display title: first body line with simple markup removed.
    pub fn title(&self) -> String {
        let first = self.body.lines().next().unwrap_or_default();
        let mut plain = String::with_capacity(first.len());
        let mut in_tag = false;
        for ch in first.chars() {
            match ch {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => plain.push(ch),
                _ => {}
            }
        }
        let plain = plain.replace("&nbsp;", " ");
        let plain = plain.trim();
        if plain.is_empty() {
            "Untitled".to_string()
        } else {
            plain.to_string()
        }
    }

    /// Body with `line` appended on a new line.
    pub fn with_appended_line(&self, line: &str) -> Item {
        let mut next = self.clone();
        next.body = format!("{}\n{}", self.body, line);
        next
    }
}

/// A container of items and the unit of text persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub items: Vec<Arc<Item>>,
}

impl Board {
    pub fn new(id: impl Into<BoardId>, name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: items.into_iter().map(Arc::new).collect(),
        }
    }

    /// Depth-first walk over every item, parents before children.
    pub fn walk(&self) -> Vec<&Item> {
        fn visit<'a>(items: &'a [Arc<Item>], out: &mut Vec<&'a Item>) {
            for item in items {
                out.push(item);
                visit(&item.children, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.items, &mut out);
        out
    }

    /// Follow a path of child indices from the board root.
    pub fn item_at(&self, path: &[usize]) -> Option<&Item> {
        let (first, rest) = path.split_first()?;
        let mut current = self.items.get(*first)?;
        for index in rest {
            current = current.children.get(*index)?;
        }
        Some(current)
    }
}

/// `(id, title)` pairs for every item on the board, in walk order.
pub fn collect_items(board: &Board) -> Vec<(ItemId, String)> {
    board
        .walk()
        .into_iter()
        .map(|item| (item.id.clone(), item.title()))
        .collect()
}

/// Rebuild `items` with the item at `path` replaced by `f(item)`.
///
/// Only the nodes on the path are recreated; all siblings keep their `Arc`.
/// Returns `None` if the path does not resolve.
pub fn update_at_path<F>(items: &[Arc<Item>], path: &[usize], f: F) -> Option<Vec<Arc<Item>>>
where
    F: FnOnce(&Item) -> Item,
{
    let (first, rest) = path.split_first()?;
    let target = items.get(*first)?;
    let replaced = if rest.is_empty() {
        f(target)
    } else {
        let children = update_at_path(&target.children, rest, f)?;
        Item {
            children,
            ..Item::clone(target)
        }
    };
    let mut next = items.to_vec();
    next[*first] = Arc::new(replaced);
    Some(next)
}

/// The document store collaborator.
///
/// `boards` hands out a fresh snapshot every call; `replace_items` commits
/// a whole new item tree for one board.
pub trait BoardStore: Send {
    fn boards(&self) -> Vec<Board>;

    fn replace_items(&mut self, board: &BoardId, items: Vec<Arc<Item>>) -> Result<()>;
}
