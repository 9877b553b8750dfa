//! Boards kept as markdown files.
//!
//! ```text
//! ---
//! kanban-plugin: basic
//! ---
//!
//! ## Doing
//!
//! - [ ] Write report
//! 	++ @{2024-05-01} @@{09:00} – @@{09:25} (25 m)
//! - [x] Review PR
//!
//! %% kanban:settings
//! ```
//!
//! Everything before the first `## ` heading is the preamble and everything
//! from the first `%%` line on is the trailer; both are written back
//! untouched. Lanes hold cards only, so a markdown board is two levels deep.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::board::{Board, BoardId, BoardStore, Item};
use crate::error::{BoardError, Result};

static CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+] \[( |x|X)\](?: (.*))?$").expect("card pattern is valid"));

/// One parsed board file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BoardFile {
    path: PathBuf,
    preamble: String,
    trailer: String,
    board: Board,
}

/// [`BoardStore`] over a set of markdown files.
///
/// Every read goes back to disk so edits made by other programs are seen.
/// Writes re-read the target file, re-render it and replace it atomically.
#[derive(Debug, Clone, Default)]
pub struct MarkdownBoardStore {
    files: Vec<BoardFile>,
}

impl MarkdownBoardStore {
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let files = paths
            .iter()
            .map(|p| read_board(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(boards = files.len(), "markdown boards loaded");
        Ok(Self { files })
    }

    /// Read one board's file again and replace the cached copy.
    fn reload(&mut self, board: &BoardId) -> Result<&mut BoardFile> {
        let file = self
            .files
            .iter_mut()
            .find(|f| &f.board.id == board)
            .ok_or_else(|| BoardError::NotFound(board.to_string()))?;
        *file = read_board(&file.path)?;
        Ok(file)
    }
}

impl BoardStore for MarkdownBoardStore {
    fn boards(&self) -> Vec<Board> {
        self.files
            .iter()
            .map(|f| match read_board(&f.path) {
                Ok(fresh) => fresh.board,
                Err(e) => {
                    tracing::warn!(path = %f.path.display(), error = %e, "using cached board");
                    f.board.clone()
                }
            })
            .collect()
    }

    fn replace_items(&mut self, board: &BoardId, items: Vec<Arc<Item>>) -> Result<()> {
        let file = self.reload(board)?;
        let text = render(&file.preamble, &items, &file.trailer).map_err(|message| {
            BoardError::Malformed {
                path: file.path.clone(),
                line: 0,
                message,
            }
        })?;
        write_atomic(&file.path, &text)?;
        file.board.items = items;
        tracing::debug!(path = %file.path.display(), "board written");
        Ok(())
    }
}

fn read_board(path: &Path) -> Result<BoardFile> {
    let text = std::fs::read_to_string(path).map_err(|source| BoardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(path, &text)?)
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "board".to_string())
}

/// Strip one level of indentation (a tab or four spaces).
fn continuation(line: &str) -> Option<&str> {
    line.strip_prefix('\t').or_else(|| line.strip_prefix("    "))
}

struct LaneDraft {
    item: Item,
    cards: Vec<Item>,
}

impl LaneDraft {
    fn finish(self) -> Item {
        let LaneDraft { item, cards } = self;
        item.with_children(cards)
    }
}

fn parse(path: &Path, text: &str) -> Result<BoardFile, BoardError> {
    let stem = stem(path);
    let mut preamble = String::new();
    let mut trailer = String::new();
    let mut lanes: Vec<Item> = Vec::new();
    let mut lane: Option<LaneDraft> = None;

    let mut lines = text.lines().enumerate();
    while let Some((number, line)) = lines.next() {
        if line.starts_with("%%") {
            trailer.push_str(line);
            trailer.push('\n');
            for (_, rest) in lines.by_ref() {
                trailer.push_str(rest);
                trailer.push('\n');
            }
            break;
        }

        if let Some(title) = line.strip_prefix("## ") {
            lanes.extend(lane.take().map(LaneDraft::finish));
            lane = Some(LaneDraft {
                item: Item::new(format!("{stem}/{}", lanes.len()), title.trim()),
                cards: Vec::new(),
            });
            continue;
        }

        let Some(current) = lane.as_mut() else {
            preamble.push_str(line);
            preamble.push('\n');
            continue;
        };

        if let Some(caps) = CARD.captures(line) {
            let id = format!("{stem}/{}/{}", lanes.len(), current.cards.len());
            let mut card = Item::new(id, caps.get(2).map_or("", |m| m.as_str()));
            card.checked = &caps[1] != " ";
            current.cards.push(card);
        } else if let Some(rest) = continuation(line) {
            let body = match current.cards.last_mut() {
                Some(card) => &mut card.body,
                None => &mut current.item.body,
            };
            body.push('\n');
            body.push_str(rest);
        } else if !line.trim().is_empty() {
            return Err(BoardError::Malformed {
                path: path.to_path_buf(),
                line: number + 1,
                message: format!("expected a card or an indented line, found {line:?}"),
            });
        }
    }
    lanes.extend(lane.map(LaneDraft::finish));

    Ok(BoardFile {
        path: path.to_path_buf(),
        preamble,
        trailer,
        board: Board::new(path.display().to_string(), stem, lanes),
    })
}

fn push_body(out: &mut String, head: &str, body: &str) {
    let mut lines = body.lines();
    out.push_str(head);
    out.push_str(lines.next().unwrap_or_default());
    out.push('\n');
    for line in lines {
        out.push('\t');
        out.push_str(line);
        out.push('\n');
    }
}

fn render(preamble: &str, lanes: &[Arc<Item>], trailer: &str) -> Result<String, String> {
    let mut out = String::from(preamble);
    for lane in lanes {
        push_body(&mut out, "## ", &lane.body);
        out.push('\n');
        for card in &lane.children {
            if !card.children.is_empty() {
                return Err(format!("card {} has nested items", card.id));
            }
            let head = if card.checked { "- [x] " } else { "- [ ] " };
            push_body(&mut out, head, &card.body);
        }
        out.push('\n');
    }
    out.push_str(trailer);
    Ok(out)
}

fn write_atomic(path: &Path, text: &str) -> Result<(), BoardError> {
    let io_err = |source: std::io::Error| BoardError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, text).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}
