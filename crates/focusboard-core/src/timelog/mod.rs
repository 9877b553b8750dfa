//! Session log lines stored inside item bodies.
//!
//! [`line`] is the text codec for a single line; [`sync`] walks boards to
//! rebuild sessions from those lines and appends new ones.

pub mod line;
pub mod sync;

pub use line::{LogLine, Marker};
pub use sync::{append_session, SessionLog};
