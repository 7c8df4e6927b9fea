//! Output formats for decoded decks
//!
//! These only consume a [`Deck`](crate::Deck); none of them look at the
//! binary file.

pub mod anki;
pub mod html;
mod strip;

pub use anki::{AnkiExportOptions, AnkiExporter, Side};
pub use html::{export_html, render_card, render_deck, MediaKind};
pub use strip::strip_html;
