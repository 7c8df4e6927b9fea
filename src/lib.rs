//! # byki
//!
//! A Rust library for decoding Byki binary flashcard decks.
//!
//! ## Overview
//!
//! A deck file stores its metadata and cards as linked records addressed by
//! absolute offsets, with UTF-16 text obfuscated by a fixed XOR mask and media
//! stored as length-prefixed blobs. This library provides:
//!
//! - Decoding a deck into a [`Deck`] with its [`Card`]s
//! - Extracting card audio and images as [`Blob`]s
//! - HTML export of a deck with its media
//! - Delimited text export for importing into Anki
//!
//! ## Example - Decoding
//!
//! ```rust,no_run
//! use byki::Deck;
//!
//! fn main() -> anyhow::Result<()> {
//!     let deck = Deck::open("Lesson01.byki")?;
//!
//!     println!("{} ({} cards)", deck.title, deck.cards.len());
//!     for card in &deck.cards {
//!         println!("{:?} = {:?}", card.foreign_title, card.native_title);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Exporting
//!
//! ```rust,no_run
//! use byki::{AnkiExportOptions, AnkiExporter, Deck};
//!
//! fn main() -> anyhow::Result<()> {
//!     let deck = Deck::open("Lesson01.byki")?;
//!
//!     byki::export::export_html(&deck, std::path::Path::new("out/Lesson01"))?;
//!
//!     let exporter = AnkiExporter::new("out", AnkiExportOptions::default());
//!     exporter.export(&deck, "Lesson01")?;
//!     Ok(())
//! }
//! ```

pub mod blob;
pub mod card;
pub mod deck;
pub mod deck_utils;
pub mod error;
pub mod export;
pub mod reader;
pub mod utils;

pub use blob::Blob;
pub use card::{Card, CardField, FieldKind, FieldValue};
pub use deck::{locate_header, DecodeOptions, Deck, DeckDecoder};
pub use error::{Error, Result};
pub use export::{AnkiExportOptions, AnkiExporter};
pub use reader::ByteReader;
