//! Delimited text export for importing decks into Anki
//!
//! Each card becomes one line: `foreign<delimiter>native`. Audio payloads are
//! written next to the text file and referenced with Anki's `[sound:...]` tag.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::blob::Blob;
use crate::card::{Card, CardField};
use crate::deck::Deck;
use crate::error::Result;
use crate::export::strip_html;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w]").expect("valid non-word regex"));

/// Options for the text export
#[derive(Debug, Clone)]
pub struct AnkiExportOptions {
    /// Separator between the foreign and native columns
    pub delimiter: String,
    /// Extension written into `[sound:...]` references. Audio files are always
    /// written as `.ogg`; a different extension expects the user to convert them.
    pub audio_extension: String,
    /// Strip HTML markup from card text
    pub strip_html: bool,
}

impl Default for AnkiExportOptions {
    fn default() -> Self {
        Self {
            delimiter: "\t".to_string(),
            audio_extension: "mp3".to_string(),
            strip_html: true,
        }
    }
}

/// Which side of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Foreign,
    Native,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::Foreign => "foreign",
            Side::Native => "native",
        }
    }

    fn title(self) -> CardField {
        match self {
            Side::Foreign => CardField::ForeignTitle,
            Side::Native => CardField::NativeTitle,
        }
    }

    fn subtitle(self) -> CardField {
        match self {
            Side::Foreign => CardField::ForeignSubtitle,
            Side::Native => CardField::NativeSubtitle,
        }
    }

    fn audio(self, card: &Card) -> Option<&Blob> {
        match self {
            Side::Foreign => card.foreign_audio.as_ref(),
            Side::Native => card.native_audio.as_ref(),
        }
    }
}

/// Fields the text format has no column for
const DISCARDED_FIELDS: [CardField; 3] = [
    CardField::ForeignAltAnswer,
    CardField::NativeAltAnswer,
    CardField::NativeTooltip,
];

/// Writes decks as delimited text plus audio files into one directory
pub struct AnkiExporter {
    output_dir: PathBuf,
    options: AnkiExportOptions,
}

impl AnkiExporter {
    pub fn new(output_dir: impl Into<PathBuf>, options: AnkiExportOptions) -> Self {
        Self {
            output_dir: output_dir.into(),
            options,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn process_text(&self, text: &str) -> String {
        if self.options.strip_html {
            strip_html(text).trim().to_string()
        } else {
            text.trim().to_string()
        }
    }

    /// Title of one side, followed by its subtitle in parentheses
    pub fn side_text(&self, card: &Card, side: Side) -> String {
        let mut text = self.process_text(card.text(side.title()).unwrap_or_default());

        if let Some(subtitle) = card.text(side.subtitle()) {
            let subtitle = self.process_text(subtitle);
            if !subtitle.is_empty() {
                if subtitle.starts_with('(') {
                    text = format!("{} {}", text, subtitle);
                } else {
                    text = format!("{} ({})", text, subtitle);
                }
            }
        }
        text
    }

    /// Write the side's audio, if any, and append its sound reference
    fn attach_audio(
        &self,
        card: &Card,
        side: Side,
        text: String,
        first_native_word: &str,
        base_name: &str,
    ) -> Result<String> {
        let Some(audio) = side.audio(card) else {
            return Ok(text);
        };

        let stem = format!(
            "{}_{:04}_{}_{}",
            base_name,
            card.number,
            first_native_word,
            side.name()
        );
        audio.write_to(&self.output_dir.join(format!("{}.ogg", stem)))?;

        Ok(format!(
            "{} [sound:{}.{}]",
            text, stem, self.options.audio_extension
        ))
    }

    /// Format one card as a line (without the trailing newline), writing its audio
    pub fn card_line(&self, card: &Card, base_name: &str) -> Result<String> {
        let foreign = self.side_text(card, Side::Foreign);
        let native = self.side_text(card, Side::Native);
        let first_native_word = first_word(&native);

        let foreign = self.attach_audio(card, Side::Foreign, foreign, &first_native_word, base_name)?;
        let native = self.attach_audio(card, Side::Native, native, &first_native_word, base_name)?;

        for field in DISCARDED_FIELDS {
            if let Some(value) = card.text(field) {
                warn!(
                    "Discarding {}={} on card {} ({})",
                    field.name(),
                    value,
                    card.number,
                    native
                );
            }
        }

        Ok(format!("{}{}{}", foreign, self.options.delimiter, native))
    }

    /// Export `deck` to `<base_name>.txt` in the output directory
    pub fn export(&self, deck: &Deck, base_name: &str) -> Result<PathBuf> {
        let mut text = String::new();
        for card in &deck.cards {
            text.push_str(&self.card_line(card, base_name)?);
            text.push('\n');
        }

        let path = self.output_dir.join(format!("{}.txt", base_name));
        fs::write(&path, text)?;
        info!("Wrote {} cards to {}", deck.cards.len(), path.display());
        Ok(path)
    }
}

/// First whitespace separated word of `text` with non-word characters removed
pub fn first_word(text: &str) -> String {
    text.split_whitespace()
        .next()
        .map(|word| NON_WORD.replace_all(word, "").into_owned())
        .unwrap_or_default()
}
