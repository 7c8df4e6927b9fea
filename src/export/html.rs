//! HTML rendering of a decoded deck
//!
//! Card text is inserted as-is: deck files already store their text as HTML
//! fragments. Audio and image payloads are written next to the page.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::blob::Blob;
use crate::card::{Card, CardField};
use crate::deck::Deck;
use crate::error::Result;

/// Name of the page written by [`export_html`]
pub const HTML_FILE_NAME: &str = "cards.html";

/// Which media file a blob becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    ForeignAudio,
    NativeAudio,
    Image,
}

impl MediaKind {
    /// File name used for this media on card `number`
    pub fn file_name(self, number: u32) -> String {
        match self {
            MediaKind::ForeignAudio => format!("card{}_foreign.ogg", number),
            MediaKind::NativeAudio => format!("card{}_native.ogg", number),
            MediaKind::Image => format!("card{}_image.jpg", number),
        }
    }
}

fn wrap(content: Option<&str>, prefix: &str, suffix: &str) -> String {
    match content {
        Some(text) => format!("{}{}{}", prefix, text, suffix),
        None => String::new(),
    }
}

/// Write `blob` into `dir` and return the HTML referencing it
fn write_media(blob: Option<&Blob>, kind: MediaKind, number: u32, dir: &Path) -> Result<String> {
    let Some(blob) = blob else {
        return Ok(String::new());
    };

    let name = kind.file_name(number);
    blob.write_to(&dir.join(&name))?;

    Ok(match kind {
        MediaKind::Image => format!("<img class=\"image\" src=\"{}\"/>", name),
        MediaKind::ForeignAudio | MediaKind::NativeAudio => {
            format!("<a class=\"audio\" href=\"{}\">(o)</a>", name)
        }
    })
}

/// Render one card, writing its media into `dir`
pub fn render_card(card: &Card, dir: &Path) -> Result<String> {
    let image = write_media(card.image.as_ref(), MediaKind::Image, card.number, dir)?;
    let foreign_audio = write_media(
        card.foreign_audio.as_ref(),
        MediaKind::ForeignAudio,
        card.number,
        dir,
    )?;
    let native_audio = write_media(
        card.native_audio.as_ref(),
        MediaKind::NativeAudio,
        card.number,
        dir,
    )?;

    let mut html = String::new();
    html.push_str("    <div class=\"card\">\n");
    let _ = writeln!(html, "        <p class=\"num\">#{}</p>", card.number);
    html.push_str(&image);
    let _ = writeln!(
        html,
        "        <h1>{}{}</h1>",
        card.text(CardField::ForeignTitle).unwrap_or_default(),
        foreign_audio
    );
    html.push_str(&wrap(card.text(CardField::ForeignSubtitle), "<p>", "</p>\n"));
    html.push_str(&wrap(card.text(CardField::ForeignAltAnswer), "<p>Also: ", "</p>\n"));
    html.push_str(&wrap(
        card.text(CardField::NativeTooltip),
        "<p class=\"tooltip\">",
        "</p>\n",
    ));
    let _ = writeln!(
        html,
        "        <h2>{}{}</h2>",
        card.text(CardField::NativeTitle).unwrap_or_default(),
        native_audio
    );
    html.push_str(&wrap(card.text(CardField::NativeSubtitle), "<p>", "</p>\n"));
    html.push_str(&wrap(card.text(CardField::NativeAltAnswer), "<p>Also: ", "</p>\n"));
    html.push_str("    </div>\n");
    Ok(html)
}

/// Render the full page, writing media into `dir`
pub fn render_deck(deck: &Deck, dir: &Path) -> Result<String> {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\" />\n");
    html.push_str("    <title>Deck</title>\n");
    html.push_str("    <style type=\"text/css\">\n");
    html.push_str(
        "    .card{border:2px solid #999; margin: 30px; padding: 20px; text-align: center;}\n",
    );
    html.push_str("    </style>\n");
    html.push_str("</head><body>\n");
    let _ = writeln!(html, "    <h1>{}</h1>", deck.title);
    let _ = writeln!(
        html,
        "    <h2>{}:{}</h2>",
        deck.native_language, deck.foreign_language
    );
    let _ = writeln!(html, "    <p>Description: {}</p>", deck.description);
    let _ = writeln!(
        html,
        "    <p>Copyright: {} {}</p>",
        deck.copyright, deck.copyright_url
    );
    let _ = writeln!(
        html,
        "    <p>Created with: {} on {}</p>",
        deck.app_creator_name, deck.creation_date
    );

    for card in &deck.cards {
        html.push_str(&render_card(card, dir)?);
    }

    html.push_str("</body></html>\n");
    Ok(html)
}

/// Export `deck` as `cards.html` plus media files into `dir`, creating it if needed
pub fn export_html(deck: &Deck, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let html = render_deck(deck, dir)?;

    let path = dir.join(HTML_FILE_NAME);
    fs::write(&path, html)?;
    info!("Wrote {} cards to {}", deck.cards.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::FieldValue;

    fn sample_deck() -> Deck {
        let mut card = Card::new(5);
        card.set(CardField::ForeignTitle, FieldValue::Text("el perro".into()));
        card.set(CardField::NativeTitle, FieldValue::Text("the dog".into()));
        card.set(CardField::ForeignAltAnswer, FieldValue::Text("el can".into()));
        card.set(CardField::ForeignAudio, FieldValue::Blob(Blob::new(b"ogg".to_vec())));
        card.set(CardField::Image, FieldValue::Blob(Blob::new(b"jpg".to_vec())));

        Deck {
            title: "Animals".into(),
            native_language: "English".into(),
            foreign_language: "Spanish".into(),
            cards: vec![card],
            ..Deck::default()
        }
    }

    #[test]
    fn test_media_file_names() {
        assert_eq!(MediaKind::ForeignAudio.file_name(3), "card3_foreign.ogg");
        assert_eq!(MediaKind::NativeAudio.file_name(3), "card3_native.ogg");
        assert_eq!(MediaKind::Image.file_name(3), "card3_image.jpg");
    }

    #[test]
    fn test_export_writes_page_and_media() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deck");
        let path = export_html(&sample_deck(), &out).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("<h1>Animals</h1>"));
        assert!(html.contains("<h2>English:Spanish</h2>"));
        assert!(html.contains("<p class=\"num\">#5</p>"));
        assert!(html.contains("<h1>el perro<a class=\"audio\" href=\"card5_foreign.ogg\">(o)</a></h1>"));
        assert!(html.contains("<p>Also: el can</p>"));
        assert!(html.contains("<img class=\"image\" src=\"card5_image.jpg\"/>"));
        assert!(!html.contains("card5_native.ogg"));

        assert_eq!(fs::read(out.join("card5_foreign.ogg")).unwrap(), b"ogg");
        assert_eq!(fs::read(out.join("card5_image.jpg")).unwrap(), b"jpg");
    }
}
