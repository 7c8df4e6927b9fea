//! Deck conversion commands
//!
//! The functions behind the CLI subcommands: showing deck information and
//! converting one or many decks to HTML or Anki text.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::{
    card::CardField,
    export::{export_html, AnkiExportOptions, AnkiExporter},
    utils::{collect_deck_files, deck_base_name, format_size, prepare_output_dir},
    Deck,
};

/// Print deck metadata and the first cards
pub fn show_info(deck_path: &Path) -> Result<()> {
    println!("Loading deck: {}", deck_path.display());

    let deck = Deck::open(deck_path)
        .with_context(|| format!("Failed to decode {}", deck_path.display()))?;

    show_deck_info(&deck);

    println!("\nCards (first 20):");
    for card in deck.cards.iter().take(20) {
        println!(
            "  #{:<5} {} = {}",
            card.number,
            card.text(CardField::ForeignTitle).unwrap_or("-"),
            card.text(CardField::NativeTitle).unwrap_or("-")
        );
    }
    if deck.cards.len() > 20 {
        println!("  ... and {} more", deck.cards.len() - 20);
    }

    Ok(())
}

/// Display deck metadata and media totals
pub fn show_deck_info(deck: &Deck) {
    let media: Vec<_> = deck
        .cards
        .iter()
        .flat_map(|c| [&c.foreign_audio, &c.native_audio, &c.image])
        .flatten()
        .collect();
    let media_size: u64 = media.iter().map(|b| b.len() as u64).sum();

    println!("\nDeck Info:");
    println!("  Title: {}", deck.title);
    println!("  Languages: {} / {}", deck.native_language, deck.foreign_language);
    if !deck.description.is_empty() {
        println!("  Description: {}", deck.description);
    }
    if !deck.copyright.is_empty() || !deck.copyright_url.is_empty() {
        println!("  Copyright: {} {}", deck.copyright, deck.copyright_url);
    }
    println!("  Created with: {} on {}", deck.app_creator_name, deck.creation_date);
    println!(
        "  Cards: {} ({} declared)",
        deck.cards.len(),
        deck.declared_card_count
    );
    println!("  Media: {} files, {}", media.len(), format_size(media_size));
}

/// Convert one deck to an HTML page with its media.
///
/// The output directory defaults to the deck's file stem next to the input.
pub fn convert_html(deck_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let output_dir = output.map(PathBuf::from).unwrap_or_else(|| {
        let mut p = deck_path.to_path_buf();
        p.set_extension("");
        p
    });
    prepare_output_dir(&output_dir)?;
    println!("Will output to directory {}", output_dir.display());

    let deck = Deck::open(deck_path)
        .with_context(|| format!("Failed to decode {}", deck_path.display()))?;
    let page = export_html(&deck, &output_dir)
        .with_context(|| format!("Failed to write HTML into {}", output_dir.display()))?;

    println!("Saved {} cards to {}", deck.cards.len(), page.display());
    Ok(page)
}

/// Convert decks to Anki text files.
///
/// `inputs` may mix deck files and directories; directories are scanned for
/// files matching `pattern`. A deck that fails to decode is reported and
/// skipped. Returns the number of decks converted.
pub fn convert_anki(
    inputs: &[PathBuf],
    output_dir: &Path,
    pattern: &str,
    options: AnkiExportOptions,
) -> Result<u64> {
    let decks = collect_deck_files(inputs, pattern)?;
    if decks.is_empty() {
        println!("No deck files found");
        return Ok(0);
    }

    prepare_output_dir(output_dir)?;
    println!("Converting {} decks into {}...", decks.len(), output_dir.display());

    let exporter = AnkiExporter::new(output_dir, options);

    let pb = ProgressBar::new(decks.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )?);

    let mut converted = 0u64;
    let mut failed = 0u64;

    for deck_path in &decks {
        pb.set_message(deck_path.display().to_string());

        match convert_single_anki(&exporter, deck_path) {
            Ok(_) => converted += 1,
            Err(e) => {
                pb.println(format!("Error converting {}: {:#}", deck_path.display(), e));
                failed += 1;
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");

    println!();
    println!("Converted: {} decks", converted);
    if failed > 0 {
        println!("Failed: {} decks", failed);
    }

    Ok(converted)
}

/// Convert a single deck with an existing exporter
pub fn convert_single_anki(exporter: &AnkiExporter, deck_path: &Path) -> Result<PathBuf> {
    let deck = Deck::open(deck_path)
        .with_context(|| format!("Failed to decode {}", deck_path.display()))?;
    let base_name = deck_base_name(deck_path);
    let path = exporter
        .export(&deck, &base_name)
        .with_context(|| format!("Failed to write {}", base_name))?;
    Ok(path)
}
