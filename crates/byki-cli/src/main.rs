//! byki - A tool for converting Byki flashcard decks
//!
//! Usage:
//!   byki info <deck>                  - Show deck metadata and cards
//!   byki html <deck> [-o dir]         - Export a deck as an HTML page with media
//!   byki anki <decks|dirs...> [-o dir] - Export decks as Anki import text

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use byki::deck_utils::{convert_anki, convert_html, show_info};
use byki::utils::DEFAULT_DECK_PATTERN;
use byki::AnkiExportOptions;

#[derive(Parser)]
#[command(name = "byki")]
#[command(version = "0.1.0")]
#[command(about = "Decode Byki flashcard decks and export them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show deck information
    Info {
        /// Path to the deck file
        deck: PathBuf,
    },
    /// Export a deck as HTML, writing audio and images alongside
    Html {
        /// Path to the deck file
        deck: PathBuf,
        /// Output directory (default: deck path without extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export decks as delimited text for Anki
    Anki {
        /// Deck files or directories containing decks
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
        /// Field delimiter
        #[arg(short, long, default_value = "\t")]
        delimiter: String,
        /// Keep .ogg in sound references instead of rewriting to .mp3
        #[arg(long)]
        ogg: bool,
        /// Don't strip HTML from card text
        #[arg(long)]
        no_strip_html: bool,
        /// Pattern for deck files when scanning directories
        #[arg(short, long, default_value = DEFAULT_DECK_PATTERN)]
        filter: String,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info { deck } => {
            show_info(&deck)?;
        }
        Commands::Html { deck, output } => {
            convert_html(&deck, output.as_deref())?;
        }
        Commands::Anki {
            inputs,
            output,
            delimiter,
            ogg,
            no_strip_html,
            filter,
        } => {
            let options = AnkiExportOptions {
                delimiter,
                audio_extension: if ogg { "ogg" } else { "mp3" }.to_string(),
                strip_html: !no_strip_html,
            };
            convert_anki(&inputs, &output, &filter, options)?;
        }
    }

    Ok(())
}
