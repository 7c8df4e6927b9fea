//! Deck decoding
//!
//! ## Layout
//!
//! ```text
//! [92]            u32   head of the property list
//! [104|108|112]   "Cards" marker; caret = marker offset + 32
//! [caret + 4]     u32   declared card count (informational)
//! [caret + 16]    u32   head of the card slot list
//! ```
//!
//! Property node: `next` u32 @+0, 24-byte label @+4, value locator u32 @+40.
//! Card slot node: `next`, `card_number`, `boundary`, `data_pointer`,
//! `attributes` (5 x u32).
//!
//! Both lists are singly linked through absolute offsets and end at a zero
//! `next` pointer. Nothing in the format prevents a corrupt file from linking
//! a node back onto itself, so every walk tracks the nodes it has seen and
//! stops after [`DecodeOptions::max_list_steps`] nodes.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info, trace};

use crate::card::Card;
use crate::error::{Error, Result};
use crate::reader::{ByteReader, FixedLayout};

/// Absolute offset of the property list head pointer
pub const PROPERTY_LIST_HEAD_OFFSET: u64 = 92;

/// The marker searched for when locating the card header
pub const HEADER_MARKER: &[u8; 5] = b"Cards";

const HEADER_PROBE_BASE: u64 = 104;
const HEADER_PROBE_STRIDE: u64 = 4;
const HEADER_PROBE_COUNT: u64 = 3;
const CARET_FROM_MARKER: u64 = 32;

const CARD_COUNT_OFFSET: u64 = 4;
const FIRST_CARD_OFFSET: u64 = 16;

const PROPERTY_LABEL_OFFSET: u64 = 4;
const PROPERTY_VALUE_OFFSET: u64 = 40;

/// Format used for the `CreationDate` property
pub const CREATION_DATE_FORMAT: &str = "%Y %B %d";

/// Options controlling a deck decode
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Maximum number of nodes visited in any one linked list
    pub max_list_steps: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_list_steps: 1_000_000,
        }
    }
}

/// A decoded flashcard deck
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    pub title: String,
    pub native_language: String,
    pub foreign_language: String,
    pub description: String,
    pub copyright: String,
    pub copyright_url: String,
    /// Creation date formatted with [`CREATION_DATE_FORMAT`] (UTC)
    pub creation_date: String,
    pub app_creator_name: String,
    pub guid: Option<u32>,
    pub ordered: Option<u32>,
    /// Card count stored next to the header. Not used to bound the card walk.
    pub declared_card_count: u32,
    /// Cards in list order, which need not match card number order
    pub cards: Vec<Card>,
}

impl Deck {
    /// Read and decode a deck file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &DecodeOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening deck: {}", path.display());
        let data = fs::read(path)?;
        Self::parse_with_options(&data, options)
    }

    /// Decode a deck from an in-memory buffer
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with_options(data, &DecodeOptions::default())
    }

    pub fn parse_with_options(data: &[u8], options: &DecodeOptions) -> Result<Self> {
        DeckDecoder::new(data, options.clone()).decode()
    }
}

/// Deck properties the decoder knows how to store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    Title,
    NativeLanguage,
    ForeignLanguage,
    Description,
    Copyright,
    CopyrightUrl,
    CreationDate,
    AppCreatorName,
    Guid,
    Ordered,
}

impl Property {
    fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "Name" => Property::Title,
            "Side1Lang" => Property::NativeLanguage,
            "Side2Lang" => Property::ForeignLanguage,
            "Description" => Property::Description,
            "Copyright" => Property::Copyright,
            "CopyrightURL" => Property::CopyrightUrl,
            "CreationDate" => Property::CreationDate,
            "AppCreatorName" => Property::AppCreatorName,
            "GUID" => Property::Guid,
            "Ordered" => Property::Ordered,
            _ => return None,
        })
    }

    fn text_slot(self, deck: &mut Deck) -> Option<&mut String> {
        match self {
            Property::Title => Some(&mut deck.title),
            Property::NativeLanguage => Some(&mut deck.native_language),
            Property::ForeignLanguage => Some(&mut deck.foreign_language),
            Property::Description => Some(&mut deck.description),
            Property::Copyright => Some(&mut deck.copyright),
            Property::CopyrightUrl => Some(&mut deck.copyright_url),
            Property::AppCreatorName => Some(&mut deck.app_creator_name),
            Property::CreationDate | Property::Guid | Property::Ordered => None,
        }
    }
}

/// A node of the card slot list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSlot {
    pub next: u32,
    pub card_number: u32,
    pub boundary: u32,
    pub data_pointer: u32,
    pub attributes: u32,
}

impl FixedLayout for CardSlot {
    const SIZE: usize = 20;

    fn decode(bytes: &[u8]) -> Self {
        let [next, card_number, boundary, data_pointer, attributes] = <[u32; 5]>::decode(bytes);
        Self {
            next,
            card_number,
            boundary,
            data_pointer,
            attributes,
        }
    }
}

/// Format a `CreationDate` timestamp
pub fn format_creation_date(timestamp: u32) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.format(CREATION_DATE_FORMAT).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Find the "Cards" marker and return the caret derived from it
pub fn locate_header(reader: &ByteReader<'_>) -> Result<u64> {
    for i in 0..HEADER_PROBE_COUNT {
        let offset = HEADER_PROBE_BASE + i * HEADER_PROBE_STRIDE;
        let window = match reader.slice(offset, HEADER_MARKER.len() as u64) {
            Ok(window) => window,
            Err(_) => break,
        };
        if window == HEADER_MARKER {
            let caret = offset + CARET_FROM_MARKER;
            debug!("Header marker at {:#x}, caret {:#x}", offset, caret);
            return Ok(caret);
        }
    }
    Err(Error::Format("structural marker not found".into()))
}

/// Walks a singly linked list of records, yielding node offsets
struct RecordList<'r> {
    reader: &'r ByteReader<'r>,
    list: &'static str,
    next: u32,
    visited: HashSet<u32>,
    max_steps: usize,
}

impl<'r> RecordList<'r> {
    fn new(reader: &'r ByteReader<'r>, list: &'static str, head: u32, max_steps: usize) -> Self {
        Self {
            reader,
            list,
            next: head,
            visited: HashSet::new(),
            max_steps,
        }
    }

    fn fail(&mut self, reason: &'static str, offset: u32) -> Option<Result<u32>> {
        self.next = 0;
        Some(Err(Error::CorruptList {
            list: self.list,
            reason,
            offset,
        }))
    }
}

impl Iterator for RecordList<'_> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next;
        if node == 0 {
            return None;
        }
        if self.visited.len() >= self.max_steps {
            return self.fail("step budget exhausted", node);
        }
        if !self.visited.insert(node) {
            return self.fail("node visited twice", node);
        }

        match self.reader.read_u32(node as u64) {
            Ok(next) => {
                self.next = next;
                Some(Ok(node))
            }
            Err(e) => {
                self.next = 0;
                Some(Err(e))
            }
        }
    }
}

/// Decodes one deck buffer
pub struct DeckDecoder<'a> {
    reader: ByteReader<'a>,
    options: DecodeOptions,
}

impl<'a> DeckDecoder<'a> {
    pub fn new(data: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            reader: ByteReader::new(data),
            options,
        }
    }

    /// Run the full decode: header, properties, then cards
    pub fn decode(&self) -> Result<Deck> {
        let caret = locate_header(&self.reader)?;

        let mut deck = Deck::default();
        self.parse_properties(&mut deck)?;
        self.parse_cards(caret, &mut deck)?;

        info!(
            "Decoded deck \"{}\": {} cards ({} declared)",
            deck.title,
            deck.cards.len(),
            deck.declared_card_count
        );
        Ok(deck)
    }

    /// Walk the property list into `deck`, returning the number of nodes visited
    pub fn parse_properties(&self, deck: &mut Deck) -> Result<usize> {
        let head = self.reader.read_u32(PROPERTY_LIST_HEAD_OFFSET)?;
        debug!("Property list head {:#x}", head);

        let mut visited = 0;
        for node in RecordList::new(&self.reader, "property", head, self.options.max_list_steps) {
            let node = node? as u64;
            visited += 1;

            let label = self.reader.read_fixed_label(node + PROPERTY_LABEL_OFFSET)?;
            let Some(property) = Property::from_label(&label) else {
                trace!("Skipping property {:?} at {:#x}", label, node);
                continue;
            };

            let locator = self.reader.read_u32(node + PROPERTY_VALUE_OFFSET)?;
            trace!("Property {} = {:#x}", label, locator);

            match property {
                Property::CreationDate => deck.creation_date = format_creation_date(locator),
                Property::Guid => deck.guid = Some(locator),
                Property::Ordered => deck.ordered = Some(locator),
                text => {
                    let value = self.reader.read_string(locator as i64)?;
                    if let Some(slot) = text.text_slot(deck) {
                        *slot = value;
                    }
                }
            }
        }

        Ok(visited)
    }

    /// Walk the card slot list starting from `caret`, appending each card to
    /// `deck`. Returns the number of cards decoded.
    pub fn parse_cards(&self, caret: u64, deck: &mut Deck) -> Result<usize> {
        deck.declared_card_count = self.reader.read_u32(caret + CARD_COUNT_OFFSET)?;
        let head = self.reader.read_u32(caret + FIRST_CARD_OFFSET)?;
        debug!(
            "Card list head {:#x}, {} cards declared",
            head, deck.declared_card_count
        );

        let mut decoded = 0;
        for node in RecordList::new(&self.reader, "card", head, self.options.max_list_steps) {
            let slot: CardSlot = self.reader.read_fixed(node? as u64)?;
            let card = Card::decode(&self.reader, slot.data_pointer, slot.attributes)?;
            deck.cards.push(card);
            decoded += 1;
        }

        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::encode_string;

    const FIRST_FREE: usize = 160;

    /// Builds a minimal deck image: marker at 104, free space from 160
    fn deck_image() -> Vec<u8> {
        let mut data = vec![0u8; FIRST_FREE];
        data[104..109].copy_from_slice(HEADER_MARKER);
        data
    }

    fn put_u32(data: &mut [u8], at: usize, value: u32) {
        data[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn push_property(data: &mut Vec<u8>, label: &str, locator: u32) -> u32 {
        let at = data.len();
        data.resize(at + 44, 0);
        data[at + 4..at + 4 + label.len()].copy_from_slice(label.as_bytes());
        put_u32(data, at + 40, locator);
        at as u32
    }

    fn push_bytes(data: &mut Vec<u8>, bytes: &[u8]) -> u32 {
        let at = data.len() as u32;
        data.extend_from_slice(bytes);
        at
    }

    #[test]
    fn test_locate_header_probes() {
        for (i, marker_at) in [104usize, 108, 112].into_iter().enumerate() {
            let mut data = vec![0u8; 200];
            data[marker_at..marker_at + 5].copy_from_slice(b"Cards");
            let reader = ByteReader::new(&data);
            assert_eq!(locate_header(&reader).unwrap(), 136 + i as u64 * 4);
        }
    }

    #[test]
    fn test_locate_header_missing() {
        let mut data = vec![0u8; 200];
        data[116..121].copy_from_slice(b"Cards");
        data[105..110].copy_from_slice(b"Cards");
        let reader = ByteReader::new(&data);
        assert!(matches!(locate_header(&reader), Err(Error::Format(_))));

        let short = ByteReader::new(&[0u8; 50]);
        assert!(matches!(locate_header(&short), Err(Error::Format(_))));
    }

    #[test]
    fn test_parse_properties_visits_every_node() {
        let mut data = deck_image();
        let title = push_bytes(&mut data, &encode_string("Spanish 101"));
        let lang = push_bytes(&mut data, &encode_string("English"));

        let nodes = [
            push_property(&mut data, "Name", title),
            push_property(&mut data, "Unknown", 0xDEAD_BEEF),
            push_property(&mut data, "Side1Lang", lang),
            push_property(&mut data, "CreationDate", 1_000_000_000),
            push_property(&mut data, "GUID", 4242),
            push_property(&mut data, "Copyright", 0),
        ];
        for pair in nodes.windows(2) {
            put_u32(&mut data, pair[0] as usize, pair[1]);
        }
        put_u32(&mut data, PROPERTY_LIST_HEAD_OFFSET as usize, nodes[0]);

        let decoder = DeckDecoder::new(&data, DecodeOptions::default());
        let mut deck = Deck::default();
        assert_eq!(decoder.parse_properties(&mut deck).unwrap(), nodes.len());

        assert_eq!(deck.title, "Spanish 101");
        assert_eq!(deck.native_language, "English");
        assert_eq!(deck.creation_date, "2001 September 09");
        assert_eq!(deck.guid, Some(4242));
        assert_eq!(deck.copyright, "");
        assert_eq!(deck.foreign_language, "");
    }

    #[test]
    fn test_parse_properties_empty_list() {
        let data = deck_image();
        let decoder = DeckDecoder::new(&data, DecodeOptions::default());
        let mut deck = Deck::default();
        assert_eq!(decoder.parse_properties(&mut deck).unwrap(), 0);
        assert_eq!(deck, Deck::default());
    }

    #[test]
    fn test_parse_properties_detects_cycle() {
        let mut data = deck_image();
        let a = push_property(&mut data, "Unknown", 0);
        let b = push_property(&mut data, "Unknown", 0);
        put_u32(&mut data, a as usize, b);
        put_u32(&mut data, b as usize, a);
        put_u32(&mut data, PROPERTY_LIST_HEAD_OFFSET as usize, a);

        let decoder = DeckDecoder::new(&data, DecodeOptions::default());
        let err = decoder.parse_properties(&mut Deck::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::CorruptList { list: "property", offset, .. } if offset == a
        ));
    }

    #[test]
    fn test_parse_properties_step_budget() {
        let mut data = deck_image();
        let nodes: Vec<u32> = (0..4).map(|_| push_property(&mut data, "Unknown", 0)).collect();
        for pair in nodes.windows(2) {
            put_u32(&mut data, pair[0] as usize, pair[1]);
        }
        put_u32(&mut data, PROPERTY_LIST_HEAD_OFFSET as usize, nodes[0]);

        let options = DecodeOptions { max_list_steps: 3 };
        let decoder = DeckDecoder::new(&data, options);
        let err = decoder.parse_properties(&mut Deck::default()).unwrap_err();
        assert!(matches!(err, Error::CorruptList { reason: "step budget exhausted", .. }));
    }

    #[test]
    fn test_parse_cards_keeps_list_order() {
        let mut data = deck_image();
        let caret = locate_header(&ByteReader::new(&data)).unwrap() as usize;

        let mut slots = Vec::new();
        for number in [30u32, 10, 20] {
            let mut record = vec![0u8; 8];
            record[4..8].copy_from_slice(&number.to_le_bytes());
            let record_at = push_bytes(&mut data, &record);

            let slot_at = data.len();
            data.resize(slot_at + 20, 0);
            put_u32(&mut data, slot_at + 4, number);
            put_u32(&mut data, slot_at + 12, record_at);
            slots.push(slot_at as u32);
        }
        for pair in slots.windows(2) {
            put_u32(&mut data, pair[0] as usize, pair[1]);
        }
        put_u32(&mut data, caret + 4, 99);
        put_u32(&mut data, caret + 16, slots[0]);

        let decoder = DeckDecoder::new(&data, DecodeOptions::default());
        let mut deck = Deck::default();
        assert_eq!(decoder.parse_cards(caret as u64, &mut deck).unwrap(), 3);

        let numbers: Vec<u32> = deck.cards.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![30, 10, 20]);
        assert_eq!(deck.declared_card_count, 99);
    }

    #[test]
    fn test_parse_cards_self_loop() {
        let mut data = deck_image();
        let caret = 136;
        let record_at = push_bytes(&mut data, &[0u8; 8]);
        let slot_at = data.len();
        data.resize(slot_at + 20, 0);
        put_u32(&mut data, slot_at, slot_at as u32);
        put_u32(&mut data, slot_at + 12, record_at);
        put_u32(&mut data, caret + 16, slot_at as u32);

        let decoder = DeckDecoder::new(&data, DecodeOptions::default());
        let mut deck = Deck::default();
        let err = decoder.parse_cards(caret as u64, &mut deck).unwrap_err();
        assert!(matches!(err, Error::CorruptList { list: "card", .. }));
    }

    #[test]
    fn test_decode_requires_header() {
        let data = vec![0u8; 256];
        assert!(matches!(Deck::parse(&data), Err(Error::Format(_))));
    }

    #[test]
    fn test_format_creation_date() {
        assert_eq!(format_creation_date(0), "1970 January 01");
        assert_eq!(format_creation_date(1_000_000_000), "2001 September 09");
    }
}
