//! Card record decoding
//!
//! A card record starts with an 8-byte header (the card number lives at +4),
//! followed by one `u32` pointer per *present* attribute. Which attributes are
//! present is given by the attribute bitmask stored in the card's slot record.
//! Slots are packed densely in [`CardField::ALL`] order, so an unset bit never
//! consumes a slot no matter where it sits in the mask.

use tracing::{debug, trace};

use crate::blob::Blob;
use crate::error::Result;
use crate::reader::ByteReader;

/// Offset of the card number inside a card record
const CARD_NUMBER_OFFSET: u64 = 4;

/// Offset of the first attribute pointer inside a card record
const CARD_SLOTS_OFFSET: u64 = 8;

/// How an attribute's pointer is dereferenced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Blob,
    /// Declared in the mask but never stored and never given a slot
    Inert,
}

/// The optional attributes a card can carry, in record order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardField {
    NativeTitle,
    NativeSubtitle,
    ForeignTitle,
    ForeignSubtitle,
    NativeAltAnswer,
    ForeignAltAnswer,
    ForeignTranslit,
    NativeTooltip,
    ForeignAudio,
    NativeAudio,
    Image,
}

impl CardField {
    /// All attributes in the order their slots appear in a card record
    pub const ALL: [CardField; 11] = [
        CardField::NativeTitle,
        CardField::NativeSubtitle,
        CardField::ForeignTitle,
        CardField::ForeignSubtitle,
        CardField::NativeAltAnswer,
        CardField::ForeignAltAnswer,
        CardField::ForeignTranslit,
        CardField::NativeTooltip,
        CardField::ForeignAudio,
        CardField::NativeAudio,
        CardField::Image,
    ];

    pub fn bit(self) -> u32 {
        match self {
            CardField::NativeTitle => 4,
            CardField::NativeSubtitle => 8,
            CardField::ForeignTitle => 16,
            CardField::ForeignSubtitle => 32,
            CardField::NativeAltAnswer => 64,
            CardField::ForeignAltAnswer => 128,
            CardField::ForeignTranslit => 256,
            CardField::NativeTooltip => 512,
            CardField::ForeignAudio => 1024,
            CardField::NativeAudio => 2048,
            CardField::Image => 4096,
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            CardField::ForeignAudio | CardField::NativeAudio | CardField::Image => FieldKind::Blob,
            CardField::ForeignTranslit => FieldKind::Inert,
            _ => FieldKind::Text,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CardField::NativeTitle => "native_title",
            CardField::NativeSubtitle => "native_subtitle",
            CardField::ForeignTitle => "foreign_title",
            CardField::ForeignSubtitle => "foreign_subtitle",
            CardField::NativeAltAnswer => "native_alt_answer",
            CardField::ForeignAltAnswer => "foreign_alt_answer",
            CardField::ForeignTranslit => "foreign_translit",
            CardField::NativeTooltip => "native_tooltip",
            CardField::ForeignAudio => "foreign_audio",
            CardField::NativeAudio => "native_audio",
            CardField::Image => "image",
        }
    }

    /// Whether this attribute occupies a slot under `bitmask`
    pub fn is_present(self, bitmask: u32) -> bool {
        self.kind() != FieldKind::Inert && bitmask & self.bit() != 0
    }
}

/// A decoded attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Blob(Blob),
}

/// One flashcard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub number: u32,
    pub native_title: Option<String>,
    pub native_subtitle: Option<String>,
    pub foreign_title: Option<String>,
    pub foreign_subtitle: Option<String>,
    pub native_alt_answer: Option<String>,
    pub foreign_alt_answer: Option<String>,
    /// Never populated by the decoder; see [`FieldKind::Inert`].
    pub foreign_translit: Option<String>,
    pub native_tooltip: Option<String>,
    pub foreign_audio: Option<Blob>,
    pub native_audio: Option<Blob>,
    pub image: Option<Blob>,
}

impl Card {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Decode the card record at `data_pointer` using `bitmask` to select
    /// which attribute slots follow the header.
    pub fn decode(reader: &ByteReader<'_>, data_pointer: u32, bitmask: u32) -> Result<Self> {
        let base = data_pointer as u64;
        let mut card = Card::new(reader.read_u32(base + CARD_NUMBER_OFFSET)?);
        let mut cursor = base + CARD_SLOTS_OFFSET;

        for field in CardField::ALL {
            if !field.is_present(bitmask) {
                continue;
            }

            let pointer = reader.read_u32(cursor)?;
            trace!("Card {} {} -> {:#x}", card.number, field.name(), pointer);

            match field.kind() {
                FieldKind::Text => {
                    let text = reader.read_string(pointer as i64)?;
                    card.set(field, FieldValue::Text(text));
                }
                FieldKind::Blob if pointer == 0 => {
                    debug!("Card {} has {} bit set with a null pointer", card.number, field.name());
                }
                FieldKind::Blob => {
                    let blob = reader.read_blob(pointer as u64)?;
                    card.set(field, FieldValue::Blob(blob));
                }
                FieldKind::Inert => continue,
            }

            cursor += 4;
        }

        Ok(card)
    }

    /// Store a value in the slot for `field`. Values of the wrong kind are ignored.
    pub fn set(&mut self, field: CardField, value: FieldValue) {
        match (field, value) {
            (CardField::NativeTitle, FieldValue::Text(s)) => self.native_title = Some(s),
            (CardField::NativeSubtitle, FieldValue::Text(s)) => self.native_subtitle = Some(s),
            (CardField::ForeignTitle, FieldValue::Text(s)) => self.foreign_title = Some(s),
            (CardField::ForeignSubtitle, FieldValue::Text(s)) => self.foreign_subtitle = Some(s),
            (CardField::NativeAltAnswer, FieldValue::Text(s)) => self.native_alt_answer = Some(s),
            (CardField::ForeignAltAnswer, FieldValue::Text(s)) => {
                self.foreign_alt_answer = Some(s)
            }
            (CardField::ForeignTranslit, FieldValue::Text(s)) => self.foreign_translit = Some(s),
            (CardField::NativeTooltip, FieldValue::Text(s)) => self.native_tooltip = Some(s),
            (CardField::ForeignAudio, FieldValue::Blob(b)) => self.foreign_audio = Some(b),
            (CardField::NativeAudio, FieldValue::Blob(b)) => self.native_audio = Some(b),
            (CardField::Image, FieldValue::Blob(b)) => self.image = Some(b),
            (field, _) => debug!("Ignoring value of the wrong kind for {}", field.name()),
        }
    }

    /// Text of a string attribute, treating an empty string as absent
    pub fn text(&self, field: CardField) -> Option<&str> {
        let value = match field {
            CardField::NativeTitle => &self.native_title,
            CardField::NativeSubtitle => &self.native_subtitle,
            CardField::ForeignTitle => &self.foreign_title,
            CardField::ForeignSubtitle => &self.foreign_subtitle,
            CardField::NativeAltAnswer => &self.native_alt_answer,
            CardField::ForeignAltAnswer => &self.foreign_alt_answer,
            CardField::ForeignTranslit => &self.foreign_translit,
            CardField::NativeTooltip => &self.native_tooltip,
            CardField::ForeignAudio | CardField::NativeAudio | CardField::Image => return None,
        };
        value.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::reader::encode_string;

    /// Card record at offset 0, strings and blobs appended after the slots
    struct CardImage {
        data: Vec<u8>,
    }

    impl CardImage {
        fn new(number: u32, slots: usize) -> Self {
            let mut data = vec![0u8; 8 + slots * 4];
            data[4..8].copy_from_slice(&number.to_le_bytes());
            Self { data }
        }

        fn set_slot(&mut self, slot: usize, pointer: u32) {
            let at = 8 + slot * 4;
            self.data[at..at + 4].copy_from_slice(&pointer.to_le_bytes());
        }

        fn push(&mut self, bytes: &[u8]) -> u32 {
            let at = self.data.len() as u32;
            self.data.extend_from_slice(bytes);
            at
        }

        fn push_blob(&mut self, payload: &[u8]) -> u32 {
            let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
            bytes.extend_from_slice(&[0; 4]);
            bytes.extend_from_slice(payload);
            self.push(&bytes)
        }
    }

    #[test]
    fn test_field_table_order_and_bits() {
        let bits: Vec<u32> = CardField::ALL.iter().map(|f| f.bit()).collect();
        assert_eq!(bits, vec![4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096]);
        assert_eq!(CardField::Image.kind(), FieldKind::Blob);
        assert_eq!(CardField::NativeTooltip.kind(), FieldKind::Text);
        assert!(!CardField::ForeignTranslit.is_present(u32::MAX));
    }

    #[test]
    fn test_decode_packs_present_fields_only() {
        let mut image = CardImage::new(7, 2);
        let text = image.push(&encode_string("Hello"));
        let audio = image.push_blob(b"OggS-data");
        image.set_slot(0, text);
        image.set_slot(1, audio);

        let reader = ByteReader::new(&image.data);
        let bitmask = CardField::NativeTitle.bit() | CardField::ForeignAudio.bit();
        let card = Card::decode(&reader, 0, bitmask).unwrap();

        assert_eq!(card.number, 7);
        assert_eq!(card.native_title.as_deref(), Some("Hello"));
        assert_eq!(card.foreign_audio.as_ref().map(|b| b.data()), Some(&b"OggS-data"[..]));
        assert!(card.native_subtitle.is_none());
        assert!(card.native_audio.is_none());
        assert!(card.image.is_none());
    }

    #[test]
    fn test_decode_reads_no_slot_past_present_fields() {
        // Only two slots exist; a third read would run off the buffer.
        let mut image = CardImage::new(1, 2);
        image.set_slot(0, 0);
        image.set_slot(1, 0);
        let reader = ByteReader::new(&image.data);

        let card = Card::decode(&reader, 0, 4 | 4096).unwrap();
        assert_eq!(card.native_title.as_deref(), Some(""));
        assert!(card.image.is_none());

        let err = Card::decode(&reader, 0, 4 | 8 | 16).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { offset: 16, .. }));
    }

    #[test]
    fn test_decode_translit_bit_consumes_no_slot() {
        let mut image = CardImage::new(3, 1);
        let tooltip = image.push(&encode_string("hint"));
        image.set_slot(0, tooltip);
        let reader = ByteReader::new(&image.data);

        let bitmask = CardField::ForeignTranslit.bit() | CardField::NativeTooltip.bit();
        let card = Card::decode(&reader, 0, bitmask).unwrap();
        assert_eq!(card.native_tooltip.as_deref(), Some("hint"));
        assert!(card.foreign_translit.is_none());
    }

    #[test]
    fn test_decode_bad_pointer_fails() {
        let mut image = CardImage::new(9, 1);
        image.set_slot(0, 0xFFFF);
        let reader = ByteReader::new(&image.data);
        assert!(matches!(
            Card::decode(&reader, 0, CardField::Image.bit()),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_text_treats_empty_as_absent() {
        let mut card = Card::new(1);
        card.set(CardField::ForeignTitle, FieldValue::Text(String::new()));
        card.set(CardField::NativeTitle, FieldValue::Text("cat".into()));
        card.set(CardField::Image, FieldValue::Text("wrong kind".into()));
        assert_eq!(card.text(CardField::ForeignTitle), None);
        assert_eq!(card.text(CardField::NativeTitle), Some("cat"));
        assert!(card.image.is_none());
    }
}
