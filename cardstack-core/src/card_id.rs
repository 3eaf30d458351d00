//! Composite card identifiers.
//!
//! A card is the product of one note and one template of the note's model,
//! so its identity is `<bundle>.<note>.<ordinal>`: the bundle identity in
//! bundle encoding, the note identity in note encoding, and the template
//! ordinal in decimal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document_id::{DocType, DocumentId, DocumentIdError};

const PART_SEPARATOR: char = '.';

/// Identifier of a card, decomposed into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId {
    bundle: Vec<u8>,
    note: Vec<u8>,
    ordinal: u32,
}

impl CardId {
    /// Create a card ID from raw bundle and note identities.
    pub fn new(bundle: impl Into<Vec<u8>>, note: impl Into<Vec<u8>>, ordinal: u32) -> Self {
        Self {
            bundle: bundle.into(),
            note: note.into(),
            ordinal,
        }
    }

    /// Create the ID of the card generated from `note` by template `ordinal`.
    ///
    /// Fails unless `bundle` is a bundle ID and `note` is a note ID.
    pub fn for_note(
        bundle: &DocumentId,
        note: &DocumentId,
        ordinal: u32,
    ) -> Result<Self, DocumentIdError> {
        if bundle.doc_type() != DocType::Bundle {
            return Err(DocumentIdError::InvalidFormat(format!(
                "card bundle must be a bundle ID, got {}",
                bundle
            )));
        }
        if note.doc_type() != DocType::Note {
            return Err(DocumentIdError::InvalidFormat(format!(
                "card note must be a note ID, got {}",
                note
            )));
        }
        Ok(Self::new(bundle.identity(), note.identity(), ordinal))
    }

    pub fn bundle_id(&self) -> DocumentId {
        DocumentId::new(DocType::Bundle, self.bundle.clone())
    }

    pub fn note_id(&self) -> DocumentId {
        DocumentId::new(DocType::Note, self.note.clone())
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty() || self.note.is_empty()
    }

    /// The identity segment, without the `card-` prefix.
    pub fn segment(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            DocType::Bundle.encoding().encode(&self.bundle),
            DocType::Note.encoding().encode(&self.note),
            self.ordinal,
            sep = PART_SEPARATOR
        )
    }

    /// Parse the identity segment of a card ID.
    ///
    /// Any malformed segment is an `InvalidEncoding` error.
    pub fn parse_segment(segment: &str) -> Result<Self, DocumentIdError> {
        let invalid = || DocumentIdError::InvalidEncoding(segment.to_string());

        let mut parts = segment.split(PART_SEPARATOR);
        let (Some(bundle), Some(note), Some(ordinal), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let ordinal: u32 = ordinal.parse().map_err(|_| invalid())?;
        // Reject forms like "01" so that each card has exactly one string form.
        if ordinal.to_string() != segment.rsplit(PART_SEPARATOR).next().unwrap_or_default() {
            return Err(invalid());
        }

        Ok(Self {
            bundle: DocType::Bundle.encoding().decode(bundle)?,
            note: DocType::Note.encoding().decode(note)?,
            ordinal,
        })
    }

    pub fn to_document_id(&self) -> DocumentId {
        DocumentId::new(DocType::Card, self.segment().into_bytes())
    }
}

impl TryFrom<&DocumentId> for CardId {
    type Error = DocumentIdError;

    fn try_from(id: &DocumentId) -> Result<Self, Self::Error> {
        if id.doc_type() != DocType::Card {
            return Err(DocumentIdError::InvalidFormat(format!(
                "not a card ID: {}",
                id
            )));
        }
        let segment = std::str::from_utf8(id.identity())
            .map_err(|_| DocumentIdError::InvalidEncoding(id.encoded_identity()))?;
        Self::parse_segment(segment)
    }
}

impl From<&CardId> for DocumentId {
    fn from(card: &CardId) -> Self {
        card.to_document_id()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document_id())
    }
}

impl FromStr for CardId {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = DocumentId::parse(s)?;
        Self::try_from(&id)
    }
}

impl Serialize for CardId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CardId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
