//! Deck document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::card_id::CardId;
use crate::clock::Clock;
use crate::document_id::{DocType, DocumentId};
use crate::merge::Importable;

use super::{check_type, parse_card_id, parse_id, require_id, DocumentError, WireDocument};

/// A named set of cards.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    id: DocumentId,
    pub rev: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    pub imported: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub description: Option<String>,
    cards: BTreeSet<CardId>,
}

impl Deck {
    pub fn new(id: DocumentId, clock: &impl Clock) -> Result<Self, DocumentError> {
        require_id(&id, DocType::Deck)?;
        let now = clock.now();
        Ok(Self {
            id,
            rev: None,
            created: Some(now),
            modified: now,
            imported: None,
            name: None,
            description: None,
            cards: BTreeSet::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Add a card; returns false if it was already in the deck.
    pub fn add_card(&mut self, card: CardId) -> bool {
        self.cards.insert(card)
    }

    pub fn remove_card(&mut self, card: &CardId) -> bool {
        self.cards.remove(card)
    }

    pub fn contains_card(&self, card: &CardId) -> bool {
        self.cards.contains(card)
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardId> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckWire {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(rename = "type")]
    doc_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
    modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    imported: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    cards: Vec<String>,
}

impl WireDocument for Deck {
    const DOC_TYPE: DocType = DocType::Deck;

    type Wire = DeckWire;

    fn to_wire(&self) -> DeckWire {
        debug_assert_eq!(self.id.doc_type(), Self::DOC_TYPE);
        DeckWire {
            id: self.id.to_string(),
            rev: self.rev.clone(),
            doc_type: Self::DOC_TYPE.as_str().to_string(),
            created: self.created,
            modified: self.modified,
            imported: self.imported,
            name: self.name.clone(),
            description: self.description.clone(),
            cards: self.cards.iter().map(CardId::to_string).collect(),
        }
    }

    fn from_wire(wire: DeckWire) -> Result<Self, DocumentError> {
        check_type(&wire.doc_type, Self::DOC_TYPE)?;
        let cards = wire
            .cards
            .iter()
            .map(|raw| parse_card_id(raw))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            id: parse_id(&wire.id, DocType::Deck)?,
            rev: wire.rev,
            created: wire.created,
            modified: wire.modified,
            imported: wire.imported,
            name: wire.name,
            description: wire.description,
            cards,
        })
    }

    fn document_id(&self) -> DocumentId {
        self.id.clone()
    }
}

wire_serde!(Deck);

impl Importable for Deck {
    fn import_id(&self) -> DocumentId {
        self.id.clone()
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    fn imported(&self) -> Option<DateTime<Utc>> {
        self.imported
    }

    fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    fn set_rev(&mut self, rev: Option<String>) {
        self.rev = rev;
    }

    fn adopt(&mut self, existing: &Self) {
        self.name = existing.name.clone();
        self.description = existing.description.clone();
        self.cards = existing.cards.clone();
        self.modified = existing.modified;
        self.imported = existing.imported;
    }
}
