//! Card document.
//!
//! A card is one template of a note's model, together with its review
//! schedule. Its ID is a composite [`CardId`] naming the bundle, the note
//! and the template ordinal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card_id::CardId;
use crate::clock::Clock;
use crate::document_id::{DocType, DocumentId};
use crate::merge::Importable;
use crate::schedule::{Due, Interval};

use super::{check_type, parse_card_id, DocumentError, WireDocument};

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    id: CardId,
    pub rev: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    pub imported: Option<DateTime<Utc>>,
    /// Model ordinal within the note's theme
    pub model: Option<u32>,
    pub due: Option<Due>,
    pub buried_until: Option<Due>,
    pub interval: Option<Interval>,
    pub suspended: bool,
    pub ease_factor: Option<f64>,
    pub review_count: u32,
    /// Opaque application state, carried through untouched
    pub context: Option<Value>,
}

impl Card {
    /// Create a new, never reviewed card.
    pub fn new(id: CardId, clock: &impl Clock) -> Result<Self, DocumentError> {
        if id.is_empty() {
            return Err(DocumentError::Validation(
                "card ID must name a bundle and a note".to_string(),
            ));
        }
        let now = clock.now();
        Ok(Self {
            id,
            rev: None,
            created: Some(now),
            modified: now,
            imported: None,
            model: None,
            due: None,
            buried_until: None,
            interval: None,
            suspended: false,
            ease_factor: None,
            review_count: 0,
            context: None,
        })
    }

    pub fn id(&self) -> &CardId {
        &self.id
    }

    pub fn bundle_id(&self) -> DocumentId {
        self.id.bundle_id()
    }

    pub fn note_id(&self) -> DocumentId {
        self.id.note_id()
    }

    pub fn ordinal(&self) -> u32 {
        self.id.ordinal()
    }

    pub fn is_buried(&self, at: DateTime<Utc>) -> bool {
        self.buried_until
            .map(|until| until.instant() > at)
            .unwrap_or(false)
    }

    /// Whether the card should be shown at `at`. New cards are always due.
    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        if self.suspended || self.is_buried(at) {
            return false;
        }
        self.due.map(|due| due.instant() <= at).unwrap_or(true)
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardWire {
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
    model: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due: Option<Due>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    buried_until: Option<Due>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval: Option<Interval>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    suspended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ease_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    review_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<Value>,
}

impl WireDocument for Card {
    const DOC_TYPE: DocType = DocType::Card;

    type Wire = CardWire;

    fn to_wire(&self) -> CardWire {
        CardWire {
            id: self.id.to_string(),
            rev: self.rev.clone(),
            doc_type: Self::DOC_TYPE.as_str().to_string(),
            created: self.created,
            modified: self.modified,
            imported: self.imported,
            model: self.model,
            due: self.due,
            buried_until: self.buried_until,
            interval: self.interval,
            suspended: self.suspended,
            ease_factor: self.ease_factor,
            review_count: self.review_count,
            context: self.context.clone(),
        }
    }

    fn from_wire(wire: CardWire) -> Result<Self, DocumentError> {
        check_type(&wire.doc_type, Self::DOC_TYPE)?;
        Ok(Self {
            id: parse_card_id(&wire.id)?,
            rev: wire.rev,
            created: wire.created,
            modified: wire.modified,
            imported: wire.imported,
            model: wire.model,
            due: wire.due,
            buried_until: wire.buried_until,
            interval: wire.interval,
            suspended: wire.suspended,
            ease_factor: wire.ease_factor,
            review_count: wire.review_count,
            context: wire.context,
        })
    }

    fn document_id(&self) -> DocumentId {
        self.id.to_document_id()
    }
}

wire_serde!(Card);

impl Importable for Card {
    fn import_id(&self) -> DocumentId {
        self.id.to_document_id()
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
        self.model = existing.model;
        self.due = existing.due;
        self.buried_until = existing.buried_until;
        self.interval = existing.interval;
        self.suspended = existing.suspended;
        self.ease_factor = existing.ease_factor;
        self.review_count = existing.review_count;
        self.context = existing.context.clone();
        self.modified = existing.modified;
        self.imported = existing.imported;
    }
}
