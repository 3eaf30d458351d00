//! Review document: one study interaction with a card.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::card_id::CardId;
use crate::clock::Clock;
use crate::document_id::{DocType, DocumentId};
use crate::schedule::Interval;

use super::{check_type, parse_card_id, parse_id, DocumentError, WireDocument};

/// How well the card was recalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Again,
    Hard,
    Good,
    Easy,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Answer::Again => "again",
            Answer::Hard => "hard",
            Answer::Good => "good",
            Answer::Easy => "easy",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    id: DocumentId,
    pub rev: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    pub imported: Option<DateTime<Utc>>,
    card: CardId,
    timestamp: DateTime<Utc>,
    pub answer: Answer,
    /// Milliseconds between showing the card and answering
    pub response_time: Option<u64>,
    pub interval: Option<Interval>,
    pub last_interval: Option<Interval>,
    pub ease_factor: Option<f64>,
}

impl Review {
    /// Record an answer to `card` at the current time.
    ///
    /// The review ID is derived from the card and the timestamp, so
    /// recording the same review twice yields the same document.
    pub fn new(card: CardId, answer: Answer, clock: &impl Clock) -> Result<Self, DocumentError> {
        if card.is_empty() {
            return Err(DocumentError::Validation(
                "review must reference a card".to_string(),
            ));
        }
        let timestamp = clock.now();
        Ok(Self {
            id: Self::derive_id(&card, timestamp),
            rev: None,
            created: Some(timestamp),
            modified: timestamp,
            imported: None,
            card,
            timestamp,
            answer,
            response_time: None,
            interval: None,
            last_interval: None,
            ease_factor: None,
        })
    }

    fn derive_id(card: &CardId, timestamp: DateTime<Utc>) -> DocumentId {
        let input = format!(
            "{}@{}",
            card,
            timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        );
        DocumentId::derived(DocType::Review, input.as_bytes())
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn card(&self) -> &CardId {
        &self.card
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWire {
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
    card: String,
    timestamp: DateTime<Utc>,
    answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval: Option<Interval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_interval: Option<Interval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ease_factor: Option<f64>,
}

impl WireDocument for Review {
    const DOC_TYPE: DocType = DocType::Review;

    type Wire = ReviewWire;

    fn to_wire(&self) -> ReviewWire {
        debug_assert_eq!(self.id.doc_type(), Self::DOC_TYPE);
        ReviewWire {
            id: self.id.to_string(),
            rev: self.rev.clone(),
            doc_type: Self::DOC_TYPE.as_str().to_string(),
            created: self.created,
            modified: self.modified,
            imported: self.imported,
            card: self.card.to_string(),
            timestamp: self.timestamp,
            answer: self.answer,
            response_time: self.response_time,
            interval: self.interval,
            last_interval: self.last_interval,
            ease_factor: self.ease_factor,
        }
    }

    fn from_wire(wire: ReviewWire) -> Result<Self, DocumentError> {
        check_type(&wire.doc_type, Self::DOC_TYPE)?;
        Ok(Self {
            id: parse_id(&wire.id, DocType::Review)?,
            rev: wire.rev,
            created: wire.created,
            modified: wire.modified,
            imported: wire.imported,
            card: parse_card_id(&wire.card)?,
            timestamp: wire.timestamp,
            answer: wire.answer,
            response_time: wire.response_time,
            interval: wire.interval,
            last_interval: wire.last_interval,
            ease_factor: wire.ease_factor,
        })
    }

    fn document_id(&self) -> DocumentId {
        self.id.clone()
    }
}

wire_serde!(Review);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, TimeZone};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2017, 1, 1, 12, 0, 0).unwrap())
    }

    fn card() -> CardId {
        CardId::new(b"foo".to_vec(), b"bar".to_vec(), 0)
    }

    #[test]
    fn test_review_id_is_derived() {
        let first = Review::new(card(), Answer::Good, &clock()).unwrap();
        let again = Review::new(card(), Answer::Hard, &clock()).unwrap();
        assert_eq!(first.id(), again.id());
        assert_eq!(first.id().doc_type(), DocType::Review);
        assert_eq!(first.id().identity().len(), 16);

        let later = FixedClock(clock().0 + Duration::seconds(1));
        let other = Review::new(card(), Answer::Good, &later).unwrap();
        assert_ne!(first.id(), other.id());
    }

    #[test]
    fn test_review_requires_card() {
        let card = CardId::new(b"foo".to_vec(), Vec::new(), 0);
        let result = Review::new(card, Answer::Again, &clock());
        assert!(matches!(result, Err(DocumentError::Validation(_))));
    }

    #[test]
    fn test_review_json_roundtrip() {
        let mut original = Review::new(card(), Answer::Easy, &clock()).unwrap();
        original.response_time = Some(4200);
        original.interval = Some(Interval::days(3));
        original.last_interval = Some(Interval::days(1));
        original.ease_factor = Some(2.6);

        let json = original.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "review");
        assert_eq!(value["card"], "card-mzxw6.YmFy.0");
        assert_eq!(value["answer"], "easy");
        assert_eq!(value["responseTime"], 4200);
        assert_eq!(value["lastInterval"], "1d");
        assert_eq!(value["timestamp"], "2017-01-01T12:00:00Z");

        let parsed = Review::from_json(&json).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.to_json().unwrap(), json);
    }

    #[test]
    fn test_review_unknown_answer() {
        let mut value = Review::new(card(), Answer::Good, &clock())
            .unwrap()
            .to_value()
            .unwrap();
        value["answer"] = serde_json::json!("perfect");
        assert!(matches!(
            Review::from_value(value),
            Err(DocumentError::Json(_))
        ));
    }

    #[test]
    fn test_answer_display() {
        assert_eq!(Answer::Again.to_string(), "again");
        assert_eq!(Answer::Easy.to_string(), "easy");
    }
}
