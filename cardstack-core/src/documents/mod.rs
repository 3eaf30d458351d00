//! Document types.
//!
//! # Document Structure
//!
//! Every document is stored in the document store as a JSON object with:
//!
//! - `_id`: the encoded [`DocumentId`]
//! - `_rev`: the store revision, when known
//! - `type`: the document type tag, always matching the `_id` prefix
//! - `created`, `modified`, `imported`: RFC 3339 timestamps (`modified`
//!   is always present)
//!
//! The top-level documents are:
//!
//! 1. **User**: an account, owner of bundles
//! 2. **Bundle**: the unit of ownership and sharing
//! 3. **Theme**: templates and styles, with embedded **Models**
//! 4. **Note**: field values for one model
//! 5. **Card**: one reviewable template rendering of a note
//! 6. **Deck**: a named set of cards
//! 7. **Review**: one study interaction with a card

/// Implements serde traits for a document through its wire form.
macro_rules! wire_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serde::Serialize::serialize(
                    &crate::documents::WireDocument::to_wire(self),
                    serializer,
                )
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                type Wire = <$ty as crate::documents::WireDocument>::Wire;
                let wire = <Wire as serde::Deserialize>::deserialize(deserializer)?;
                <$ty as crate::documents::WireDocument>::from_wire(wire)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

mod bundle;
mod card;
mod deck;
mod note;
mod review;
mod theme;
mod user;

pub use bundle::Bundle;
pub use card::Card;
pub use deck::Deck;
pub use note::{FieldValue, Note};
pub use review::{Answer, Review};
pub use theme::{Field, FieldType, Model, Theme};
pub use user::User;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::card_id::CardId;
use crate::document_id::{DocType, DocumentId, DocumentIdError};
use crate::files::FileError;
use crate::schedule::ScheduleError;

/// Errors from building or parsing documents
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Wrong document type: expected {expected}, found {found}")]
    WrongDocumentType { expected: DocType, found: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Id(#[from] DocumentIdError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A document with a JSON wire form.
///
/// `Wire` is the plain serde shape; conversion from it checks the type tag
/// and rebuilds anything that needs validation (IDs, file views).
pub trait WireDocument: Sized {
    const DOC_TYPE: DocType;

    type Wire: Serialize + DeserializeOwned;

    fn to_wire(&self) -> Self::Wire;

    fn from_wire(wire: Self::Wire) -> Result<Self, DocumentError>;

    fn document_id(&self) -> DocumentId;

    fn to_value(&self) -> Result<Value, DocumentError> {
        Ok(serde_json::to_value(self.to_wire())?)
    }

    fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(&self.to_wire())?)
    }

    fn from_value(value: Value) -> Result<Self, DocumentError> {
        check_type(document_type(&value)?, Self::DOC_TYPE)?;
        let wire: Self::Wire = serde_json::from_value(value)?;
        Self::from_wire(wire)
    }

    fn from_json(json: &str) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::from_str(json)?)
    }
}

fn document_type(value: &Value) -> Result<&str, DocumentError> {
    value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DocumentError::Validation("document has no type".to_string()))
}

/// Fail unless the `type` tag names `expected`.
pub(crate) fn check_type(tag: &str, expected: DocType) -> Result<(), DocumentError> {
    if tag == expected.as_str() {
        Ok(())
    } else {
        Err(DocumentError::WrongDocumentType {
            expected,
            found: tag.to_string(),
        })
    }
}

/// Fail unless `id` is a non-empty ID of type `expected`.
pub(crate) fn require_id(id: &DocumentId, expected: DocType) -> Result<(), DocumentError> {
    if id.doc_type() != expected {
        return Err(DocumentError::WrongDocumentType {
            expected,
            found: id.doc_type().to_string(),
        });
    }
    if id.is_empty() {
        return Err(DocumentError::Validation(format!(
            "{} ID must not be empty",
            expected
        )));
    }
    Ok(())
}

/// Parse a wire ID and require it to be of type `expected`.
pub(crate) fn parse_id(raw: &str, expected: DocType) -> Result<DocumentId, DocumentError> {
    let id = DocumentId::parse(raw)?;
    require_id(&id, expected)?;
    Ok(id)
}

/// Parse a wire card ID into its composite parts.
pub(crate) fn parse_card_id(raw: &str) -> Result<CardId, DocumentError> {
    let id = parse_id(raw, DocType::Card)?;
    Ok(CardId::try_from(&id)?)
}

/// Any top-level document.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    User(User),
    Bundle(Bundle),
    Theme(Theme),
    Note(Note),
    Deck(Deck),
    Card(Card),
    Review(Review),
}

impl Document {
    /// Parse a document of any type, dispatching on its `type` tag.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let doc_type: DocType = document_type(&value)?.parse()?;
        match doc_type {
            DocType::User => User::from_value(value).map(Document::User),
            DocType::Bundle => Bundle::from_value(value).map(Document::Bundle),
            DocType::Theme => Theme::from_value(value).map(Document::Theme),
            DocType::Note => Note::from_value(value).map(Document::Note),
            DocType::Deck => Deck::from_value(value).map(Document::Deck),
            DocType::Card => Card::from_value(value).map(Document::Card),
            DocType::Review => Review::from_value(value).map(Document::Review),
            DocType::Model => Err(DocumentError::Validation(
                "models are stored inside their theme".to_string(),
            )),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn doc_type(&self) -> DocType {
        match self {
            Document::User(_) => User::DOC_TYPE,
            Document::Bundle(_) => Bundle::DOC_TYPE,
            Document::Theme(_) => Theme::DOC_TYPE,
            Document::Note(_) => Note::DOC_TYPE,
            Document::Deck(_) => Deck::DOC_TYPE,
            Document::Card(_) => Card::DOC_TYPE,
            Document::Review(_) => Review::DOC_TYPE,
        }
    }

    pub fn id(&self) -> DocumentId {
        match self {
            Document::User(doc) => doc.document_id(),
            Document::Bundle(doc) => doc.document_id(),
            Document::Theme(doc) => doc.document_id(),
            Document::Note(doc) => doc.document_id(),
            Document::Deck(doc) => doc.document_id(),
            Document::Card(doc) => doc.document_id(),
            Document::Review(doc) => doc.document_id(),
        }
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::User(doc) => doc.serialize(serializer),
            Document::Bundle(doc) => doc.serialize(serializer),
            Document::Theme(doc) => doc.serialize(serializer),
            Document::Note(doc) => doc.serialize(serializer),
            Document::Deck(doc) => doc.serialize(serializer),
            Document::Card(doc) => doc.serialize(serializer),
            Document::Review(doc) => doc.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_dispatch_on_type() {
        let bundle = Bundle::new(
            DocumentId::new(DocType::Bundle, b"foo".to_vec()),
            DocumentId::new(DocType::User, b"bob".to_vec()),
            &clock(),
        )
        .unwrap();
        let json = bundle.to_json().unwrap();

        let doc = Document::from_json(&json).unwrap();
        assert_eq!(doc.doc_type(), DocType::Bundle);
        assert_eq!(doc.id(), bundle.document_id());
        assert_eq!(doc, Document::Bundle(bundle));
        assert_eq!(doc.to_json().unwrap(), json);
    }

    #[test]
    fn test_dispatch_unknown_type() {
        let result = Document::from_json(r#"{"_id": "x-y", "type": "widget"}"#);
        assert!(matches!(
            result,
            Err(DocumentError::Id(DocumentIdError::UnsupportedType(_)))
        ));
    }

    #[test]
    fn test_dispatch_missing_type() {
        let result = Document::from_json(r#"{"_id": "bundle-mzxw6"}"#);
        assert!(matches!(result, Err(DocumentError::Validation(_))));
    }

    #[test]
    fn test_models_are_not_documents() {
        let result = Document::from_json(r#"{"_id": "model-AA", "type": "model"}"#);
        assert!(matches!(result, Err(DocumentError::Validation(_))));
    }

    #[test]
    fn test_require_id() {
        let id = DocumentId::new(DocType::Deck, b"d".to_vec());
        assert!(require_id(&id, DocType::Deck).is_ok());
        assert!(matches!(
            require_id(&id, DocType::Note),
            Err(DocumentError::WrongDocumentType { .. })
        ));
        let empty = DocumentId::new(DocType::Deck, Vec::new());
        assert!(matches!(
            require_id(&empty, DocType::Deck),
            Err(DocumentError::Validation(_))
        ));
    }
}
