//! Typed document identifiers.
//!
//! A document ID is a document type tag plus raw identity bytes. The string
//! form is `<type>-<encoded identity>`. `user` and `bundle` IDs double as
//! database names in the document store, so their identities use lowercase
//! unpadded base32. The other types use unpadded URL-safe base64, except
//! cards, whose identity segment is the composite `<bundle>.<note>.<ordinal>`
//! (see [`CardId`](crate::CardId)).

use base64::{engine::general_purpose::URL_SAFE, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::card_id::CardId;

/// Separator between the type tag and the encoded identity
pub const SEPARATOR: char = '-';

const BASE32_BLOCK: usize = 8;
const BASE64_BLOCK: usize = 4;

/// Errors that can occur while parsing document IDs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentIdError {
    #[error("Invalid document ID format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Invalid identity encoding: {0}")]
    InvalidEncoding(String),
}

/// The closed set of document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocType {
    User,
    Bundle,
    Theme,
    Model,
    Note,
    Deck,
    Card,
    Review,
}

impl DocType {
    pub const ALL: [DocType; 8] = [
        DocType::User,
        DocType::Bundle,
        DocType::Theme,
        DocType::Model,
        DocType::Note,
        DocType::Deck,
        DocType::Card,
        DocType::Review,
    ];

    /// Returns the type tag used in IDs and in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::User => "user",
            DocType::Bundle => "bundle",
            DocType::Theme => "theme",
            DocType::Model => "model",
            DocType::Note => "note",
            DocType::Deck => "deck",
            DocType::Card => "card",
            DocType::Review => "review",
        }
    }

    /// Returns the identity encoding used for this type.
    pub fn encoding(&self) -> IdEncoding {
        match self {
            DocType::User | DocType::Bundle => IdEncoding::Base32,
            DocType::Card => IdEncoding::Composite,
            DocType::Theme | DocType::Model | DocType::Note | DocType::Deck | DocType::Review => {
                IdEncoding::Base64
            }
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DocumentIdError::UnsupportedType(s.to_string()))
    }
}

/// How the identity bytes of an ID are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdEncoding {
    /// Lowercase RFC 4648 base32 without padding
    Base32,
    /// URL-safe base64 without padding
    Base64,
    /// Card composite `<bundle>.<note>.<ordinal>`.
    ///
    /// The identity bytes are the canonical segment itself, as produced by
    /// [`CardId::segment`]. Other bytes do not round-trip.
    Composite,
}

impl IdEncoding {
    /// Encodes identity bytes. Never fails.
    pub fn encode(&self, identity: &[u8]) -> String {
        match self {
            IdEncoding::Base32 => {
                base32::encode(base32::Alphabet::Rfc4648 { padding: true }, identity)
                    .trim_end_matches('=')
                    .to_ascii_lowercase()
            }
            IdEncoding::Base64 => URL_SAFE.encode(identity).trim_end_matches('=').to_string(),
            IdEncoding::Composite => String::from_utf8_lossy(identity).into_owned(),
        }
    }

    /// Decodes an unpadded identity segment back into bytes.
    pub fn decode(&self, segment: &str) -> Result<Vec<u8>, DocumentIdError> {
        let invalid = || DocumentIdError::InvalidEncoding(segment.to_string());

        match self {
            IdEncoding::Base32 => {
                // Unpadded base32 never leaves 1, 3 or 6 trailing characters.
                if segment.contains('=') || matches!(segment.len() % BASE32_BLOCK, 1 | 3 | 6) {
                    return Err(invalid());
                }
                let padded = pad(&segment.to_ascii_uppercase(), BASE32_BLOCK);
                base32::decode(base32::Alphabet::Rfc4648 { padding: true }, &padded)
                    .ok_or_else(invalid)
            }
            IdEncoding::Base64 => {
                if segment.contains('=') {
                    return Err(invalid());
                }
                let padded = pad(segment, BASE64_BLOCK);
                URL_SAFE.decode(padded).map_err(|_| invalid())
            }
            IdEncoding::Composite => Ok(CardId::parse_segment(segment)?.segment().into_bytes()),
        }
    }
}

fn pad(segment: &str, block: usize) -> String {
    let mut padded = segment.to_string();
    while padded.len() % block != 0 {
        padded.push('=');
    }
    padded
}

/// Encodes a type tag and identity into `<type>-<encoded identity>`.
pub fn encode(doc_type: DocType, identity: &[u8]) -> String {
    format!(
        "{}{}{}",
        doc_type.as_str(),
        SEPARATOR,
        doc_type.encoding().encode(identity)
    )
}

/// Decodes an encoded ID string into its raw identity bytes.
pub fn decode(id: &str) -> Result<Vec<u8>, DocumentIdError> {
    DocumentId::parse(id).map(|id| id.identity)
}

/// A typed document identifier.
///
/// Equality and ordering are defined by `(doc_type, identity)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId {
    doc_type: DocType,
    identity: Vec<u8>,
}

impl DocumentId {
    /// Create a document ID from raw identity bytes
    pub fn new(doc_type: DocType, identity: impl Into<Vec<u8>>) -> Self {
        Self {
            doc_type,
            identity: identity.into(),
        }
    }

    /// Generate a random document ID backed by a v4 UUID
    pub fn random(doc_type: DocType) -> Self {
        Self::from_uuid(doc_type, Uuid::new_v4())
    }

    pub fn from_uuid(doc_type: DocType, uuid: Uuid) -> Self {
        Self::new(doc_type, uuid.as_bytes().to_vec())
    }

    /// Derive a stable ID from arbitrary input: the first 16 bytes of its SHA-256.
    pub fn derived(doc_type: DocType, input: &[u8]) -> Self {
        let hash = Sha256::digest(input);
        Self::new(doc_type, hash[..16].to_vec())
    }

    pub fn doc_type(&self) -> DocType {
        self.doc_type
    }

    pub fn identity(&self) -> &[u8] {
        &self.identity
    }

    pub fn is_empty(&self) -> bool {
        self.identity.is_empty()
    }

    /// The encoded identity, without the type prefix
    pub fn encoded_identity(&self) -> String {
        self.doc_type.encoding().encode(&self.identity)
    }

    /// Parse `<type>-<encoded identity>`.
    pub fn parse(s: &str) -> Result<Self, DocumentIdError> {
        let (tag, segment) = s
            .split_once(SEPARATOR)
            .ok_or_else(|| DocumentIdError::InvalidFormat(s.to_string()))?;
        let doc_type: DocType = tag.parse()?;
        let identity = doc_type.encoding().decode(segment)?;
        Ok(Self { doc_type, identity })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self.doc_type, &self.identity))
    }
}

impl FromStr for DocumentId {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DocumentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
