//! Packages: documents bundled for bulk export and import.
//!
//! A package holds at most one bundle plus the themes, notes, decks, cards
//! and reviews that belong to it. Every card must be listed by exactly one
//! deck, and every card a deck lists must be in the package.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::card_id::CardId;
use crate::document_id::DocumentId;
use crate::documents::{Bundle, Card, Deck, DocumentError, Note, Review, Theme};

/// Current package format version
pub const PACKAGE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Unsupported package version: {0}")]
    UnsupportedVersion(u32),

    #[error("Deck {deck} references card {card}, which is not in the package")]
    MissingCard { deck: DocumentId, card: CardId },

    #[error("Card {card} is referenced by both {first} and {second}")]
    DuplicateCardReference {
        card: CardId,
        first: DocumentId,
        second: DocumentId,
    },

    #[error("Card {0} is not in any deck")]
    OrphanCard(CardId),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Invalid package JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<Bundle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub themes: Vec<Theme>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decks: Vec<Deck>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

impl Package {
    pub fn new() -> Self {
        Self {
            version: PACKAGE_VERSION,
            bundle: None,
            themes: Vec::new(),
            notes: Vec::new(),
            decks: Vec::new(),
            cards: Vec::new(),
            reviews: Vec::new(),
        }
    }

    /// Total number of documents in the package
    pub fn len(&self) -> usize {
        usize::from(self.bundle.is_some())
            + self.themes.len()
            + self.notes.len()
            + self.decks.len()
            + self.cards.len()
            + self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that decks and cards reference each other one to one.
    ///
    /// Reports the first problem found: a deck listing a card the package
    /// lacks, then a card listed by two decks, then a card no deck lists.
    pub fn validate(&self) -> Result<(), PackageError> {
        let cards: BTreeSet<&CardId> = self.cards.iter().map(Card::id).collect();

        for deck in &self.decks {
            if let Some(card) = deck.cards().find(|card| !cards.contains(card)) {
                tracing::warn!("Deck {} references missing card {}", deck.id(), card);
                return Err(PackageError::MissingCard {
                    deck: deck.id().clone(),
                    card: card.clone(),
                });
            }
        }

        let mut owners: BTreeMap<&CardId, &DocumentId> = BTreeMap::new();
        for deck in &self.decks {
            for card in deck.cards() {
                if let Some(first) = owners.insert(card, deck.id()) {
                    tracing::warn!("Card {} is in more than one deck", card);
                    return Err(PackageError::DuplicateCardReference {
                        card: card.clone(),
                        first: first.clone(),
                        second: deck.id().clone(),
                    });
                }
            }
        }

        if let Some(card) = self.cards.iter().find(|card| !owners.contains_key(card.id())) {
            tracing::warn!("Card {} is not in any deck", card.id());
            return Err(PackageError::OrphanCard(card.id().clone()));
        }

        tracing::debug!("Validated package with {} documents", self.len());
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, PackageError> {
        let package: Package = serde_json::from_str(json)?;
        if package.version != PACKAGE_VERSION {
            return Err(PackageError::UnsupportedVersion(package.version));
        }
        Ok(package)
    }

    pub fn to_json(&self) -> Result<String, PackageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read_from_path(path: &Path) -> Result<Self, PackageError> {
        tracing::debug!("Reading package from {}", path.display());
        let json = std::fs::read_to_string(path).map_err(|source| PackageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), PackageError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| PackageError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
