//! Document ID commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use cardstack_core::{CardId, DocType, DocumentId, DocumentIdError};

use crate::config::{Config, OutputFormat};

/// Encode and decode document IDs
#[derive(Args)]
pub struct IdCommand {
    #[command(subcommand)]
    command: IdSubcommand,
}

#[derive(Subcommand)]
enum IdSubcommand {
    /// Encode UTF-8 text as the identity of a document ID
    Encode {
        /// Document type (user, bundle, theme, model, note, deck, card, review)
        doc_type: String,
        /// Identity text; for cards, `<bundle>.<note>.<ordinal>`
        text: String,
    },

    /// Decode a document ID into its type and identity
    Decode {
        id: String,
        /// Output format
        #[arg(long, short, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate a random document ID
    Random {
        /// Document type
        doc_type: String,
    },
}

impl IdCommand {
    pub fn run(&self, config: &Config) -> Result<(), IdError> {
        match &self.command {
            IdSubcommand::Encode { doc_type, text } => {
                println!("{}", encode_text(doc_type, text)?);
                Ok(())
            }
            IdSubcommand::Decode { id, format } => {
                let decoded = decode_id(id)?;
                match format.unwrap_or(config.format.value) {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&decoded)?);
                    }
                    OutputFormat::Text => print_decoded(&decoded),
                }
                Ok(())
            }
            IdSubcommand::Random { doc_type } => {
                let doc_type: DocType = doc_type.parse()?;
                if doc_type == DocType::Card {
                    return Err(IdError::CompositeOnly);
                }
                println!("{}", DocumentId::random(doc_type));
                Ok(())
            }
        }
    }
}

/// A decoded ID, ready for display
#[derive(Debug, Serialize, PartialEq)]
struct DecodedId {
    #[serde(rename = "type")]
    doc_type: String,
    /// Identity as text, when it is valid UTF-8
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    card: Option<DecodedCard>,
}

#[derive(Debug, Serialize, PartialEq)]
struct DecodedCard {
    bundle: String,
    note: String,
    ordinal: u32,
}

fn encode_text(doc_type: &str, text: &str) -> Result<DocumentId, IdError> {
    let doc_type: DocType = doc_type.parse()?;
    if doc_type == DocType::Card {
        // Check the composite structure before wrapping it.
        let card = CardId::parse_segment(text)?;
        return Ok(card.to_document_id());
    }
    Ok(DocumentId::new(doc_type, text.as_bytes()))
}

fn decode_id(raw: &str) -> Result<DecodedId, IdError> {
    let id = DocumentId::parse(raw)?;
    let card = match id.doc_type() {
        DocType::Card => {
            let card = CardId::try_from(&id)?;
            Some(DecodedCard {
                bundle: card.bundle_id().to_string(),
                note: card.note_id().to_string(),
                ordinal: card.ordinal(),
            })
        }
        _ => None,
    };
    Ok(DecodedId {
        doc_type: id.doc_type().to_string(),
        text: std::str::from_utf8(id.identity()).ok().map(str::to_string),
        hex: hex::encode(id.identity()),
        card,
    })
}

fn print_decoded(decoded: &DecodedId) {
    println!("type:     {}", decoded.doc_type);
    if let Some(text) = &decoded.text {
        println!("identity: {}", text);
    }
    println!("hex:      {}", decoded.hex);
    if let Some(card) = &decoded.card {
        println!("bundle:   {}", card.bundle);
        println!("note:     {}", card.note);
        println!("ordinal:  {}", card.ordinal);
    }
}

/// Errors from id command
#[derive(Debug)]
pub enum IdError {
    InvalidId(DocumentIdError),
    CompositeOnly,
    Json(serde_json::Error),
}

impl std::fmt::Display for IdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdError::InvalidId(e) => write!(f, "{}", e),
            IdError::CompositeOnly => {
                write!(f, "Card IDs are built from a bundle, a note and an ordinal")
            }
            IdError::Json(e) => write!(f, "Failed to format output: {}", e),
        }
    }
}

impl std::error::Error for IdError {}

impl From<DocumentIdError> for IdError {
    fn from(e: DocumentIdError) -> Self {
        IdError::InvalidId(e)
    }
}

impl From<serde_json::Error> for IdError {
    fn from(e: serde_json::Error) -> Self {
        IdError::Json(e)
    }
}
