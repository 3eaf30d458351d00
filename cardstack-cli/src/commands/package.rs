//! Package file commands.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use cardstack_core::{Package, PackageError, WireDocument};

use crate::config::{Config, OutputFormat};

/// Inspect package files
#[derive(Args)]
pub struct PackageCommand {
    #[command(subcommand)]
    command: PackageSubcommand,
}

#[derive(Subcommand)]
enum PackageSubcommand {
    /// Check that every card belongs to exactly one deck
    Validate {
        /// Path to the package JSON file
        file: PathBuf,
    },

    /// Summarize the contents of a package
    Show {
        /// Path to the package JSON file
        file: PathBuf,
        /// Output format
        #[arg(long, short, value_enum)]
        format: Option<OutputFormat>,
    },
}

impl PackageCommand {
    pub fn run(&self, config: &Config) -> Result<(), PackageCmdError> {
        match &self.command {
            PackageSubcommand::Validate { file } => {
                let package = Package::read_from_path(file)?;
                package.validate()?;
                println!(
                    "{}: valid ({} documents)",
                    file.display(),
                    package.len()
                );
                Ok(())
            }
            PackageSubcommand::Show { file, format } => {
                let package = Package::read_from_path(file)?;
                let summary = PackageSummary::new(&package, Utc::now());
                match format.unwrap_or(config.format.value) {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&summary)?);
                    }
                    OutputFormat::Text => summary.print(),
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageSummary {
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle_name: Option<String>,
    themes: usize,
    models: usize,
    notes: usize,
    cards: usize,
    due_cards: usize,
    reviews: usize,
    decks: Vec<DeckSummary>,
    /// Validation problem, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeckSummary {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    cards: usize,
}

impl PackageSummary {
    fn new(package: &Package, now: DateTime<Utc>) -> Self {
        Self {
            version: package.version,
            bundle: package.bundle.as_ref().map(|b| b.document_id().to_string()),
            bundle_name: package.bundle.as_ref().and_then(|b| b.name.clone()),
            themes: package.themes.len(),
            models: package.themes.iter().map(|t| t.models().len()).sum(),
            notes: package.notes.len(),
            cards: package.cards.len(),
            due_cards: package.cards.iter().filter(|c| c.is_due(now)).count(),
            reviews: package.reviews.len(),
            decks: package
                .decks
                .iter()
                .map(|deck| DeckSummary {
                    id: deck.id().to_string(),
                    name: deck.name.clone(),
                    cards: deck.len(),
                })
                .collect(),
            problem: package.validate().err().map(|e| e.to_string()),
        }
    }

    fn print(&self) {
        println!("Package (version {})", self.version);
        println!("===================\n");

        match (&self.bundle, &self.bundle_name) {
            (Some(id), Some(name)) => println!("Bundle: {} ({})", name, id),
            (Some(id), None) => println!("Bundle: {}", id),
            _ => println!("Bundle: none"),
        }
        println!();

        println!("Themes:  {} ({} models)", self.themes, self.models);
        println!("Notes:   {}", self.notes);
        println!("Cards:   {} ({} due)", self.cards, self.due_cards);
        println!("Reviews: {}", self.reviews);
        println!();

        println!("Decks: {}", self.decks.len());
        for deck in &self.decks {
            let name = deck.name.as_deref().unwrap_or("(unnamed)");
            println!("  - {} [{}]: {} cards", name, deck.id, deck.cards);
        }

        if let Some(problem) = &self.problem {
            println!();
            println!("Invalid: {}", problem);
        }
    }
}

/// Errors from package command
#[derive(Debug)]
pub enum PackageCmdError {
    Package(PackageError),
    Json(serde_json::Error),
}

impl std::fmt::Display for PackageCmdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageCmdError::Package(e) => write!(f, "{}", e),
            PackageCmdError::Json(e) => write!(f, "Failed to format output: {}", e),
        }
    }
}

impl std::error::Error for PackageCmdError {}

impl From<PackageError> for PackageCmdError {
    fn from(e: PackageError) -> Self {
        PackageCmdError::Package(e)
    }
}

impl From<serde_json::Error> for PackageCmdError {
    fn from(e: serde_json::Error) -> Self {
        PackageCmdError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardstack_core::{Bundle, Card, CardId, DocType, Deck, DocumentId, FixedClock};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap())
    }

    fn sample(with_deck: bool) -> Package {
        let card_id = CardId::new(b"foo".to_vec(), b"bar".to_vec(), 0);
        let mut package = Package::new();
        package.bundle = Some(
            Bundle::new(
                DocumentId::new(DocType::Bundle, b"foo".to_vec()),
                DocumentId::new(DocType::User, b"bob".to_vec()),
                &clock(),
            )
            .unwrap()
            .with_name("Spanish"),
        );
        package.cards.push(Card::new(card_id.clone(), &clock()).unwrap());
        if with_deck {
            let mut deck =
                Deck::new(DocumentId::new(DocType::Deck, b"verbs".to_vec()), &clock()).unwrap();
            deck.add_card(card_id);
            package.decks.push(deck);
        }
        package
    }

    #[test]
    fn test_summary_of_valid_package() {
        let summary = PackageSummary::new(&sample(true), clock().0);
        assert_eq!(summary.bundle.as_deref(), Some("bundle-mzxw6"));
        assert_eq!(summary.bundle_name.as_deref(), Some("Spanish"));
        assert_eq!(summary.cards, 1);
        assert_eq!(summary.due_cards, 1);
        assert_eq!(summary.decks.len(), 1);
        assert_eq!(summary.decks[0].cards, 1);
        assert!(summary.problem.is_none());
    }

    #[test]
    fn test_summary_reports_orphans() {
        let summary = PackageSummary::new(&sample(false), clock().0);
        let problem = summary.problem.unwrap();
        assert!(problem.contains("not in any deck"));
    }

    #[test]
    fn test_summary_json_keys() {
        let summary = PackageSummary::new(&sample(true), clock().0);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["bundleName"], "Spanish");
        assert_eq!(value["dueCards"], 1);
        assert!(value.get("problem").is_none());
    }

    #[test]
    fn test_read_written_package() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("package.json");
        sample(true).write_to_path(&path).unwrap();

        let package = Package::read_from_path(&path).unwrap();
        assert!(package.validate().is_ok());
    }
}
