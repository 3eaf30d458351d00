//! Bundle document.
//!
//! A bundle is the unit of ownership: themes, notes, decks and cards are
//! shared by sharing the bundle that holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::document_id::{DocType, DocumentId};
use crate::merge::Importable;

use super::{check_type, parse_id, require_id, DocumentError, WireDocument};

#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    id: DocumentId,
    pub rev: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    pub imported: Option<DateTime<Utc>>,
    owner: DocumentId,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Bundle {
    /// Create a bundle owned by the user `owner`.
    pub fn new(
        id: DocumentId,
        owner: DocumentId,
        clock: &impl Clock,
    ) -> Result<Self, DocumentError> {
        require_id(&id, DocType::Bundle)?;
        require_id(&owner, DocType::User)?;
        let now = clock.now();
        Ok(Self {
            id,
            rev: None,
            created: Some(now),
            modified: now,
            imported: None,
            owner,
            name: None,
            description: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn owner(&self) -> &DocumentId {
        &self.owner
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleWire {
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
    owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl WireDocument for Bundle {
    const DOC_TYPE: DocType = DocType::Bundle;

    type Wire = BundleWire;

    fn to_wire(&self) -> BundleWire {
        debug_assert_eq!(self.id.doc_type(), Self::DOC_TYPE);
        BundleWire {
            id: self.id.to_string(),
            rev: self.rev.clone(),
            doc_type: Self::DOC_TYPE.as_str().to_string(),
            created: self.created,
            modified: self.modified,
            imported: self.imported,
            owner: self.owner.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    fn from_wire(wire: BundleWire) -> Result<Self, DocumentError> {
        check_type(&wire.doc_type, Self::DOC_TYPE)?;
        Ok(Self {
            id: parse_id(&wire.id, DocType::Bundle)?,
            rev: wire.rev,
            created: wire.created,
            modified: wire.modified,
            imported: wire.imported,
            owner: parse_id(&wire.owner, DocType::User)?,
            name: wire.name,
            description: wire.description,
        })
    }

    fn document_id(&self) -> DocumentId {
        self.id.clone()
    }
}

wire_serde!(Bundle);

impl Importable for Bundle {
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

    fn owner(&self) -> Option<&DocumentId> {
        Some(&self.owner)
    }

    fn adopt(&mut self, existing: &Self) {
        self.name = existing.name.clone();
        self.description = existing.description.clone();
        self.modified = existing.modified;
        self.imported = existing.imported;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::merge::{merge_import, MergeError};
    use chrono::{Duration, TimeZone};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap())
    }

    fn bundle() -> Bundle {
        Bundle::new(
            DocumentId::new(DocType::Bundle, b"foo".to_vec()),
            DocumentId::new(DocType::User, b"bob".to_vec()),
            &clock(),
        )
        .unwrap()
    }

    fn imported(mut bundle: Bundle, name: &str, modified_days: i64) -> Bundle {
        bundle.name = Some(name.to_string());
        bundle.modified = bundle.modified + Duration::days(modified_days);
        bundle.imported = Some(bundle.modified + Duration::days(1));
        bundle
    }

    #[test]
    fn test_bundle_new() {
        let bundle = bundle().with_name("Spanish").with_description("Verbs");
        assert_eq!(bundle.id().to_string(), "bundle-mzxw6");
        assert_eq!(bundle.owner().to_string(), "user-mjxwe");
        assert_eq!(bundle.created, Some(clock().0));
        assert_eq!(bundle.modified, clock().0);
        assert!(bundle.imported.is_none());
        assert_eq!(bundle.name.as_deref(), Some("Spanish"));
    }

    #[test]
    fn test_bundle_requires_user_owner() {
        let result = Bundle::new(
            DocumentId::new(DocType::Bundle, b"foo".to_vec()),
            DocumentId::new(DocType::Deck, b"bob".to_vec()),
            &clock(),
        );
        assert!(matches!(
            result,
            Err(DocumentError::WrongDocumentType { expected: DocType::User, .. })
        ));
    }

    #[test]
    fn test_bundle_requires_id() {
        let result = Bundle::new(
            DocumentId::new(DocType::Bundle, Vec::new()),
            DocumentId::new(DocType::User, b"bob".to_vec()),
            &clock(),
        );
        assert!(matches!(result, Err(DocumentError::Validation(_))));
    }

    #[test]
    fn test_bundle_wire_format() {
        let json = bundle().to_value().unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "_id": "bundle-mzxw6",
                "type": "bundle",
                "created": "2017-01-01T00:00:00Z",
                "modified": "2017-01-01T00:00:00Z",
                "owner": "user-mjxwe",
            })
        );
    }

    #[test]
    fn test_bundle_json_roundtrip() {
        let mut original = bundle().with_name("Spanish");
        original.rev = Some("1-abc".to_string());
        let json = original.to_json().unwrap();
        let parsed = Bundle::from_json(&json).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.to_json().unwrap(), json);
    }

    #[test]
    fn test_bundle_wrong_type_tag() {
        let json = r#"{
            "_id": "bundle-mzxw6",
            "type": "deck",
            "modified": "2017-01-01T00:00:00Z",
            "owner": "user-mjxwe"
        }"#;
        assert!(matches!(
            Bundle::from_json(json),
            Err(DocumentError::WrongDocumentType { expected: DocType::Bundle, .. })
        ));
    }

    #[test]
    fn test_bundle_id_of_wrong_type() {
        let json = r#"{
            "_id": "deck-Zm9v",
            "type": "bundle",
            "modified": "2017-01-01T00:00:00Z",
            "owner": "user-mjxwe"
        }"#;
        assert!(matches!(
            Bundle::from_json(json),
            Err(DocumentError::WrongDocumentType { .. })
        ));
    }

    #[test]
    fn test_bundle_invalid_owner() {
        let json = r#"{
            "_id": "bundle-mzxw6",
            "type": "bundle",
            "modified": "2017-01-01T00:00:00Z",
            "owner": "bob"
        }"#;
        assert!(matches!(Bundle::from_json(json), Err(DocumentError::Id(_))));
    }

    #[test]
    fn test_merge_newer_import_wins() {
        let mut existing = imported(bundle(), "Old", 1);
        existing.rev = Some("2-stored".to_string());
        let mut new = imported(bundle(), "New", 2);

        assert_eq!(merge_import(&mut new, &existing), Ok(true));
        assert_eq!(new.name.as_deref(), Some("New"));
        assert_eq!(new.rev.as_deref(), Some("2-stored"));
    }

    #[test]
    fn test_merge_older_import_adopts_existing() {
        let existing = imported(bundle(), "Current", 3);
        let mut new = imported(bundle(), "Stale", 2);

        assert_eq!(merge_import(&mut new, &existing), Ok(false));
        assert_eq!(new.name.as_deref(), Some("Current"));
        assert_eq!(new.modified, existing.modified);
        assert_eq!(new.imported, existing.imported);
    }

    #[test]
    fn test_merge_tie_keeps_existing() {
        let existing = imported(bundle(), "Stored", 2);
        let mut new = imported(bundle(), "Incoming", 2);

        assert_eq!(merge_import(&mut new, &existing), Ok(false));
        assert_eq!(new.name.as_deref(), Some("Stored"));
    }

    #[test]
    fn test_merge_owner_changed() {
        let existing = imported(bundle(), "A", 1);
        let mut new = Bundle::new(
            DocumentId::new(DocType::Bundle, b"foo".to_vec()),
            DocumentId::new(DocType::User, b"alice".to_vec()),
            &clock(),
        )
        .unwrap();
        new = imported(new, "A", 2);

        assert!(matches!(
            merge_import(&mut new, &existing),
            Err(MergeError::OwnershipChanged(_))
        ));
    }

    #[test]
    fn test_merge_requires_imports() {
        let existing = bundle();
        let mut new = imported(bundle(), "A", 2);
        assert!(matches!(
            merge_import(&mut new, &existing),
            Err(MergeError::NotAnImport(_))
        ));
    }

    #[test]
    fn test_merge_id_and_created_checks() {
        let existing = imported(bundle(), "A", 1);

        let mut other = Bundle::new(
            DocumentId::new(DocType::Bundle, b"bar".to_vec()),
            DocumentId::new(DocType::User, b"bob".to_vec()),
            &clock(),
        )
        .unwrap();
        other = imported(other, "A", 2);
        assert!(matches!(
            merge_import(&mut other, &existing),
            Err(MergeError::IdMismatch { .. })
        ));

        let mut recreated = imported(bundle(), "A", 2);
        recreated.created = None;
        assert!(matches!(
            merge_import(&mut recreated, &existing),
            Err(MergeError::CreatedMismatch(_))
        ));
    }
}
