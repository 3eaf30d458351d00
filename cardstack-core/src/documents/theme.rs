//! Theme document and its embedded models.
//!
//! A theme owns one attachment collection (stylesheets, templates, images).
//! The theme itself sees the files in its `files` view; each model sees the
//! files in its own view on the same collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::clock::Clock;
use crate::document_id::{DocType, DocumentId};
use crate::files::{FileCollection, FileView, FileViewMut, UnresolvedView, ViewId};
use crate::merge::Importable;

use super::{check_type, parse_id, require_id, DocumentError, WireDocument};

/// Kind of content a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Html,
    Image,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub field_type: FieldType,
    pub name: String,
}

impl Field {
    pub fn new(field_type: FieldType, name: impl Into<String>) -> Self {
        Self {
            field_type,
            name: name.into(),
        }
    }
}

/// A note type: the fields a note fills in and the templates that turn a
/// note into cards. One card is generated per template.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    id: u32,
    pub model_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub templates: Vec<String>,
    pub fields: Vec<Field>,
    pub modified: DateTime<Utc>,
    files: ViewId,
}

impl Model {
    /// Ordinal of the model within its theme
    pub fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelWire {
    id: u32,
    model_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    templates: Vec<String>,
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "UnresolvedView::is_empty")]
    files: UnresolvedView,
    modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    id: DocumentId,
    pub rev: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    pub imported: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub description: Option<String>,
    attachments: FileCollection,
    files: ViewId,
    model_sequence: u32,
    models: Vec<Model>,
}

impl Theme {
    pub fn new(id: DocumentId, clock: &impl Clock) -> Result<Self, DocumentError> {
        require_id(&id, DocType::Theme)?;
        let now = clock.now();
        let mut attachments = FileCollection::new();
        let files = attachments.new_view();
        Ok(Self {
            id,
            rev: None,
            created: Some(now),
            modified: now,
            imported: None,
            name: None,
            description: None,
            attachments,
            files,
            model_sequence: 0,
            models: Vec::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Every attachment of the theme and its models
    pub fn attachments(&self) -> &FileCollection {
        &self.attachments
    }

    /// Remove an attachment from the theme and from every model that used it.
    pub fn remove_file(&mut self, name: &str) -> bool {
        self.attachments.remove_file(name).is_some()
    }

    /// Files visible at theme level
    pub fn files(&self) -> FileView<'_> {
        self.attachments.view(self.files)
    }

    pub fn files_mut(&mut self) -> FileViewMut<'_> {
        self.attachments.view_mut(self.files)
    }

    /// Next model ordinal to be allocated
    pub fn model_sequence(&self) -> u32 {
        self.model_sequence
    }

    /// Add a model of `model_type`, allocating the next ordinal and a
    /// fresh file view for it.
    pub fn new_model(&mut self, model_type: impl Into<String>, clock: &impl Clock) -> &mut Model {
        let files = self.attachments.new_view();
        let id = self.model_sequence;
        self.model_sequence += 1;
        self.models.push(Model {
            id,
            model_type: model_type.into(),
            name: None,
            description: None,
            templates: Vec::new(),
            fields: Vec::new(),
            modified: clock.now(),
            files,
        });
        let last = self.models.len() - 1;
        &mut self.models[last]
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, id: u32) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn model_mut(&mut self, id: u32) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.id == id)
    }

    /// Files visible to the model `id`
    pub fn model_files(&self, id: u32) -> Option<FileView<'_>> {
        let view = self.model(id)?.files;
        Some(self.attachments.view(view))
    }

    pub fn model_files_mut(&mut self, id: u32) -> Option<FileViewMut<'_>> {
        let view = self.model(id)?.files;
        Some(self.attachments.view_mut(view))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeWire {
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
    models: Vec<ModelWire>,
    #[serde(default)]
    model_sequence: u32,
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "FileCollection::is_empty"
    )]
    attachments: FileCollection,
    #[serde(default, skip_serializing_if = "UnresolvedView::is_empty")]
    files: UnresolvedView,
}

impl WireDocument for Theme {
    const DOC_TYPE: DocType = DocType::Theme;

    type Wire = ThemeWire;

    fn to_wire(&self) -> ThemeWire {
        debug_assert_eq!(self.id.doc_type(), Self::DOC_TYPE);
        ThemeWire {
            id: self.id.to_string(),
            rev: self.rev.clone(),
            doc_type: Self::DOC_TYPE.as_str().to_string(),
            created: self.created,
            modified: self.modified,
            imported: self.imported,
            name: self.name.clone(),
            description: self.description.clone(),
            models: self
                .models
                .iter()
                .map(|model| ModelWire {
                    id: model.id,
                    model_type: model.model_type.clone(),
                    name: model.name.clone(),
                    description: model.description.clone(),
                    templates: model.templates.clone(),
                    fields: model.fields.clone(),
                    files: self.attachments.view(model.files).into(),
                    modified: model.modified,
                })
                .collect(),
            model_sequence: self.model_sequence,
            attachments: self.attachments.clone(),
            files: self.files().into(),
        }
    }

    fn from_wire(wire: ThemeWire) -> Result<Self, DocumentError> {
        check_type(&wire.doc_type, Self::DOC_TYPE)?;
        let id = parse_id(&wire.id, DocType::Theme)?;

        let mut attachments = wire.attachments;
        let files = wire.files.resolve(&mut attachments)?;

        let mut seen = BTreeSet::new();
        let mut models = Vec::with_capacity(wire.models.len());
        for model in wire.models {
            if !seen.insert(model.id) {
                return Err(DocumentError::Validation(format!(
                    "duplicate model {} in {}",
                    model.id, id
                )));
            }
            if model.id >= wire.model_sequence {
                return Err(DocumentError::Validation(format!(
                    "model {} in {} is not below modelSequence {}",
                    model.id, id, wire.model_sequence
                )));
            }
            models.push(Model {
                id: model.id,
                model_type: model.model_type,
                name: model.name,
                description: model.description,
                templates: model.templates,
                fields: model.fields,
                modified: model.modified,
                files: model.files.resolve(&mut attachments)?,
            });
        }

        Ok(Self {
            id,
            rev: wire.rev,
            created: wire.created,
            modified: wire.modified,
            imported: wire.imported,
            name: wire.name,
            description: wire.description,
            attachments,
            files,
            model_sequence: wire.model_sequence,
            models,
        })
    }

    fn document_id(&self) -> DocumentId {
        self.id.clone()
    }
}

wire_serde!(Theme);

impl Importable for Theme {
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
        self.attachments = existing.attachments.clone();
        self.files = existing.files;
        self.model_sequence = existing.model_sequence;
        self.models = existing.models.clone();
        self.modified = existing.modified;
        self.imported = existing.imported;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::files::FileError;
    use chrono::TimeZone;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap())
    }

    fn theme() -> Theme {
        let clock = clock();
        let mut theme = Theme::new(DocumentId::new(DocType::Theme, b"theme".to_vec()), &clock)
            .unwrap()
            .with_name("Basic");
        theme
            .files_mut()
            .add_file("_style.css", "text/css", "body{}")
            .unwrap();

        let model = theme.new_model("basic", &clock);
        model.name = Some("Basic".to_string());
        model.templates = vec!["front".to_string()];
        model.fields = vec![
            Field::new(FieldType::Text, "Front"),
            Field::new(FieldType::Text, "Back"),
        ];
        theme
            .model_files_mut(0)
            .unwrap()
            .add_file("front.html", "text/html", "{{Front}}")
            .unwrap();
        theme
    }

    #[test]
    fn test_new_model_allocates_ordinals() {
        let mut theme = theme();
        let second = theme.new_model("cloze", &clock()).id();
        assert_eq!(second, 1);
        assert_eq!(theme.model_sequence(), 2);
        assert_eq!(theme.models().len(), 2);
    }

    #[test]
    fn test_model_views_are_isolated() {
        let theme = theme();
        assert!(theme.files().get_file("_style.css").is_some());
        assert!(theme.files().get_file("front.html").is_none());
        let model_files = theme.model_files(0).unwrap();
        assert!(model_files.get_file("front.html").is_some());
        assert!(model_files.get_file("_style.css").is_none());
        assert_eq!(theme.attachments().len(), 2);
    }

    #[test]
    fn test_names_unique_across_theme_and_models() {
        let mut theme = theme();
        let result = theme
            .model_files_mut(0)
            .unwrap()
            .add_file("_style.css", "text/css", "");
        assert_eq!(
            result,
            Err(FileError::DuplicateFile("_style.css".to_string()))
        );
    }

    #[test]
    fn test_remove_file_cascades_to_models() {
        let mut theme = theme();
        assert!(theme.remove_file("front.html"));
        assert!(theme.model_files(0).unwrap().is_empty());
        assert!(!theme.remove_file("front.html"));
    }

    #[test]
    fn test_theme_wire_format() {
        let json = theme().to_value().unwrap();
        assert_eq!(json["_id"], "theme-dGhlbWU");
        assert_eq!(json["type"], "theme");
        assert_eq!(json["modelSequence"], 1);
        assert_eq!(json["files"], serde_json::json!(["_style.css"]));
        assert_eq!(json["models"][0]["files"], serde_json::json!(["front.html"]));
        assert_eq!(json["models"][0]["modelType"], "basic");
        assert_eq!(json["models"][0]["fields"][0]["fieldType"], "text");
        assert_eq!(
            json["_attachments"]["_style.css"],
            serde_json::json!({"content-type": "text/css", "data": "Ym9keXt9"})
        );
    }

    #[test]
    fn test_theme_json_roundtrip() {
        let original = theme();
        let json = original.to_json().unwrap();
        let parsed = Theme::from_json(&json).unwrap();

        assert_eq!(parsed.to_json().unwrap(), json);
        assert!(parsed.files().get_file("_style.css").is_some());
        assert!(parsed.model_files(0).unwrap().get_file("front.html").is_some());
        assert!(parsed.model_files(0).unwrap().get_file("_style.css").is_none());
    }

    #[test]
    fn test_theme_view_references_missing_file() {
        let mut json = theme().to_value().unwrap();
        json["models"][0]["files"] = serde_json::json!(["missing.html"]);
        assert!(matches!(
            Theme::from_value(json),
            Err(DocumentError::File(FileError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_theme_duplicate_model_ids() {
        let mut json = theme().to_value().unwrap();
        let model = json["models"][0].clone();
        json["models"].as_array_mut().unwrap().push(model);
        json["modelSequence"] = serde_json::json!(5);
        assert!(matches!(
            Theme::from_value(json),
            Err(DocumentError::Validation(_))
        ));
    }

    #[test]
    fn test_theme_model_above_sequence() {
        let mut json = theme().to_value().unwrap();
        json["modelSequence"] = serde_json::json!(0);
        assert!(matches!(
            Theme::from_value(json),
            Err(DocumentError::Validation(_))
        ));
    }
}
