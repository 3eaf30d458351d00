//! Note document.
//!
//! A note fills in the fields of one model. Each field value sees the
//! attachments it references through its own view on the note's collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::document_id::{DocType, DocumentId};
use crate::files::{FileCollection, FileView, FileViewMut, UnresolvedView, ViewId};
use crate::merge::Importable;

use super::theme::Theme;
use super::{check_type, parse_id, require_id, DocumentError, WireDocument};

/// The content of one field of a note.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub text: String,
    files: ViewId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FieldValueWire {
    #[serde(default)]
    text: String,
    #[serde(default, skip_serializing_if = "UnresolvedView::is_empty")]
    files: UnresolvedView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    id: DocumentId,
    pub rev: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    pub imported: Option<DateTime<Utc>>,
    theme: DocumentId,
    model: u32,
    field_values: Vec<FieldValue>,
    attachments: FileCollection,
}

impl Note {
    /// Create an empty note for model `model` of theme `theme`.
    pub fn new(
        id: DocumentId,
        theme: DocumentId,
        model: u32,
        clock: &impl Clock,
    ) -> Result<Self, DocumentError> {
        require_id(&id, DocType::Note)?;
        require_id(&theme, DocType::Theme)?;
        let now = clock.now();
        Ok(Self {
            id,
            rev: None,
            created: Some(now),
            modified: now,
            imported: None,
            theme,
            model,
            field_values: Vec::new(),
            attachments: FileCollection::new(),
        })
    }

    /// Create a note with one empty value per field of the model.
    pub fn for_model(
        id: DocumentId,
        theme: &Theme,
        model: u32,
        clock: &impl Clock,
    ) -> Result<Self, DocumentError> {
        let fields = theme
            .model(model)
            .ok_or_else(|| {
                DocumentError::Validation(format!("model {} not found in {}", model, theme.id()))
            })?
            .fields
            .len();

        let mut note = Self::new(id, theme.id().clone(), model, clock)?;
        for _ in 0..fields {
            note.push_field_value("");
        }
        Ok(note)
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn theme(&self) -> &DocumentId {
        &self.theme
    }

    pub fn model(&self) -> u32 {
        self.model
    }

    pub fn attachments(&self) -> &FileCollection {
        &self.attachments
    }

    /// Append a field value with its own file view; returns its index.
    pub fn push_field_value(&mut self, text: impl Into<String>) -> usize {
        let files = self.attachments.new_view();
        self.field_values.push(FieldValue {
            text: text.into(),
            files,
        });
        self.field_values.len() - 1
    }

    pub fn field_values(&self) -> &[FieldValue] {
        &self.field_values
    }

    pub fn field_value_mut(&mut self, index: usize) -> Option<&mut FieldValue> {
        self.field_values.get_mut(index)
    }

    pub fn field_files(&self, index: usize) -> Option<FileView<'_>> {
        let view = self.field_values.get(index)?.files;
        Some(self.attachments.view(view))
    }

    pub fn field_files_mut(&mut self, index: usize) -> Option<FileViewMut<'_>> {
        let view = self.field_values.get(index)?.files;
        Some(self.attachments.view_mut(view))
    }

    /// Remove an attachment from the note and from every field using it.
    pub fn remove_file(&mut self, name: &str) -> bool {
        self.attachments.remove_file(name).is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteWire {
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
    theme: String,
    model: u32,
    #[serde(default)]
    field_values: Vec<FieldValueWire>,
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "FileCollection::is_empty"
    )]
    attachments: FileCollection,
}

impl WireDocument for Note {
    const DOC_TYPE: DocType = DocType::Note;

    type Wire = NoteWire;

    fn to_wire(&self) -> NoteWire {
        debug_assert_eq!(self.id.doc_type(), Self::DOC_TYPE);
        NoteWire {
            id: self.id.to_string(),
            rev: self.rev.clone(),
            doc_type: Self::DOC_TYPE.as_str().to_string(),
            created: self.created,
            modified: self.modified,
            imported: self.imported,
            theme: self.theme.to_string(),
            model: self.model,
            field_values: self
                .field_values
                .iter()
                .map(|value| FieldValueWire {
                    text: value.text.clone(),
                    files: self.attachments.view(value.files).into(),
                })
                .collect(),
            attachments: self.attachments.clone(),
        }
    }

    fn from_wire(wire: NoteWire) -> Result<Self, DocumentError> {
        check_type(&wire.doc_type, Self::DOC_TYPE)?;

        let mut attachments = wire.attachments;
        let field_values = wire
            .field_values
            .into_iter()
            .map(|value| {
                Ok(FieldValue {
                    text: value.text,
                    files: value.files.resolve(&mut attachments)?,
                })
            })
            .collect::<Result<Vec<_>, DocumentError>>()?;

        Ok(Self {
            id: parse_id(&wire.id, DocType::Note)?,
            rev: wire.rev,
            created: wire.created,
            modified: wire.modified,
            imported: wire.imported,
            theme: parse_id(&wire.theme, DocType::Theme)?,
            model: wire.model,
            field_values,
            attachments,
        })
    }

    fn document_id(&self) -> DocumentId {
        self.id.clone()
    }
}

wire_serde!(Note);

impl Importable for Note {
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
        self.theme = existing.theme.clone();
        self.model = existing.model;
        self.field_values = existing.field_values.clone();
        self.attachments = existing.attachments.clone();
        self.modified = existing.modified;
        self.imported = existing.imported;
    }
}
