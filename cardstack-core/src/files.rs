//! Attachment storage shared between a document and its parts.
//!
//! A [`FileCollection`] is an arena of attachments keyed by escaped file name.
//! Parts of a document (a theme's models, a note's field values) each get a
//! view: a set of names in the arena they are allowed to see. Views are
//! addressed by [`ViewId`] handles issued by the collection.
//!
//! The document store reserves names starting with `_`, so names starting
//! with `_` or `^` are stored with an extra leading `^`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

const ESCAPE: char = '^';
const RESERVED: char = '_';

/// Errors from file collection operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("File already exists: {0}")]
    DuplicateFile(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Escape a file name for storage.
pub fn escape_name(name: &str) -> String {
    if name.starts_with(RESERVED) || name.starts_with(ESCAPE) {
        format!("{}{}", ESCAPE, name)
    } else {
        name.to_string()
    }
}

/// Reverse [`escape_name`].
pub fn unescape_name(name: &str) -> String {
    name.strip_prefix(ESCAPE).unwrap_or(name).to_string()
}

/// An immutable attached file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "content-type")]
    content_type: String,
    #[serde(rename = "data", with = "base64_data")]
    content: Vec<u8>,
}

impl Attachment {
    pub fn new(content_type: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

mod base64_data {
    use super::*;

    pub fn serialize<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(content))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let data = String::deserialize(deserializer)?;
        BASE64.decode(data).map_err(serde::de::Error::custom)
    }
}

/// Handle to a view within one [`FileCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(usize);

/// Attachment arena plus the membership sets of its views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCollection {
    files: BTreeMap<String, Attachment>,
    views: Vec<BTreeSet<String>>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty view.
    pub fn new_view(&mut self) -> ViewId {
        self.views.push(BTreeSet::new());
        ViewId(self.views.len() - 1)
    }

    /// Borrow a view for reading.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this collection.
    pub fn view(&self, id: ViewId) -> FileView<'_> {
        FileView {
            files: &self.files,
            members: &self.views[id.0],
        }
    }

    /// Borrow a view for writing.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this collection.
    pub fn view_mut(&mut self, id: ViewId) -> FileViewMut<'_> {
        assert!(id.0 < self.views.len(), "view {:?} not in collection", id);
        FileViewMut {
            collection: self,
            id,
        }
    }

    /// Look up a file regardless of view membership.
    pub fn get(&self, name: &str) -> Option<&Attachment> {
        self.files.get(&escape_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(&escape_name(name))
    }

    /// Unescaped names of every stored file, sorted.
    pub fn names(&self) -> Vec<String> {
        sorted_unescaped(self.files.keys())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remove a file from the collection and from every view that held it.
    pub fn remove_file(&mut self, name: &str) -> Option<Attachment> {
        let key = escape_name(name);
        let removed = self.files.remove(&key);
        for members in &mut self.views {
            members.remove(&key);
        }
        removed
    }

    fn insert(&mut self, id: ViewId, key: String, attachment: Attachment) {
        self.views[id.0].insert(key.clone());
        self.files.insert(key, attachment);
    }
}

fn sorted_unescaped<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut names: Vec<String> = keys.map(|k| unescape_name(k)).collect();
    names.sort();
    names
}

impl Serialize for FileCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.files.len()))?;
        for (key, attachment) in &self.files {
            map.serialize_entry(&unescape_name(key), attachment)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FileCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Attachment>::deserialize(deserializer)?;
        Ok(Self {
            files: raw
                .into_iter()
                .map(|(name, attachment)| (escape_name(&name), attachment))
                .collect(),
            views: Vec::new(),
        })
    }
}

/// Read access to one view.
#[derive(Debug, Clone, Copy)]
pub struct FileView<'a> {
    files: &'a BTreeMap<String, Attachment>,
    members: &'a BTreeSet<String>,
}

impl<'a> FileView<'a> {
    /// Look up a file visible through this view.
    pub fn get_file(&self, name: &str) -> Option<&'a Attachment> {
        let key = escape_name(name);
        if self.members.contains(&key) {
            self.files.get(&key)
        } else {
            None
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(&escape_name(name))
    }

    /// Unescaped member names, sorted.
    pub fn names(&self) -> Vec<String> {
        sorted_unescaped(self.members.iter())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Serialize for FileView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in &names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

/// Write access to one view.
#[derive(Debug)]
pub struct FileViewMut<'a> {
    collection: &'a mut FileCollection,
    id: ViewId,
}

impl FileViewMut<'_> {
    /// Store a file and grant this view access to it, replacing any file of
    /// the same name.
    pub fn set_file(
        &mut self,
        name: &str,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) {
        self.collection.insert(
            self.id,
            escape_name(name),
            Attachment::new(content_type, content),
        );
    }

    /// Like [`set_file`](Self::set_file), but fails if the name is already
    /// used anywhere in the collection.
    pub fn add_file(
        &mut self,
        name: &str,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Result<(), FileError> {
        let key = escape_name(name);
        if self.collection.files.contains_key(&key) {
            return Err(FileError::DuplicateFile(name.to_string()));
        }
        self.collection
            .insert(self.id, key, Attachment::new(content_type, content));
        Ok(())
    }

    /// Remove a file from the whole collection.
    pub fn remove_file(&mut self, name: &str) -> Option<Attachment> {
        self.collection.remove_file(name)
    }

    pub fn get_file(&self, name: &str) -> Option<&Attachment> {
        self.collection.view(self.id).get_file(name)
    }
}

/// View membership read from the wire, not yet bound to a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnresolvedView(Vec<String>);

impl UnresolvedView {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Register a view on `collection` holding these names.
    ///
    /// Every name must already exist in the collection.
    pub fn resolve(&self, collection: &mut FileCollection) -> Result<ViewId, FileError> {
        let mut members = BTreeSet::new();
        for name in &self.0 {
            let key = escape_name(name);
            if !collection.files.contains_key(&key) {
                tracing::warn!("View references missing file {:?}", name);
                return Err(FileError::FileNotFound(name.clone()));
            }
            members.insert(key);
        }
        let id = collection.new_view();
        collection.views[id.0] = members;
        Ok(id)
    }
}

impl From<FileView<'_>> for UnresolvedView {
    fn from(view: FileView<'_>) -> Self {
        Self(view.names())
    }
}
