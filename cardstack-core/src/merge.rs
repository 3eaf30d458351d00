//! Merge-on-import.
//!
//! Importing a package may deliver a document the store already has from an
//! earlier import. Both copies are import snapshots, so the one modified
//! last wins. A document that was never imported (edited locally) is never
//! merged.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::document_id::DocumentId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Cannot merge {new} into {existing}: IDs differ")]
    IdMismatch {
        new: DocumentId,
        existing: DocumentId,
    },

    #[error("Cannot merge {0}: creation times differ")]
    CreatedMismatch(DocumentId),

    #[error("Cannot merge {0}: owner changed")]
    OwnershipChanged(DocumentId),

    #[error("Cannot merge {0}: not an import")]
    NotAnImport(DocumentId),
}

/// A document that can be reconciled with an earlier import of itself.
pub trait Importable {
    fn import_id(&self) -> DocumentId;

    fn created(&self) -> Option<DateTime<Utc>>;

    fn modified(&self) -> DateTime<Utc>;

    fn imported(&self) -> Option<DateTime<Utc>>;

    fn rev(&self) -> Option<&str>;

    fn set_rev(&mut self, rev: Option<String>);

    /// The owning user, for documents that have one
    fn owner(&self) -> Option<&DocumentId> {
        None
    }

    /// Copy the mutable content and the `modified`/`imported` stamps of
    /// `existing` into `self`.
    fn adopt(&mut self, existing: &Self);
}

/// Reconcile an incoming import `new` with the stored copy `existing`.
///
/// Returns `Ok(true)` when `new` is strictly newer and should replace the
/// stored copy. Returns `Ok(false)` when `existing` wins, in which case its
/// content has been copied into `new`. Either way `new` carries the stored
/// revision afterwards.
pub fn merge_import<T: Importable>(new: &mut T, existing: &T) -> Result<bool, MergeError> {
    let id = new.import_id();
    if id != existing.import_id() {
        return Err(MergeError::IdMismatch {
            new: id,
            existing: existing.import_id(),
        });
    }
    if new.created() != existing.created() {
        return Err(MergeError::CreatedMismatch(id));
    }
    if new.owner() != existing.owner() {
        return Err(MergeError::OwnershipChanged(id));
    }
    if new.imported().is_none() || existing.imported().is_none() {
        return Err(MergeError::NotAnImport(id));
    }

    new.set_rev(existing.rev().map(str::to_string));

    if new.modified() > existing.modified() {
        tracing::debug!("Import of {} is newer, replacing stored copy", id);
        return Ok(true);
    }

    tracing::debug!("Stored copy of {} is current, keeping it", id);
    new.adopt(existing);
    Ok(false)
}
