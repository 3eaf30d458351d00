//! Cardstack Core Library
//!
//! Document model for the Cardstack flashcard store: typed document IDs,
//! attachment collections, the document types, packages and merge-on-import.

pub mod card_id;
pub mod clock;
pub mod document_id;
pub mod documents;
pub mod files;
pub mod merge;
pub mod package;
pub mod schedule;

pub use card_id::CardId;
pub use clock::{Clock, FixedClock, SystemClock};
pub use document_id::{DocType, DocumentId, DocumentIdError, IdEncoding};
pub use documents::{
    Answer, Bundle, Card, Deck, Document, DocumentError, Field, FieldType, FieldValue, Model, Note,
    Review, Theme, User, WireDocument,
};
pub use files::{Attachment, FileCollection, FileError, FileView, FileViewMut, ViewId};
pub use merge::{merge_import, Importable, MergeError};
pub use package::{Package, PackageError, PACKAGE_VERSION};
pub use schedule::{Due, Interval, ScheduleError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
