//! Metadata loader.
//!
//! Structural decoding only: shapes and field types are checked, references are not.

mod document;
mod records;

pub use document::MetadataDocument;
pub use records::{RawColumn, RawForeignKey, RawIndex, RawTable};
