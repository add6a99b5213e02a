//! Edit batches: a file format for handing edits to the arbiter.

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, BatchFormat, ConfigError};
pub use schema::{
    EditBatch, EditRef, EditSpec, Metadata, ReplacementSpec, ValidationError, ValidationIssue,
};
