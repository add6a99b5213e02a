//! Edit Arbiter: conflict-free application of independently produced edits.
//!
//! Fixers, lints, and refactorings each propose [`Edit`]s without knowing
//! about one another. The arbiter decides which of them can coexist and
//! materializes the resulting file contents.
//!
//! # Architecture
//!
//! - [`range`]: positions, file-scoped ranges, and the overlap predicate,
//!   parameterized by an injected [`PositionModel`].
//! - [`apply`]: the acceptance pass (earlier edits win, whole edits are kept
//!   or dropped) and the application pass (one load per file, replacements
//!   spliced from the end of the file backward).
//! - [`document`]: the [`DocumentLoader`] capability and line/column to
//!   offset conversion.
//!
//! Around the core sit producers and sinks: edit batch files ([`batch`]),
//! compiler suggestions ([`compiler`]), workspace confinement ([`safety`]),
//! and atomic write-back ([`output`]).
//!
//! # Guarantees
//!
//! - Every input edit is reported as applied or incompatible, never both
//! - No edit is partially applied, even across files
//! - Accepted replacements in a file never overlap
//! - Results are deterministic for a given input order
//!
//! # Example
//!
//! ```
//! use edit_arbiter::{apply_edits, Edit, MemoryLoader, Replacement, SourceRange};
//! use std::path::Path;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let loader = MemoryLoader::new().with_file("lib.rs", "abcdef");
//! let edits = vec![
//!     Edit::single(Replacement::new(SourceRange::on_line("lib.rs", 1, 2, 4), "X")).unwrap(),
//!     Edit::single(Replacement::new(SourceRange::on_line("lib.rs", 1, 3, 5), "Y")).unwrap(),
//! ];
//!
//! let result = apply_edits(edits, &loader).await.unwrap();
//! assert_eq!(result.applied.len(), 1);
//! assert_eq!(result.incompatible.len(), 1);
//! assert_eq!(result.edited_files[Path::new("lib.rs")], "aXdef");
//! # });
//! ```

pub mod apply;
pub mod batch;
pub mod compiler;
pub mod document;
pub mod edit;
pub mod output;
pub mod range;
pub mod safety;

// Re-exports
pub use apply::{apply_edits, ApplyError, EditApplier, EditResult, Partition};
pub use batch::{load_from_path, load_from_str, BatchFormat, ConfigError, EditBatch};
pub use document::{Document, DocumentError, DocumentLoader, FsLoader, LoadError, MemoryLoader};
pub use edit::{Edit, EditError, Replacement};
pub use output::{write_edited_files, WriteError};
pub use range::{overlaps, ClosedBounds, OpenBounds, Position, PositionModel, SourceRange};
pub use safety::{SafetyError, WorkspaceGuard};
