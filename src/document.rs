//! Loaded documents and the loader capability the applier depends on.
//!
//! A [`Document`] owns a file's text and converts line/column positions into
//! byte offsets into that text. Columns count chars, so multi-byte UTF-8 is
//! handled without splitting a code point.

use crate::range::{Position, SourceRange};
use crate::safety::{SafetyError, WorkspaceGuard};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Invalid position {0}: lines and columns are 1-based")]
    ZeroPosition(Position),

    #[error("Line {line} is past the end of the document ({lines} lines)")]
    LineOutOfBounds { line: usize, lines: usize },

    #[error("Column {column} is past the end of line {line} ({len} chars)")]
    ColumnOutOfBounds {
        line: usize,
        column: usize,
        len: usize,
    },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No such document: {0}")]
    NotFound(PathBuf),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

/// A file's contents plus its line table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    /// Byte offset at which each line starts; always begins with 0.
    line_starts: Vec<usize>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of `pos`.
    ///
    /// A column one past the last char of a line is valid and addresses the
    /// end of that line (after its newline, if any).
    pub fn offset(&self, pos: Position) -> Result<usize, DocumentError> {
        if pos.line == 0 || pos.column == 0 {
            return Err(DocumentError::ZeroPosition(pos));
        }

        let Some(&line_start) = self.line_starts.get(pos.line - 1) else {
            return Err(DocumentError::LineOutOfBounds {
                line: pos.line,
                lines: self.line_count(),
            });
        };
        let line_end = self
            .line_starts
            .get(pos.line)
            .copied()
            .unwrap_or(self.text.len());
        let line = &self.text[line_start..line_end];

        let column = pos.column - 1;
        if let Some((i, _)) = line.char_indices().nth(column) {
            return Ok(line_start + i);
        }

        let len = line.chars().count();
        if column == len {
            Ok(line_end)
        } else {
            Err(DocumentError::ColumnOutOfBounds {
                line: pos.line,
                column: pos.column,
                len,
            })
        }
    }

    /// Byte offsets `[start, end)` covered by `range`.
    pub fn offsets(&self, range: &SourceRange) -> Result<Range<usize>, DocumentError> {
        Ok(self.offset(range.start)?..self.offset(range.end)?)
    }
}

/// Source of document contents, called once per affected file.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Identity of the document `file` names.
    ///
    /// Two paths with the same key are the same document: the applier groups
    /// and overlap-checks replacements by key, and loads each key once.
    fn key(&self, file: &Path) -> Result<PathBuf, LoadError> {
        Ok(file.to_path_buf())
    }

    async fn load(&self, file: &Path) -> Result<Document, LoadError>;
}

/// Reads documents from disk, optionally confined to a workspace.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    guard: Option<WorkspaceGuard>,
}

impl FsLoader {
    /// Loader that reads paths exactly as given.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that resolves relative paths against the guard's workspace and
    /// refuses anything outside it.
    pub fn guarded(guard: WorkspaceGuard) -> Self {
        Self { guard: Some(guard) }
    }

    pub fn guard(&self) -> Option<&WorkspaceGuard> {
        self.guard.as_ref()
    }
}

#[async_trait]
impl DocumentLoader for FsLoader {
    /// Canonical path, resolved against the workspace when guarded, so
    /// `lib.rs`, `./lib.rs` and `<root>/lib.rs` share one key.
    fn key(&self, file: &Path) -> Result<PathBuf, LoadError> {
        match &self.guard {
            Some(guard) => Ok(guard.resolve(file)?),
            None => file.canonicalize().map_err(|source| LoadError::Io {
                path: file.to_path_buf(),
                source,
            }),
        }
    }

    async fn load(&self, file: &Path) -> Result<Document, LoadError> {
        let path = match &self.guard {
            Some(guard) => guard.resolve(file)?,
            None => file.to_path_buf(),
        };

        log::debug!("loading {}", path.display());
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Io { path, source })?;
        Ok(Document::new(text))
    }
}

/// In-memory documents keyed by path.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
    loads: AtomicUsize,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Number of `load` calls served so far, including failed ones.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentLoader for MemoryLoader {
    async fn load(&self, file: &Path) -> Result<Document, LoadError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.files
            .get(file)
            .map(|text| Document::new(text.clone()))
            .ok_or_else(|| LoadError::NotFound(file.to_path_buf()))
    }
}
