use crate::range::{Position, SourceRange};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single span-and-text substitution.
///
/// An empty `text` deletes the span; an empty span inserts `text` at a point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Replacement {
    pub range: SourceRange,
    pub text: String,
}

impl Replacement {
    pub fn new(range: SourceRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(file: impl Into<PathBuf>, at: Position, text: impl Into<String>) -> Self {
        Self::new(SourceRange::point(file, at), text)
    }

    pub fn delete(range: SourceRange) -> Self {
        Self::new(range, "")
    }

    pub fn file(&self) -> &Path {
        &self.range.file
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {:?}", self.range, self.text)
    }
}

/// An atomic group of replacements: either all take effect or none do.
///
/// Replacements may span several files. Construction goes through
/// [`Edit::new`], so every `Edit` in circulation is non-empty and has no
/// inverted ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[must_use = "Edit does nothing until handed to an EditApplier"]
pub struct Edit {
    label: Option<String>,
    replacements: Vec<Replacement>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Edit contains no replacements")]
    Empty,

    #[error("Inverted range in {file}: start {start} is after end {end}")]
    InvertedRange {
        file: PathBuf,
        start: Position,
        end: Position,
    },
}

impl Edit {
    /// Build an edit, rejecting an empty list or any range whose start is
    /// after its end.
    pub fn new(replacements: Vec<Replacement>) -> Result<Self, EditError> {
        if replacements.is_empty() {
            return Err(EditError::Empty);
        }

        if let Some(bad) = replacements.iter().find(|r| r.range.is_inverted()) {
            return Err(EditError::InvertedRange {
                file: bad.range.file.clone(),
                start: bad.range.start,
                end: bad.range.end,
            });
        }

        Ok(Self {
            label: None,
            replacements,
        })
    }

    /// Convenience for the common single-replacement case.
    pub fn single(replacement: Replacement) -> Result<Self, EditError> {
        Self::new(vec![replacement])
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// Distinct files touched by this edit, in first-seen order.
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = Vec::new();
        for replacement in &self.replacements {
            if !files.contains(&replacement.file()) {
                files.push(replacement.file());
            }
        }
        files
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            return write!(f, "{label}");
        }
        let first = &self.replacements[0];
        match self.replacements.len() {
            1 => write!(f, "{first}"),
            n => write!(f, "{first} (+{} more)", n - 1),
        }
    }
}
