use crate::edit::{Edit, EditError, Replacement};
use crate::range::{Position, SourceRange};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A file of proposed edits, as written by a producer tool or by hand.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditBatch {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub edits: Vec<EditSpec>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Resolve relative `file` entries against the workspace root.
    #[serde(default)]
    pub workspace_relative: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditSpec {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub replacements: Vec<ReplacementSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplacementSpec {
    pub file: String,
    pub start: Position,
    pub end: Position,
    /// Omitted text means deletion.
    #[serde(default)]
    pub text: String,
}

impl EditBatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        for (index, edit) in self.edits.iter().enumerate() {
            let at = EditRef {
                index,
                label: edit.label.clone(),
            };

            if edit.replacements.is_empty() {
                issues.push(ValidationIssue::NoReplacements { edit: at.clone() });
            }

            for replacement in &edit.replacements {
                if replacement.file.trim().is_empty() {
                    issues.push(ValidationIssue::MissingFile { edit: at.clone() });
                }

                for pos in [replacement.start, replacement.end] {
                    if pos.line == 0 || pos.column == 0 {
                        issues.push(ValidationIssue::ZeroPosition {
                            edit: at.clone(),
                            position: pos,
                        });
                    }
                }

                if replacement.start > replacement.end {
                    issues.push(ValidationIssue::InvertedRange {
                        edit: at.clone(),
                        start: replacement.start,
                        end: replacement.end,
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Turn the batch into edits, preserving file order.
    ///
    /// With `workspace_relative` set, relative paths are joined onto
    /// `workspace_root`; otherwise they are kept as written.
    pub fn to_edits(&self, workspace_root: &Path) -> Result<Vec<Edit>, EditError> {
        self.edits
            .iter()
            .map(|spec| {
                let replacements = spec
                    .replacements
                    .iter()
                    .map(|r| {
                        let file = self.resolve_file(&r.file, workspace_root);
                        Replacement::new(SourceRange::new(file, r.start, r.end), r.text.clone())
                    })
                    .collect();
                let edit = Edit::new(replacements)?;
                Ok(match &spec.label {
                    Some(label) => edit.with_label(label.clone()),
                    None => edit,
                })
            })
            .collect()
    }

    fn resolve_file(&self, file: &str, workspace_root: &Path) -> PathBuf {
        let path = Path::new(file);
        if self.meta.workspace_relative && path.is_relative() {
            workspace_root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// Identifies an edit inside a batch for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRef {
    pub index: usize,
    pub label: Option<String>,
}

impl fmt::Display for EditRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "edit #{} ('{label}')", self.index + 1),
            None => write!(f, "edit #{}", self.index + 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    NoReplacements {
        edit: EditRef,
    },
    MissingFile {
        edit: EditRef,
    },
    ZeroPosition {
        edit: EditRef,
        position: Position,
    },
    InvertedRange {
        edit: EditRef,
        start: Position,
        end: Position,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit batch contains no edits"),
            ValidationIssue::NoReplacements { edit } => {
                write!(f, "{edit} has no replacements")
            }
            ValidationIssue::MissingFile { edit } => {
                write!(f, "{edit} has a replacement without a file")
            }
            ValidationIssue::ZeroPosition { edit, position } => write!(
                f,
                "{edit} uses position {position}; lines and columns start at 1"
            ),
            ValidationIssue::InvertedRange { edit, start, end } => {
                write!(f, "{edit} has a range starting at {start} after its end {end}")
            }
        }
    }
}
