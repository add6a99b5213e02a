//! Diagnostic types for parsing cargo check output.
//!
//! Wraps cargo_metadata diagnostics and groups each suggestion's spans into
//! a candidate fix that can become one atomic [`Edit`].

use crate::edit::{Edit, Replacement};
use crate::range::{Position, SourceRange};
use cargo_metadata::diagnostic::{
    Applicability, Diagnostic as CargoDiagnostic, DiagnosticLevel, DiagnosticSpan,
};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// A compile diagnostic with its candidate fixes.
#[derive(Debug, Clone)]
pub struct CompileDiagnostic {
    /// Error code or lint name (e.g., "E0063", "unused_imports")
    pub code: Option<String>,
    pub message: String,
    pub level: DiagnosticLevel,
    /// Primary and secondary spans inside the workspace
    pub spans: Vec<SourceSpan>,
    /// One entry per suggestion the compiler offered
    pub fixes: Vec<SuggestedFix>,
    pub rendered: Option<String>,
}

/// A workspace-local span of a diagnostic.
#[derive(Debug, Clone)]
pub struct SourceSpan {
    pub range: SourceRange,
    pub byte_start: usize,
    pub byte_end: usize,
    pub is_primary: bool,
    /// If this span is inside a macro expansion
    pub is_macro_expansion: bool,
}

/// A compiler suggestion: every span it rewrites, all or nothing.
#[derive(Debug, Clone)]
pub struct SuggestedFix {
    /// Human-readable description of the fix
    pub message: String,
    /// `MachineApplicable` only when every span of the suggestion is
    pub applicability: Applicability,
    pub replacements: Vec<Replacement>,
}

#[derive(Error, Debug)]
pub enum DiagnosticError {
    #[error("Failed to run cargo check: {0}")]
    CargoFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileDiagnostic {
    /// Convert from a cargo_metadata diagnostic.
    pub fn from_cargo(diag: &CargoDiagnostic, workspace_root: &Path) -> Self {
        let spans = diag
            .spans
            .iter()
            .filter_map(|span| SourceSpan::from_cargo(span, workspace_root))
            .collect();

        let mut fixes = Vec::new();
        let own_fix_message = diag.message.clone();
        if let Some(fix) = SuggestedFix::from_spans(&diag.spans, own_fix_message, workspace_root) {
            fixes.push(fix);
        }
        collect_fixes(&diag.children, workspace_root, &mut fixes);

        CompileDiagnostic {
            code: diag.code.as_ref().map(|c| c.code.clone()),
            message: diag.message.clone(),
            level: diag.level.clone(),
            spans,
            fixes,
            rendered: diag.rendered.clone(),
        }
    }

    pub fn is_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }

    pub fn machine_applicable_fixes(&self) -> impl Iterator<Item = &SuggestedFix> {
        self.fixes
            .iter()
            .filter(|fix| fix.applicability == Applicability::MachineApplicable)
    }

    /// Edits for every machine-applicable fix, labelled with the lint or
    /// error code and the fix description.
    pub fn to_edits(&self) -> Vec<Edit> {
        self.machine_applicable_fixes()
            .filter_map(|fix| {
                let edit = Edit::new(fix.replacements.clone()).ok()?;
                let label = match &self.code {
                    Some(code) => format!("{code}: {}", fix.message),
                    None => fix.message.clone(),
                };
                Some(edit.with_label(label))
            })
            .collect()
    }
}

impl SourceSpan {
    /// Convert from a cargo_metadata span, dropping spans that point outside
    /// the workspace or into its build output. Registry and toolchain sources
    /// always live outside the workspace.
    fn from_cargo(span: &DiagnosticSpan, workspace_root: &Path) -> Option<Self> {
        let file_path = Path::new(&span.file_name);
        if file_path.components().any(|c| c == Component::ParentDir) {
            return None;
        }

        let file: PathBuf = if file_path.is_absolute() {
            file_path.to_path_buf()
        } else {
            workspace_root.join(file_path)
        };

        if !file.starts_with(workspace_root) || file.starts_with(workspace_root.join("target")) {
            return None;
        }

        let range = SourceRange::new(
            file,
            Position::new(span.line_start, span.column_start),
            Position::new(span.line_end, span.column_end),
        );

        Some(SourceSpan {
            range,
            byte_start: span.byte_start as usize,
            byte_end: span.byte_end as usize,
            is_primary: span.is_primary,
            is_macro_expansion: span.expansion.is_some(),
        })
    }
}

impl SuggestedFix {
    /// Build a fix from the spans of one diagnostic node that carry a
    /// suggested replacement.
    ///
    /// Returns `None` when no span carries a suggestion, or when any of them
    /// cannot be used (outside the workspace, or inside a macro expansion):
    /// applying the rest would break the suggestion's atomicity.
    fn from_spans(spans: &[DiagnosticSpan], message: String, workspace_root: &Path) -> Option<Self> {
        let mut replacements = Vec::new();
        let mut applicability = Applicability::MachineApplicable;

        for span in spans {
            let Some(text) = &span.suggested_replacement else {
                continue;
            };

            let source_span = SourceSpan::from_cargo(span, workspace_root)?;
            if source_span.is_macro_expansion {
                return None;
            }

            let span_applicability = span
                .suggestion_applicability
                .clone()
                .unwrap_or(Applicability::Unspecified);
            if span_applicability != Applicability::MachineApplicable {
                applicability = span_applicability;
            }

            replacements.push(Replacement::new(source_span.range, text.clone()));
        }

        if replacements.is_empty() {
            return None;
        }

        Some(SuggestedFix {
            message,
            applicability,
            replacements,
        })
    }
}

/// Recursively collect one fix per child diagnostic.
fn collect_fixes(children: &[CargoDiagnostic], workspace_root: &Path, out: &mut Vec<SuggestedFix>) {
    for child in children {
        if let Some(fix) = SuggestedFix::from_spans(&child.spans, child.message.clone(), workspace_root)
        {
            out.push(fix);
        }
        collect_fixes(&child.children, workspace_root, out);
    }
}
