//! Compiler suggestions as an edit producer.
//!
//! Runs `cargo check --message-format=json`, keeps error and warning
//! diagnostics, and turns their machine-applicable suggestions into edits.
//! Suggestions from different diagnostics often touch the same code; the
//! arbiter decides which of them survive.
//!
//! # Example
//!
//! ```no_run
//! use edit_arbiter::compiler::{edits_from_diagnostics, run_cargo_check};
//! use std::path::Path;
//!
//! let workspace = Path::new("/path/to/crate");
//! let diagnostics = run_cargo_check(workspace, None).unwrap();
//! let edits = edits_from_diagnostics(&diagnostics);
//! println!("{} candidate fixes", edits.len());
//! ```

pub mod diagnostic;

pub use diagnostic::{CompileDiagnostic, DiagnosticError, SourceSpan, SuggestedFix};

use crate::edit::Edit;
use cargo_metadata::diagnostic::DiagnosticLevel;
use cargo_metadata::Message;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run `cargo check` and collect error and warning diagnostics.
///
/// A failing build is not an error here as long as it reported something:
/// its diagnostics are exactly what callers want to fix.
pub fn run_cargo_check(
    workspace: &Path,
    package: Option<&str>,
) -> Result<Vec<CompileDiagnostic>, DiagnosticError> {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(workspace)
        .args(["check", "--message-format=json"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(pkg) = package {
        cmd.args(["-p", pkg]);
    }

    // Disable incremental compilation for deterministic results
    cmd.env("CARGO_INCREMENTAL", "0");

    log::debug!("running cargo check in {}", workspace.display());
    let output = cmd
        .output()
        .map_err(|e| DiagnosticError::CargoFailed(format!("Failed to spawn cargo: {e}")))?;

    let diagnostics = parse_cargo_output(output.stdout.as_slice(), workspace)?;

    // Failed without a single diagnostic: cargo itself could not run the check
    if !output.status.success() && diagnostics.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiagnosticError::CargoFailed(stderr.trim().to_string()));
    }

    Ok(diagnostics)
}

/// Parse cargo JSON output into diagnostics.
pub fn parse_cargo_output<R: BufRead>(
    reader: R,
    workspace: &Path,
) -> Result<Vec<CompileDiagnostic>, DiagnosticError> {
    let mut diagnostics = Vec::new();

    for line in reader.lines() {
        let line = line?;

        // Proc macros and build scripts can print non-JSON lines
        if !line.starts_with('{') {
            continue;
        }

        let Ok(message) = serde_json::from_str::<Message>(&line) else {
            log::debug!("skipping unparseable cargo message");
            continue;
        };

        if let Message::CompilerMessage(msg) = message {
            if matches!(
                msg.message.level,
                DiagnosticLevel::Error | DiagnosticLevel::Warning
            ) {
                diagnostics.push(CompileDiagnostic::from_cargo(&msg.message, workspace));
            }
        }
    }

    Ok(diagnostics)
}

/// Machine-applicable edits across all diagnostics, in diagnostic order.
///
/// Cargo reports the same diagnostic once per target that compiles a file,
/// so exact duplicate edits are dropped; everything else is left for the
/// arbiter.
#[must_use]
pub fn edits_from_diagnostics(diagnostics: &[CompileDiagnostic]) -> Vec<Edit> {
    let mut seen = HashSet::new();
    diagnostics
        .iter()
        .flat_map(CompileDiagnostic::to_edits)
        .filter(|edit| seen.insert(edit.clone()))
        .collect()
}
