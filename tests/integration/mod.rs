//! Integration tests for the acceptance and application passes.

mod properties;
mod scenarios;

use edit_arbiter::{Edit, Replacement, SourceRange};

/// Single-line replacement of columns `[start, end)`.
pub fn rep(file: &str, start: usize, end: usize, text: &str) -> Replacement {
    Replacement::new(SourceRange::on_line(file, 1, start, end), text)
}

pub fn edit(replacements: Vec<Replacement>) -> Edit {
    Edit::new(replacements).expect("test edits are well formed")
}
