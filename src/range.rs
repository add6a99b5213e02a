//! File-scoped source ranges and the overlap predicate.
//!
//! Ranges are expressed as 1-based line/column pairs, the same convention
//! rustc uses for diagnostic spans. Whether a position sitting exactly on a
//! range boundary counts as "inside" is decided by a [`PositionModel`], which
//! callers inject so alternative document models can be substituted.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

/// A location in a file: 1-based line, 1-based column counted in chars.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span between two positions of one file.
///
/// Offset conversion treats the span as half-open `[start, end)`; a range
/// with `start == end` is a point used for pure insertions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub file: PathBuf,
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    pub fn new(file: impl Into<PathBuf>, start: Position, end: Position) -> Self {
        Self {
            file: file.into(),
            start,
            end,
        }
    }

    /// Zero-width range at `at`.
    pub fn point(file: impl Into<PathBuf>, at: Position) -> Self {
        Self::new(file, at, at)
    }

    /// Range covering columns `[start_col, end_col)` of a single line.
    pub fn on_line(file: impl Into<PathBuf>, line: usize, start_col: usize, end_col: usize) -> Self {
        Self::new(
            file,
            Position::new(line, start_col),
            Position::new(line, end_col),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.file.display(), self.start, self.end)
    }
}

/// Ordering and boundary semantics for positions within a range.
///
/// Implementations must be pure. The applier relies on `compare` for its
/// rightmost-first ordering and on `contains` for overlap detection.
pub trait PositionModel {
    /// Total order of two positions in the same file.
    fn compare(&self, a: Position, b: Position) -> Ordering {
        a.cmp(&b)
    }

    /// Whether `pos` lies inside `range`.
    fn contains(&self, range: &SourceRange, pos: Position) -> bool;
}

/// Boundary positions count as inside, so touching ranges conflict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosedBounds;

impl PositionModel for ClosedBounds {
    fn contains(&self, range: &SourceRange, pos: Position) -> bool {
        self.compare(range.start, pos) != Ordering::Greater
            && self.compare(pos, range.end) != Ordering::Greater
    }
}

/// Only strictly interior positions count as inside, so touching ranges
/// (one ending where the next begins) are compatible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenBounds;

impl PositionModel for OpenBounds {
    fn contains(&self, range: &SourceRange, pos: Position) -> bool {
        self.compare(range.start, pos) == Ordering::Less
            && self.compare(pos, range.end) == Ordering::Less
    }
}

impl<M: PositionModel + ?Sized> PositionModel for &M {
    fn compare(&self, a: Position, b: Position) -> Ordering {
        (**self).compare(a, b)
    }

    fn contains(&self, range: &SourceRange, pos: Position) -> bool {
        (**self).contains(range, pos)
    }
}

/// Whether two ranges conflict under `model`.
///
/// Ranges in different files never overlap. Identical ranges always do,
/// including two insertions at the same point. Otherwise the ranges overlap
/// when an endpoint of either lies inside the other.
pub fn overlaps<M: PositionModel + ?Sized>(model: &M, a: &SourceRange, b: &SourceRange) -> bool {
    if a.file != b.file {
        return false;
    }

    if a.start == b.start && a.end == b.end {
        return true;
    }

    model.contains(a, b.start)
        || model.contains(a, b.end)
        || model.contains(b, a.start)
        || model.contains(b, a.end)
}
