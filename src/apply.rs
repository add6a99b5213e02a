//! Conflict resolution and rightmost-first application of edits.
//!
//! Application happens in two passes. The acceptance pass walks edits in
//! input order and keeps an edit only if none of its replacements overlap a
//! previously accepted replacement or another replacement of the same edit;
//! earlier edits therefore win. The application pass then loads each affected
//! file once and splices its accepted replacements from the end of the file
//! toward the beginning, so offsets of replacements not yet applied are never
//! shifted by text already spliced in.

use crate::document::{DocumentError, DocumentLoader, LoadError};
use crate::edit::{Edit, Replacement};
use crate::range::{overlaps, ClosedBounds, PositionModel, SourceRange};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Outcome of one application.
///
/// Every input edit lands in exactly one of `applied` or `incompatible`, in
/// input order. `edited_files` holds full new contents for every file touched
/// by an applied edit and nothing else, keyed by [`DocumentLoader::key`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "EditResult carries the edited contents and the rejected edits"]
pub struct EditResult {
    pub applied: Vec<Edit>,
    pub incompatible: Vec<Edit>,
    pub edited_files: BTreeMap<PathBuf, String>,
}

impl EditResult {
    pub fn has_conflicts(&self) -> bool {
        !self.incompatible.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Failed to load {file}: {source}")]
    Load {
        file: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("Replacement range does not fit {file}: {source}")]
    Offset {
        file: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// Accepted replacements per file key, private to one acceptance pass.
///
/// Stored replacements carry the key as their file, not the path the
/// producer wrote.
#[derive(Debug, Default)]
pub struct Accumulator {
    by_file: HashMap<PathBuf, Vec<Replacement>>,
}

impl Accumulator {
    pub fn accepted(&self, file: &Path) -> &[Replacement] {
        self.by_file.get(file).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `candidate` overlaps anything already accepted for its file.
    fn conflicts<M: PositionModel + ?Sized>(&self, model: &M, candidate: &Replacement) -> bool {
        self.accepted(candidate.file())
            .iter()
            .any(|accepted| overlaps(model, &accepted.range, &candidate.range))
    }

    fn add(&mut self, replacements: Vec<Replacement>) {
        for replacement in replacements {
            self.by_file
                .entry(replacement.range.file.clone())
                .or_default()
                .push(replacement);
        }
    }

    /// Accepted replacements grouped by file, in path order.
    pub fn into_files(self) -> BTreeMap<PathBuf, Vec<Replacement>> {
        self.by_file.into_iter().collect()
    }
}

/// Result of the acceptance pass alone.
#[derive(Debug, Default)]
pub struct Partition {
    pub applied: Vec<Edit>,
    pub incompatible: Vec<Edit>,
    pub accepted: Accumulator,
}

/// Applies edits under a [`PositionModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EditApplier<M = ClosedBounds> {
    model: M,
}

impl<M: PositionModel> EditApplier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Split `edits` into accepted and rejected sets without touching any
    /// document. Files are told apart by their paths exactly as written.
    pub fn partition(&self, edits: impl IntoIterator<Item = Edit>) -> Partition {
        match self.partition_by(edits, |file| Ok::<_, Infallible>(file.to_path_buf())) {
            Ok(partition) => partition,
            Err(never) => match never {},
        }
    }

    /// Acceptance pass with files identified by `key`.
    ///
    /// Paths mapping to the same key are one file: their replacements are
    /// overlap-checked against each other and grouped together in the
    /// accumulator. The first key failure aborts the pass.
    pub fn partition_by<E>(
        &self,
        edits: impl IntoIterator<Item = Edit>,
        mut key: impl FnMut(&Path) -> Result<PathBuf, E>,
    ) -> Result<Partition, E> {
        let mut partition = Partition::default();

        for edit in edits {
            let keyed = edit
                .replacements()
                .iter()
                .map(|replacement| key(replacement.file()).map(|file| rekey(replacement, file)))
                .collect::<Result<Vec<_>, E>>()?;

            if self.is_compatible(&partition.accepted, &keyed) {
                partition.accepted.add(keyed);
                partition.applied.push(edit);
            } else {
                log::debug!("rejecting conflicting edit: {edit}");
                partition.incompatible.push(edit);
            }
        }

        Ok(partition)
    }

    fn is_compatible(&self, accumulator: &Accumulator, replacements: &[Replacement]) -> bool {
        replacements.iter().enumerate().all(|(i, replacement)| {
            !accumulator.conflicts(&self.model, replacement)
                && !replacements[..i]
                    .iter()
                    .any(|earlier| overlaps(&self.model, &earlier.range, &replacement.range))
        })
    }

    /// Resolve conflicts among `edits` and produce the edited contents of
    /// every affected file.
    ///
    /// Files are identified by `loader.key`, so different spellings of one
    /// path conflict with each other and load once. Any key, load, or offset
    /// failure aborts the whole call.
    pub async fn apply<L>(
        &self,
        edits: impl IntoIterator<Item = Edit>,
        loader: &L,
    ) -> Result<EditResult, ApplyError>
    where
        L: DocumentLoader + ?Sized,
    {
        let Partition {
            applied,
            incompatible,
            accepted,
        } = self.partition_by(edits, |file| {
            loader.key(file).map_err(|source| ApplyError::Load {
                file: file.to_path_buf(),
                source,
            })
        })?;

        let mut edited_files = BTreeMap::new();
        for (file, replacements) in accepted.into_files() {
            let contents = self.splice_file(&file, replacements, loader).await?;
            edited_files.insert(file, contents);
        }

        Ok(EditResult {
            applied,
            incompatible,
            edited_files,
        })
    }

    async fn splice_file<L>(
        &self,
        file: &Path,
        mut replacements: Vec<Replacement>,
        loader: &L,
    ) -> Result<String, ApplyError>
    where
        L: DocumentLoader + ?Sized,
    {
        let document = loader.load(file).await.map_err(|source| ApplyError::Load {
            file: file.to_path_buf(),
            source,
        })?;

        self.sort_rightmost_first(&mut replacements);

        // Convert every range before splicing: text to the right of a range
        // never moves it, so offsets taken from the original stay valid.
        let spans = replacements
            .iter()
            .map(|replacement| document.offsets(&replacement.range))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ApplyError::Offset {
                file: file.to_path_buf(),
                source,
            })?;

        let mut contents = document.into_text();
        for (replacement, span) in replacements.iter().zip(spans) {
            contents.replace_range(span, &replacement.text);
        }

        log::debug!(
            "spliced {} replacement(s) into {}",
            replacements.len(),
            file.display()
        );
        Ok(contents)
    }

    /// Descending by start; coincident starts fall back to descending end.
    pub fn sort_rightmost_first(&self, replacements: &mut [Replacement]) {
        replacements.sort_by(|a, b| {
            self.model
                .compare(b.range.start, a.range.start)
                .then_with(|| self.model.compare(b.range.end, a.range.end))
        });
    }
}

fn rekey(replacement: &Replacement, file: PathBuf) -> Replacement {
    let range = &replacement.range;
    Replacement::new(
        SourceRange::new(file, range.start, range.end),
        replacement.text.clone(),
    )
}

/// Apply `edits` with the conservative boundary model, where touching
/// ranges count as overlapping.
pub async fn apply_edits<L>(
    edits: impl IntoIterator<Item = Edit>,
    loader: &L,
) -> Result<EditResult, ApplyError>
where
    L: DocumentLoader + ?Sized,
{
    EditApplier::new(ClosedBounds).apply(edits, loader).await
}
