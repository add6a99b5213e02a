//! Property tests for partitioning and splicing on single-line documents.

use super::{edit, rep};
use edit_arbiter::{overlaps, ClosedBounds, Edit, EditApplier, MemoryLoader, Replacement};
use proptest::prelude::*;
use std::path::Path;

const FILE: &str = "f.rs";

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

/// A lowercase line plus candidate edits of one or two replacements each,
/// freely overlapping one another.
fn text_and_edits() -> impl Strategy<Value = (String, Vec<Edit>)> {
    "[a-z]{5,40}".prop_flat_map(|text| {
        let max = text.len() + 1;
        let replacement = (1..=max, 0usize..4, "[A-Z]{0,3}")
            .prop_map(move |(start, len, new)| rep(FILE, start, (start + len).min(max), &new));
        let edits = prop::collection::vec(
            prop::collection::vec(replacement, 1..3).prop_map(edit),
            0..12,
        );
        (Just(text), edits)
    })
}

/// A lowercase line plus pairwise separated single-replacement edits.
fn text_and_disjoint_edits() -> impl Strategy<Value = (String, Vec<Edit>)> {
    "[a-z]{5,40}".prop_flat_map(|text| {
        let columns: Vec<usize> = (1..=text.len() + 1).collect();
        let bounds = proptest::sample::subsequence(columns, 0..=6);
        (Just(text), bounds, "[A-Z]{0,3}").prop_map(|(text, bounds, new)| {
            let edits = bounds
                .chunks_exact(2)
                .map(|pair| edit(vec![rep(FILE, pair[0], pair[1], &new)]))
                .collect();
            (text, edits)
        })
    })
}

/// Forward rebuild with a cursor over separated, ascending replacements.
fn forward_rebuild(text: &str, mut replacements: Vec<Replacement>) -> String {
    replacements.sort_by_key(|r| r.range.start);
    let mut out = String::new();
    let mut cursor = 0;
    for replacement in replacements {
        let start = replacement.range.start.column - 1;
        let end = replacement.range.end.column - 1;
        out.push_str(&text[cursor..start]);
        out.push_str(&replacement.text);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

proptest! {
    #[test]
    fn partition_accounts_for_every_edit((_text, edits) in text_and_edits()) {
        let partition = EditApplier::new(ClosedBounds).partition(edits.clone());

        prop_assert_eq!(partition.applied.len() + partition.incompatible.len(), edits.len());
        for e in &edits {
            let count = |list: &[Edit]| list.iter().filter(|x| *x == e).count();
            let expected = count(&edits);
            prop_assert_eq!(count(&partition.applied) + count(&partition.incompatible), expected);
        }

        let accepted = partition.accepted.accepted(Path::new(FILE));
        for (i, a) in accepted.iter().enumerate() {
            for b in &accepted[i + 1..] {
                prop_assert!(!overlaps(&ClosedBounds, &a.range, &b.range));
            }
        }
    }

    #[test]
    fn rightmost_first_matches_forward_rebuild((text, edits) in text_and_edits()) {
        let loader = MemoryLoader::new().with_file(FILE, text.clone());
        let result = run(EditApplier::new(ClosedBounds).apply(edits, &loader)).unwrap();

        let replacements: Vec<Replacement> = result
            .applied
            .iter()
            .flat_map(|e| e.replacements().iter().cloned())
            .collect();

        match result.edited_files.get(Path::new(FILE)) {
            Some(edited) => prop_assert_eq!(edited, &forward_rebuild(&text, replacements)),
            None => prop_assert!(replacements.is_empty()),
        }
    }

    #[test]
    fn disjoint_edits_independent_of_order(
        (text, edits) in text_and_disjoint_edits(),
        seed in any::<u64>(),
    ) {
        let mut shuffled = edits.clone();
        if !shuffled.is_empty() {
            let len = shuffled.len();
            shuffled.rotate_left(seed as usize % len);
            if seed % 2 == 0 {
                shuffled.reverse();
            }
        }

        let loader = MemoryLoader::new().with_file(FILE, text);
        let applier = EditApplier::new(ClosedBounds);
        let original = run(applier.apply(edits.clone(), &loader)).unwrap();
        let permuted = run(applier.apply(shuffled, &loader)).unwrap();

        prop_assert!(original.incompatible.is_empty());
        prop_assert!(permuted.incompatible.is_empty());
        prop_assert_eq!(original.applied.len(), edits.len());
        prop_assert_eq!(original.edited_files, permuted.edited_files);
    }
}
