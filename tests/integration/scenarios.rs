//! End-to-end behavior of `apply_edits` on small in-memory documents.

use super::{edit, rep};
use edit_arbiter::{
    apply_edits, ApplyError, ClosedBounds, EditApplier, LoadError, MemoryLoader, OpenBounds,
    Position, Replacement, SourceRange,
};
use std::path::Path;

#[tokio::test]
async fn test_non_overlapping_edits_both_apply() {
    let loader = MemoryLoader::new().with_file("f.rs", "abcdef");
    let a = edit(vec![rep("f.rs", 2, 3, "X")]);
    let b = edit(vec![rep("f.rs", 5, 6, "Y")]);

    let result = apply_edits(vec![a.clone(), b.clone()], &loader).await.unwrap();

    assert_eq!(result.applied, vec![a, b]);
    assert!(result.incompatible.is_empty());
    assert_eq!(result.edited_files[Path::new("f.rs")], "aXcdYf");
}

#[tokio::test]
async fn test_overlapping_later_edit_rejected() {
    let loader = MemoryLoader::new().with_file("f.rs", "abcdef");
    let a = edit(vec![rep("f.rs", 2, 4, "X")]);
    let b = edit(vec![rep("f.rs", 3, 5, "Y")]);

    let result = apply_edits(vec![a.clone(), b.clone()], &loader).await.unwrap();

    assert_eq!(result.applied, vec![a]);
    assert_eq!(result.incompatible, vec![b]);
    assert_eq!(result.edited_files[Path::new("f.rs")], "aXdef");
}

#[tokio::test]
async fn test_pure_insertion() {
    let loader = MemoryLoader::new().with_file("f.rs", "abc");
    let insert = edit(vec![Replacement::insert("f.rs", Position::new(1, 3), "Z")]);

    let result = apply_edits(vec![insert], &loader).await.unwrap();

    assert_eq!(result.edited_files[Path::new("f.rs")], "abZc");
}

#[tokio::test]
async fn test_insertions_at_different_columns_coexist() {
    let loader = MemoryLoader::new().with_file("f.rs", "abc");
    let first = edit(vec![Replacement::insert("f.rs", Position::new(1, 2), "<")]);
    let second = edit(vec![Replacement::insert("f.rs", Position::new(1, 3), ">")]);

    let result = apply_edits(vec![first, second], &loader).await.unwrap();

    assert!(result.incompatible.is_empty());
    assert_eq!(result.edited_files[Path::new("f.rs")], "a<b>c");
}

#[tokio::test]
async fn test_multi_file_edit_rejected_as_a_whole() {
    let loader = MemoryLoader::new()
        .with_file("a.rs", "abcdef")
        .with_file("b.rs", "uvwxyz");
    let first = edit(vec![rep("a.rs", 2, 4, "X")]);
    let spanning = edit(vec![rep("b.rs", 1, 2, "U"), rep("a.rs", 3, 5, "Y")]);

    let result = apply_edits(vec![first.clone(), spanning.clone()], &loader)
        .await
        .unwrap();

    assert_eq!(result.applied, vec![first]);
    assert_eq!(result.incompatible, vec![spanning]);
    assert_eq!(result.edited_files.len(), 1);
    assert_eq!(result.edited_files[Path::new("a.rs")], "aXdef");
    assert!(!result.edited_files.contains_key(Path::new("b.rs")));
}

#[tokio::test]
async fn test_multi_file_edit_applied_everywhere() {
    let loader = MemoryLoader::new()
        .with_file("a.rs", "use b::old;\n")
        .with_file("b.rs", "pub fn old() {}\n");
    let rename = edit(vec![
        Replacement::new(
            SourceRange::new("a.rs", Position::new(1, 8), Position::new(1, 11)),
            "new",
        ),
        Replacement::new(
            SourceRange::new("b.rs", Position::new(1, 8), Position::new(1, 11)),
            "new",
        ),
    ]);

    let result = apply_edits(vec![rename], &loader).await.unwrap();

    assert_eq!(result.edited_files[Path::new("a.rs")], "use b::new;\n");
    assert_eq!(result.edited_files[Path::new("b.rs")], "pub fn new() {}\n");
}

#[tokio::test]
async fn test_self_overlapping_edit_rejected_alone() {
    let loader = MemoryLoader::new().with_file("f.rs", "abcdef");
    let bad = edit(vec![rep("f.rs", 1, 4, "X"), rep("f.rs", 2, 3, "Y")]);

    let result = apply_edits(vec![bad.clone()], &loader).await.unwrap();

    assert_eq!(result.incompatible, vec![bad]);
    assert!(result.edited_files.is_empty());
    assert_eq!(loader.loads(), 0);
}

#[tokio::test]
async fn test_touching_edits_conflict_by_default() {
    let loader = MemoryLoader::new().with_file("f.rs", "abcdef");
    let left = edit(vec![rep("f.rs", 2, 3, "X")]);
    let right = edit(vec![rep("f.rs", 3, 4, "Y")]);

    let result = apply_edits(vec![left.clone(), right.clone()], &loader)
        .await
        .unwrap();
    assert_eq!(result.applied, vec![left.clone()]);
    assert_eq!(result.incompatible, vec![right.clone()]);
    assert_eq!(result.edited_files[Path::new("f.rs")], "aXcdef");

    let relaxed = EditApplier::new(OpenBounds)
        .apply(vec![left, right], &loader)
        .await
        .unwrap();
    assert!(relaxed.incompatible.is_empty());
    assert_eq!(relaxed.edited_files[Path::new("f.rs")], "aXYdef");
}

#[tokio::test]
async fn test_each_file_loaded_once() {
    let loader = MemoryLoader::new()
        .with_file("a.rs", "0123456789")
        .with_file("b.rs", "0123456789");
    let edits = vec![
        edit(vec![rep("a.rs", 1, 2, "")]),
        edit(vec![rep("a.rs", 4, 5, ""), rep("b.rs", 4, 5, "")]),
        edit(vec![rep("a.rs", 7, 8, "")]),
        edit(vec![rep("b.rs", 9, 10, "")]),
    ];

    let result = apply_edits(edits, &loader).await.unwrap();

    assert_eq!(result.applied.len(), 4);
    assert_eq!(loader.loads(), 2);
    assert_eq!(result.edited_files[Path::new("a.rs")], "1245789");
    assert_eq!(result.edited_files[Path::new("b.rs")], "01245679");
}

#[tokio::test]
async fn test_rightmost_first_avoids_offset_drift() {
    let source = "abcdef";
    let grow = rep("f.rs", 2, 3, "XYZ");
    let drop = rep("f.rs", 5, 6, "");

    let loader = MemoryLoader::new().with_file("f.rs", source);
    let result = apply_edits(
        vec![edit(vec![grow.clone()]), edit(vec![drop.clone()])],
        &loader,
    )
    .await
    .unwrap();
    assert_eq!(result.edited_files[Path::new("f.rs")], "aXYZcdf");

    // Left-to-right with offsets taken from the original text drifts once the
    // first replacement changes the length of the line.
    let mut naive = source.to_string();
    for replacement in [&grow, &drop] {
        let start = replacement.range.start.column - 1;
        let end = replacement.range.end.column - 1;
        naive.replace_range(start..end, &replacement.text);
    }
    assert_eq!(naive, "aXYZdef");
    assert_ne!(naive, result.edited_files[Path::new("f.rs")]);
}

#[tokio::test]
async fn test_multiline_document() {
    let source = "fn main() {\n    let x = 1;\n    let y = 2;\n}\n";
    let loader = MemoryLoader::new().with_file("main.rs", source);

    let rename_y = edit(vec![Replacement::new(
        SourceRange::new("main.rs", Position::new(3, 9), Position::new(3, 10)),
        "total",
    )]);
    let drop_x = edit(vec![Replacement::delete(SourceRange::new(
        "main.rs",
        Position::new(2, 1),
        Position::new(3, 1),
    ))]);

    let result = EditApplier::new(ClosedBounds)
        .apply(vec![rename_y, drop_x], &loader)
        .await
        .unwrap();

    assert_eq!(
        result.edited_files[Path::new("main.rs")],
        "fn main() {\n    let total = 2;\n}\n"
    );
}

#[tokio::test]
async fn test_missing_file_fails_whole_call() {
    let loader = MemoryLoader::new().with_file("a.rs", "abc");
    let edits = vec![
        edit(vec![rep("a.rs", 1, 2, "X")]),
        edit(vec![rep("missing.rs", 1, 2, "Y")]),
    ];

    let err = apply_edits(edits, &loader).await.unwrap_err();
    match err {
        ApplyError::Load { file, source } => {
            assert_eq!(file, Path::new("missing.rs"));
            assert!(matches!(source, LoadError::NotFound(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}
