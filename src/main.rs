use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use edit_arbiter::compiler::{edits_from_diagnostics, run_cargo_check};
use edit_arbiter::{
    load_from_path, write_edited_files, ClosedBounds, Edit, EditApplier, EditResult, FsLoader,
    OpenBounds, PositionModel, WorkspaceGuard,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "edit-arbiter")]
#[command(about = "Apply independently produced edits without conflicts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an edit batch (or a directory of batches) to a workspace
    Apply {
        /// Batch file (.toml or .json) or directory of batch files
        #[arg(short, long)]
        edits: PathBuf,

        /// Path to workspace root (defaults to EDIT_ARBITER_WORKSPACE or cwd)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Let edits that only touch at a boundary both apply
        #[arg(long)]
        allow_touching: bool,
    },

    /// Report which edits of a batch conflict, without reading any source
    Check {
        /// Batch file (.toml or .json) or directory of batch files
        #[arg(short, long)]
        edits: PathBuf,

        /// Path to workspace root (defaults to EDIT_ARBITER_WORKSPACE or cwd)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Let edits that only touch at a boundary both apply
        #[arg(long)]
        allow_touching: bool,
    },

    /// Apply machine-applicable compiler suggestions from `cargo check`
    Fix {
        /// Path to workspace root (defaults to EDIT_ARBITER_WORKSPACE or cwd)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Only check this package
        #[arg(short, long)]
        package: Option<String>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Let edits that only touch at a boundary both apply
        #[arg(long)]
        allow_touching: bool,
    },
}

/// How to present and persist an application result.
struct OutputMode {
    dry_run: bool,
    show_diff: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            edits,
            workspace,
            dry_run,
            diff,
            allow_touching,
        } => {
            let mode = OutputMode {
                dry_run,
                show_diff: diff,
            };
            cmd_apply(&edits, workspace, mode, allow_touching).await
        }

        Commands::Check {
            edits,
            workspace,
            allow_touching,
        } => cmd_check(&edits, workspace, allow_touching),

        Commands::Fix {
            workspace,
            package,
            dry_run,
            diff,
            allow_touching,
        } => {
            let mode = OutputMode {
                dry_run,
                show_diff: diff,
            };
            cmd_fix(workspace, package, mode, allow_touching).await
        }
    }
}

fn position_model(allow_touching: bool) -> &'static dyn PositionModel {
    if allow_touching {
        &OpenBounds
    } else {
        &ClosedBounds
    }
}

/// Resolve workspace path
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. EDIT_ARBITER_WORKSPACE environment variable
/// 3. Current directory
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    let path = match cli_workspace {
        Some(path) => path,
        None => match env::var_os("EDIT_ARBITER_WORKSPACE") {
            Some(path) => PathBuf::from(path),
            None => env::current_dir()?,
        },
    };

    path.canonicalize()
        .with_context(|| format!("workspace {} does not exist", path.display()))
}

/// Batch files named by `path`: the file itself, or the .toml/.json files
/// directly inside a directory, sorted by name.
fn discover_batch_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).max_depth(1) {
        let entry = entry?;
        let is_batch = matches!(
            entry.path().extension().and_then(|s| s.to_str()),
            Some("toml" | "json")
        );
        if entry.file_type().is_file() && is_batch {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .toml or .json edit batches found in {}", path.display());
    }
    Ok(files)
}

/// Load every batch under `path`, concatenated in file order.
fn load_edits(path: &Path, workspace: &Path) -> Result<Vec<Edit>> {
    let mut edits = Vec::new();
    for file in discover_batch_files(path)? {
        println!("Loading edits from {}...", file.display());
        let batch = load_from_path(&file)?;
        let batch_edits = batch
            .to_edits(workspace)
            .with_context(|| format!("malformed edit in {}", file.display()))?;
        edits.extend(batch_edits);
    }
    Ok(edits)
}

/// Helper: Show unified diff between original and edited content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn report_partition(applied: &[Edit], incompatible: &[Edit], dry_run: bool) {
    let verb = if dry_run { "Would apply" } else { "Applied" };
    for edit in applied {
        println!("{} {}: {}", "✓".green(), verb, edit);
    }
    for edit in incompatible {
        println!(
            "{} Skipped: {} (conflicts with an earlier edit)",
            "⊘".yellow(),
            edit
        );
    }
}

fn print_summary(applied: usize, incompatible: usize, files: usize) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", applied).green());
    println!("  {} incompatible", format!("{}", incompatible).yellow());
    println!("  {} files edited", format!("{}", files).cyan());
}

/// Report, diff, and (unless dry-running) write back an application result.
fn finish(result: &EditResult, guard: &WorkspaceGuard, mode: &OutputMode) -> Result<()> {
    report_partition(&result.applied, &result.incompatible, mode.dry_run);

    if mode.show_diff {
        for (file, edited) in &result.edited_files {
            let path = guard.resolve(file)?;
            let original = fs::read_to_string(&path)
                .with_context(|| format!("failed to re-read {}", path.display()))?;
            display_diff(&path, &original, edited);
        }
    }

    let files = if mode.dry_run {
        println!("{}", "  [DRY RUN - no files were modified]".cyan());
        result.edited_files.len()
    } else {
        let written = write_edited_files(&result.edited_files, Some(guard))?;
        for path in &written {
            println!("{} Wrote {}", "✓".green(), path.display());
        }
        written.len()
    };

    print_summary(result.applied.len(), result.incompatible.len(), files);
    Ok(())
}

async fn apply_in_workspace(
    edits: Vec<Edit>,
    guard: &WorkspaceGuard,
    allow_touching: bool,
) -> Result<EditResult> {
    let loader = FsLoader::guarded(guard.clone());
    let applier = EditApplier::new(position_model(allow_touching));
    Ok(applier.apply(edits, &loader).await?)
}

async fn cmd_apply(
    edits_path: &Path,
    workspace: Option<PathBuf>,
    mode: OutputMode,
    allow_touching: bool,
) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let guard = WorkspaceGuard::new(&workspace)?;
    println!("Workspace: {}", workspace.display());

    let edits = load_edits(edits_path, &workspace)?;
    println!("{} edits loaded", edits.len());
    println!();

    let result = apply_in_workspace(edits, &guard, allow_touching).await?;
    finish(&result, &guard, &mode)
}

fn cmd_check(edits_path: &Path, workspace: Option<PathBuf>, allow_touching: bool) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let guard = WorkspaceGuard::new(&workspace)?;
    let edits = load_edits(edits_path, &workspace)?;

    // Key files the same way `apply` does, so relative and absolute
    // spellings of one file are checked against each other.
    let applier = EditApplier::new(position_model(allow_touching));
    let partition = applier.partition_by(edits, |file| guard.resolve(file))?;

    println!();
    for edit in &partition.incompatible {
        println!("{} CONFLICT: {}", "✗".red(), edit);
        for file in edit.files() {
            println!("  File: {}", file.display());
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} compatible", format!("{}", partition.applied.len()).green());
    println!(
        "  {} incompatible",
        format!("{}", partition.incompatible.len()).red()
    );

    if !partition.incompatible.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

async fn cmd_fix(
    workspace: Option<PathBuf>,
    package: Option<String>,
    mode: OutputMode,
    allow_touching: bool,
) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let guard = WorkspaceGuard::new(&workspace)?;
    println!("Workspace: {}", workspace.display());
    println!("Running cargo check...");

    let check_root = workspace.clone();
    let diagnostics = tokio::task::spawn_blocking(move || {
        run_cargo_check(&check_root, package.as_deref())
    })
    .await??;

    let edits = edits_from_diagnostics(&diagnostics);
    println!(
        "{} diagnostics, {} machine-applicable fixes",
        diagnostics.len(),
        edits.len()
    );

    if edits.is_empty() {
        println!("{}", "Nothing to fix".green());
        return Ok(());
    }
    println!();

    let result = apply_in_workspace(edits, &guard, allow_touching).await?;
    finish(&result, &guard, &mode)
}
