use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tally_add::{AddContext, AddOutcome, AddRequest, AddResolver};
use tally_changeset::{ChangeSet, LocalFsTarget};
use tally_index::{ComponentIndex, ComponentIndexEntry};
use tally_paths::normalize_relative;
use tally_types::{ComponentId, Origin};
use tracing::debug;

use crate::cli::*;
use crate::workspace::Workspace;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(args, format),
        Command::Add(args) => cmd_add(args, format),
        Command::List(args) => cmd_list(args, format),
        Command::Show(args) => cmd_show(args, format),
        Command::Export(args) => cmd_export(args, format).await,
    }
}

fn current_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().context("reading current directory")
}

fn cmd_init(args: InitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let cwd = current_dir()?;
    let root = match args.path {
        Some(path) => cwd.join(path),
        None => cwd,
    };
    let ws = Workspace::init(&root)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "root": ws.root() })),
        OutputFormat::Text => println!(
            "{} Initialized tally workspace in {}",
            "✓".green().bold(),
            ws.root().display().to_string().bold()
        ),
    }
    Ok(())
}

fn cmd_add(args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    let cwd = current_dir()?;
    let ws = Workspace::discover(&cwd)?;
    let ignore = ws.ignore_rules()?;
    let mut index = ws.open_index()?;

    let mut tests = args.tests;
    tests.extend(ws.config().tests.iter().cloned());
    let request = AddRequest {
        paths: args.paths,
        id: args.id,
        namespace: args.namespace,
        tests,
        excludes: args.excludes,
        main: args.main,
        override_all: args.override_all,
        origin: Origin::Authored,
    };
    let ctx = AddContext::new(ws.root(), &ignore)
        .with_cwd(&cwd)
        .with_default_namespace(ws.default_namespace());

    let outcome = AddResolver::new(ctx, request).run(&mut index)?;
    match format {
        OutputFormat::Json => println!("{}", add_outcome_json(&outcome)),
        OutputFormat::Text => print_add_outcome(&outcome, &index),
    }
    Ok(())
}

fn add_outcome_json(outcome: &AddOutcome) -> serde_json::Value {
    let added: Vec<_> = outcome
        .added
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "created": c.created,
                "files": c.files,
            })
        })
        .collect();
    json!({ "added": added, "warnings": outcome.warnings })
}

fn print_add_outcome(outcome: &AddOutcome, index: &ComponentIndex) {
    for added in &outcome.added {
        let verb = if added.created { "tracked" } else { "updated" };
        println!(
            "{} {} {} ({} files)",
            "✓".green().bold(),
            verb,
            added.id.to_string().cyan(),
            added.files.len()
        );
    }
    for (id, paths) in outcome.warnings.iter() {
        for path in paths {
            let owner = index
                .lookup_by_path(path)
                .map(ToString::to_string)
                .unwrap_or_else(|| "another component".into());
            println!(
                "{} {} is tracked by {}; skipped for {} (use --override to reassign)",
                "warning:".yellow().bold(),
                path,
                owner.cyan(),
                id
            );
        }
    }
}

fn cmd_list(args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ws = Workspace::discover(&current_dir()?)?;
    let index = ws.open_index()?;
    let entries: Vec<&ComponentIndexEntry> = index
        .entries()
        .filter(|e| args.namespace.as_deref().map_or(true, |ns| e.id.namespace() == ns))
        .collect();

    match format {
        OutputFormat::Json => {
            let list: Vec<_> = entries
                .iter()
                .map(|e| {
                    json!({
                        "id": e.id,
                        "origin": e.origin,
                        "files": e.files.len(),
                        "tests": e.test_files().count(),
                    })
                })
                .collect();
            println!("{}", serde_json::Value::Array(list));
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No components tracked.");
            }
            for entry in entries {
                println!(
                    "{}  {} files ({} tests)  {}",
                    entry.id.to_string().cyan(),
                    entry.files.len(),
                    entry.test_files().count(),
                    entry.origin.to_string().dimmed()
                );
            }
        }
    }
    Ok(())
}

fn find_component<'i>(
    index: &'i ComponentIndex,
    ws: &Workspace,
    input: &str,
) -> anyhow::Result<&'i ComponentIndexEntry> {
    let id = ComponentId::parse_with_namespace(input, ws.default_namespace())?;
    match index.lookup_by_id(&id, true) {
        Some(entry) => Ok(entry),
        None => bail!("component {id} is not tracked"),
    }
}

fn cmd_show(args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ws = Workspace::discover(&current_dir()?)?;
    let index = ws.open_index()?;
    let entry = find_component(&index, &ws, &args.id)?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "id": entry.id,
                "origin": entry.origin,
                "rootDir": entry.root_dir,
                "mainFile": entry.main_file,
                "files": entry.files,
            })
        ),
        OutputFormat::Text => {
            println!("Component {}", entry.id.to_string().cyan().bold());
            println!("  Origin: {}", entry.origin);
            if let Some(root) = &entry.root_dir {
                println!("  Root: {root}");
            }
            if let Some(main) = &entry.main_file {
                println!("  Main: {}", main.yellow());
            }
            for file in &entry.files {
                let marker = if file.is_test { " (test)".dimmed().to_string() } else { String::new() };
                println!("    {}{}", file.relative_path, marker);
            }
        }
    }
    Ok(())
}

/// Build the change-set that materializes `entry` under
/// `dest/<namespace>/<name>`, replacing any previous copy.
async fn export_changes(
    root: &Path,
    entry: &ComponentIndexEntry,
    dest: &Path,
    link: bool,
) -> anyhow::Result<ChangeSet> {
    let component_dir = Path::new(entry.id.namespace()).join(entry.id.name());
    let mut changes = ChangeSet::new();
    changes.add_remove(&component_dir, true);
    let mut links = ChangeSet::new();

    for file in &entry.files {
        let tracked = Path::new(&file.relative_path);
        let relative = match &entry.root_dir {
            Some(root_dir) => tracked.strip_prefix(root_dir).unwrap_or(tracked),
            None => tracked,
        };
        let relative = normalize_relative(relative)?;
        let source = root.join(&file.relative_path);
        if link {
            links.add_symlink(source, dest.join(&component_dir).join(relative))?;
        } else {
            let contents = tokio::fs::read(&source)
                .await
                .with_context(|| format!("reading {}", source.display()))?;
            changes.add_write(component_dir.join(relative), contents, true)?;
        }
    }

    changes.rebase(dest)?;
    changes.merge(links)?;
    Ok(changes)
}

async fn cmd_export(args: ExportArgs, format: OutputFormat) -> anyhow::Result<()> {
    let cwd = current_dir()?;
    let ws = Workspace::discover(&cwd)?;
    let index = ws.open_index()?;
    let entry = find_component(&index, &ws, &args.id)?;
    let dest = cwd.join(&args.dest);

    let changes = export_changes(ws.root(), entry, &dest, args.link).await?;
    debug!(id = %entry.id, ops = changes.len(), "exporting component");
    let summary = changes.commit(&LocalFsTarget::new()).await?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "id": entry.id,
                "dest": dest,
                "written": summary.written,
                "linked": summary.linked,
                "pruned": summary.pruned,
            })
        ),
        OutputFormat::Text => println!(
            "{} Exported {} to {} ({} written, {} linked)",
            "✓".green().bold(),
            entry.id.to_string().cyan(),
            dest.display().to_string().bold(),
            summary.written,
            summary.linked
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tally_types::FileRecord;

    fn entry() -> ComponentIndexEntry {
        ComponentIndexEntry::new(ComponentId::new("ui", "button", None).unwrap(), Origin::Authored)
            .with_files(vec![
                FileRecord::new("src/button/index.js"),
                FileRecord::test("src/button/index.test.js"),
            ])
            .with_root_dir("src/button")
    }

    fn workspace_with_sources() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/button")).unwrap();
        fs::write(dir.path().join("src/button/index.js"), "export {}").unwrap();
        fs::write(dir.path().join("src/button/index.test.js"), "test()").unwrap();
        dir
    }

    #[tokio::test]
    async fn export_copies_files_relative_to_root_dir() {
        let ws = workspace_with_sources();
        let out = tempfile::tempdir().unwrap();
        fs::create_dir_all(out.path().join("ui/button/stale")).unwrap();
        fs::write(out.path().join("ui/button/stale/old.js"), "old").unwrap();

        let changes = export_changes(ws.path(), &entry(), out.path(), false).await.unwrap();
        let summary = changes.commit(&LocalFsTarget::new()).await.unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(
            fs::read_to_string(out.path().join("ui/button/index.js")).unwrap(),
            "export {}"
        );
        assert!(out.path().join("ui/button/index.test.js").is_file());
        assert!(!out.path().join("ui/button/stale").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn export_links_point_at_workspace_files() {
        let ws = workspace_with_sources();
        let out = tempfile::tempdir().unwrap();

        let changes = export_changes(ws.path(), &entry(), out.path(), true).await.unwrap();
        let summary = changes.commit(&LocalFsTarget::new()).await.unwrap();

        assert_eq!(summary.linked, 2);
        let target = fs::read_link(out.path().join("ui/button/index.js")).unwrap();
        assert_eq!(target, ws.path().join("src/button/index.js"));
    }

    #[tokio::test]
    async fn export_keeps_sibling_prefix_paths_whole() {
        let ws = workspace_with_sources();
        fs::create_dir_all(ws.path().join("src/buttonx")).unwrap();
        fs::write(ws.path().join("src/buttonx/a.js"), "sibling").unwrap();
        let entry = entry().with_files(vec![
            FileRecord::new("src/button/index.js"),
            FileRecord::new("src/buttonx/a.js"),
        ]);
        let out = tempfile::tempdir().unwrap();

        let changes = export_changes(ws.path(), &entry, out.path(), false).await.unwrap();
        changes.commit(&LocalFsTarget::new()).await.unwrap();

        assert!(out.path().join("ui/button/index.js").is_file());
        assert_eq!(
            fs::read_to_string(out.path().join("ui/button/src/buttonx/a.js")).unwrap(),
            "sibling"
        );
        assert!(!out.path().join("ui/button/x").exists());
    }

    #[tokio::test]
    async fn export_fails_on_missing_source() {
        let ws = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let err = export_changes(ws.path(), &entry(), out.path(), false).await.unwrap_err();
        assert!(err.to_string().contains("reading"));
    }

    #[test]
    fn add_json_lists_components_and_warnings() {
        let mut warnings = tally_index::ConflictWarnings::new();
        let id = ComponentId::new("ui", "button", None).unwrap();
        warnings.record(&id, "src/shared.js");
        let outcome = AddOutcome {
            added: Vec::new(),
            warnings,
        };
        let value = add_outcome_json(&outcome);
        assert_eq!(value["added"], json!([]));
        assert_eq!(value["warnings"]["ui/button"], json!(["src/shared.js"]));
    }
}
