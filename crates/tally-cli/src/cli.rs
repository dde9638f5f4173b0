use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Track workspace files as versioned components",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a tally workspace
    Init(InitArgs),
    /// Track files, directories or globs as components
    Add(AddArgs),
    /// List tracked components
    List(ListArgs),
    /// Show one component
    Show(ShowArgs),
    /// Copy or link a component's files into a directory
    Export(ExportArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddArgs {
    pub paths: Vec<PathBuf>,
    /// Component id; all paths become one component
    #[arg(short, long)]
    pub id: Option<String>,
    #[arg(short, long)]
    pub namespace: Option<String>,
    /// Test file template, e.g. "{dir}/{name}.test.js"
    #[arg(short, long = "tests")]
    pub tests: Vec<String>,
    #[arg(short, long = "exclude")]
    pub excludes: Vec<String>,
    /// Main file template, e.g. "{dir}/index.js"
    #[arg(short, long)]
    pub main: Option<String>,
    /// Reassign files already tracked by other components
    #[arg(short, long = "override")]
    pub override_all: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only list components in this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ExportArgs {
    pub id: String,
    pub dest: PathBuf,
    /// Symlink files instead of copying them
    #[arg(long)]
    pub link: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_flags() {
        let cli = Cli::parse_from([
            "tally", "add", "src/ui", "src/shared.js", "--id", "ui/kit", "-t", "{dir}/{name}.test.js",
            "--exclude", "*.md", "--override", "--format", "json",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Add(args) => {
                assert_eq!(args.paths.len(), 2);
                assert_eq!(args.id.as_deref(), Some("ui/kit"));
                assert_eq!(args.tests, vec!["{dir}/{name}.test.js"]);
                assert_eq!(args.excludes, vec!["*.md"]);
                assert!(args.override_all);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn parses_export() {
        let cli = Cli::parse_from(["tally", "-v", "export", "ui/button", "out", "--link"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Export(args) => {
                assert_eq!(args.id, "ui/button");
                assert!(args.link);
            }
            _ => panic!("expected export"),
        }
    }
}
