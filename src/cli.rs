use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "datamut",
    version,
    about = "Create a sample dataset, or append one row to it"
)]
pub struct Cli {
    #[arg(short = 'C', long = "chdir", global = true)]
    pub chdir: Option<PathBuf>,
    /// Configuration file to use instead of the discovered one.
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,
    #[arg(short = 'n', long = "dry-run", global = true)]
    pub dry_run: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Print machine-readable output on stdout.
    #[arg(long = "json", global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the dataset from seed rows, or append one row if it already exists.
    Mutate(MutateArgs),
    /// Print the dataset as a table.
    Show(DatasetArgs),
    /// Validate the dataset header and rows without modifying it.
    Check(DatasetArgs),
    /// Configuration display, validation, and template generation.
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Args, Debug)]
pub struct MutateArgs {
    /// Dataset file; defaults to the configured path.
    #[arg()]
    pub path: Option<PathBuf>,
    #[command(flatten)]
    pub record: RecordArgs,
    /// Fail instead of creating a missing parent directory.
    #[arg(long = "no-create-dir", default_value_t = false)]
    pub no_create_dir: bool,
    /// Print the resulting dataset after the change.
    #[arg(long = "show", default_value_t = false)]
    pub show: bool,
}

/// Field overrides for the appended row. Unset fields come from config.
#[derive(Args, Debug, Default)]
pub struct RecordArgs {
    #[arg(long = "name")]
    pub name: Option<String>,
    #[arg(long = "age", allow_negative_numbers = true)]
    pub age: Option<i64>,
    #[arg(long = "city")]
    pub city: Option<String>,
}

#[derive(Args, Debug)]
pub struct DatasetArgs {
    #[arg()]
    pub path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    Path,
    Check,
    Generate {
        #[arg()]
        path: Option<PathBuf>,
        #[arg(long = "force", default_value_t = false)]
        force: bool,
    },
    /// Store the row appended on each run.
    SetAppend {
        #[arg(long = "name")]
        name: String,
        #[arg(long = "age", allow_negative_numbers = true)]
        age: i64,
        #[arg(long = "city")]
        city: String,
    },
}

/// Helper entry point so `main` can stay minimal.
pub fn parse() -> Cli {
    Cli::parse()
}
