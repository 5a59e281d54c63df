use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Command, ConfigCommand, DatasetArgs, MutateArgs, RecordArgs};
use crate::config::{self, MutatorConfig};
use crate::dataset::Dataset;
use crate::mutator::{self, Outcome};
use crate::record::Record;
use crate::store::Discard;
use crate::util;

const CONFIG_DIR: &str = ".datamut";
const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ConfigPathSource {
    Explicit,
    Discovered,
    HomeDefault,
}

impl ConfigPathSource {
    fn as_str(&self) -> &'static str {
        match self {
            ConfigPathSource::Explicit => "explicit",
            ConfigPathSource::Discovered => "discovered",
            ConfigPathSource::HomeDefault => "home-default",
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfigPath {
    path: Utf8PathBuf,
    source: ConfigPathSource,
}

#[derive(Serialize)]
struct MutateReport<'a> {
    action: &'static str,
    path: &'a str,
    rows: usize,
    dry_run: bool,
    completed_at: String,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    path: &'a str,
    rows: usize,
    ok: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let ctx = CliContext::from(&cli);
    ctx.apply_chdir()?;

    match cli.command {
        Command::Config { command } => handle_config_only(&ctx, command),
        other => {
            let state = AppState::new(ctx)?;
            handle_with_state(&state, other)
        }
    }
}

fn handle_with_state(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Mutate(args) => handle_mutate(state, args),
        Command::Show(args) => handle_show(state, args),
        Command::Check(args) => handle_check(state, args),
        Command::Config { .. } => unreachable!("config commands handled earlier"),
    }
}

fn handle_mutate(state: &AppState, args: MutateArgs) -> Result<()> {
    let path = state.dataset_path(args.path)?;
    let seed = state.config.seed_records();
    let new_record = merge_record(state.config.append_record(), args.record);

    if !args.no_create_dir && !state.ctx.dry_run {
        let created = util::fs::ensure_parent_dir(&path)
            .with_context(|| format!("creating parent directory for {}", path))?;
        if created {
            info!(path = %path, "created parent directory");
        }
    }

    let result = if state.ctx.dry_run {
        mutator::mutate_with(&Discard, &path, &seed, &new_record)
    } else {
        mutator::mutate(&path, &seed, &new_record)
    };
    let outcome = result.inspect_err(|err| {
        warn!(kind = ?err.kind(), path = %err.path(), "dataset left unchanged");
    })?;

    if state.ctx.json {
        print_json(&MutateReport {
            action: outcome.action(),
            path: outcome.path().as_str(),
            rows: outcome.rows(),
            dry_run: state.ctx.dry_run,
            completed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })?;
        return Ok(());
    }

    if state.ctx.dry_run {
        println!("(dry-run) {}", describe_planned(&outcome));
    } else {
        println!("{}", outcome);
    }

    if args.show && !state.ctx.dry_run {
        let dataset = Dataset::read(&path)?;
        print!("{}", dataset.render_table());
    }
    Ok(())
}

fn handle_show(state: &AppState, args: DatasetArgs) -> Result<()> {
    let path = state.dataset_path(args.path)?;
    let dataset = Dataset::read(&path)?;

    if state.ctx.json {
        return print_json(dataset.records());
    }

    println!("{} ({} rows)", path, dataset.len());
    if !dataset.is_empty() {
        print!("{}", dataset.render_table());
    }
    Ok(())
}

fn handle_check(state: &AppState, args: DatasetArgs) -> Result<()> {
    let path = state.dataset_path(args.path)?;
    let dataset = Dataset::read(&path)?;

    if state.ctx.json {
        return print_json(&CheckReport {
            path: path.as_str(),
            rows: dataset.len(),
            ok: true,
        });
    }

    println!("Dataset OK: {} ({} rows)", path, dataset.len());
    Ok(())
}

fn handle_config_only(ctx: &CliContext, command: Option<ConfigCommand>) -> Result<()> {
    let resolved = ctx.resolve_config_path()?;
    let config_path = resolved.path;
    match command {
        Some(ConfigCommand::Path) => {
            println!("Config path: {} ({})", config_path, resolved.source.as_str());
            Ok(())
        }
        None | Some(ConfigCommand::Show) => {
            if !config_path.exists() {
                println!("No config found at {}; using built-in defaults.", config_path);
                println!("Use `datamut config generate` to scaffold one.");
                println!("{}", config::format_summary(&MutatorConfig::default()));
                return Ok(());
            }

            let config = config::load_from_path(&config_path)?;
            println!("Config path: {} ({})", config_path, resolved.source.as_str());
            println!("{}", config::format_summary(&config));
            Ok(())
        }
        Some(ConfigCommand::Check) => {
            let config = config::load_from_path(&config_path)?;
            config.check()?;
            println!("Config OK: {} ({})", config_path, resolved.source.as_str());
            println!("{}", config::format_summary(&config));
            Ok(())
        }
        Some(ConfigCommand::Generate { path, force }) => {
            let target = match path {
                Some(path) => utf8(path, "config generate path")?,
                None => config_path.clone(),
            };
            config::write_example_config(&target, force)?;
            if force {
                println!("Overwrote config at {}", target);
            } else {
                println!("Wrote example config to {}", target);
            }
            Ok(())
        }
        Some(ConfigCommand::SetAppend { name, age, city }) => {
            let record = Record::new(name, age, city);
            config::set_append_record(&config_path, &record)?;
            println!("Append row set to {} in {}", record, config_path);
            Ok(())
        }
    }
}

/// CLI flags win field by field over the configured append row.
fn merge_record(base: Record, overrides: RecordArgs) -> Record {
    Record {
        name: overrides.name.unwrap_or(base.name),
        age: overrides.age.unwrap_or(base.age),
        city: overrides.city.unwrap_or(base.city),
    }
}

fn describe_planned(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created { path, rows } => format!("would create {} with {} rows", path, rows),
        Outcome::Appended { path, rows } => {
            format!("would append 1 row to {} ({} rows total)", path, rows)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("encoding JSON output")?;
    println!("{}", rendered);
    Ok(())
}

fn utf8(path: PathBuf, what: &str) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|_| anyhow!("{} must be valid UTF-8", what))
}

#[derive(Debug)]
struct CliContext {
    chdir: Option<PathBuf>,
    file: Option<PathBuf>,
    dry_run: bool,
    json: bool,
}

impl CliContext {
    fn apply_chdir(&self) -> Result<()> {
        if let Some(path) = &self.chdir {
            std::env::set_current_dir(path)
                .with_context(|| format!("changing directory to {}", path.display()))?;
        }
        Ok(())
    }

    fn resolve_config_path(&self) -> Result<ResolvedConfigPath> {
        if let Some(path) = &self.file {
            return Ok(ResolvedConfigPath {
                path: utf8(path.clone(), "config path")?,
                source: ConfigPathSource::Explicit,
            });
        }

        let cwd = std::env::current_dir().context("determining current directory")?;
        if let Some(found) = discover_config(&utf8(cwd, "current directory")?) {
            return Ok(ResolvedConfigPath {
                path: found,
                source: ConfigPathSource::Discovered,
            });
        }

        let home = dirs::home_dir().ok_or_else(|| anyhow!("unable to determine home directory"))?;
        let path = utf8(home, "home directory")?.join(CONFIG_DIR).join(CONFIG_FILE);
        Ok(ResolvedConfigPath {
            path,
            source: ConfigPathSource::HomeDefault,
        })
    }
}

/// Nearest `.datamut/config.toml` at or above `start`.
fn discover_config(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

impl From<&Cli> for CliContext {
    fn from(cli: &Cli) -> Self {
        Self {
            chdir: cli.chdir.clone(),
            file: cli.file.clone(),
            dry_run: cli.dry_run,
            json: cli.json,
        }
    }
}

struct AppState {
    ctx: CliContext,
    config: MutatorConfig,
}

impl AppState {
    fn new(ctx: CliContext) -> Result<Self> {
        let resolved = ctx.resolve_config_path()?;
        let config = config::load_or_default(&resolved.path)?;
        debug!(
            config = %resolved.path,
            source = resolved.source.as_str(),
            exists = resolved.path.exists(),
            "resolved configuration"
        );
        Ok(Self { ctx, config })
    }

    fn dataset_path(&self, explicit: Option<PathBuf>) -> Result<Utf8PathBuf> {
        match explicit {
            Some(path) => utf8(path, "dataset path"),
            None => Ok(self.config.dataset_path()),
        }
    }
}
