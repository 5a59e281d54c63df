use std::fmt::Write as _;
use std::fs;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use toml_edit::{DocumentMut, Item, Table, value};

use crate::record::{self, Record};
use crate::templates;

pub const DEFAULT_DATASET_PATH: &str = "data/sample_data.csv";

/// Root configuration document, usually `.datamut/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MutatorConfig {
    pub dataset: Option<DatasetConfig>,
    pub seed: Option<Vec<RecordConfig>>,
    pub append: Option<RecordConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub path: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordConfig {
    pub name: String,
    pub age: i64,
    pub city: String,
}

impl From<&RecordConfig> for Record {
    fn from(cfg: &RecordConfig) -> Self {
        Record::new(cfg.name.clone(), cfg.age, cfg.city.clone())
    }
}

impl MutatorConfig {
    pub fn dataset_path(&self) -> Utf8PathBuf {
        self.dataset
            .as_ref()
            .and_then(|d| d.path.as_deref())
            .unwrap_or(DEFAULT_DATASET_PATH)
            .into()
    }

    pub fn seed_records(&self) -> Vec<Record> {
        match &self.seed {
            Some(rows) => rows.iter().map(Record::from).collect(),
            None => record::default_seed(),
        }
    }

    pub fn append_record(&self) -> Record {
        self.append
            .as_ref()
            .map(Record::from)
            .unwrap_or_else(record::default_append)
    }

    /// Validate every configured record, naming the offending entry.
    pub fn check(&self) -> Result<()> {
        for (idx, row) in self.seed_records().iter().enumerate() {
            row.validate()
                .with_context(|| format!("seed row {} ({})", idx + 1, row))?;
        }
        let append = self.append_record();
        append
            .validate()
            .with_context(|| format!("append row ({})", append))?;
        Ok(())
    }
}

/// Load a configuration file from disk and deserialize it.
pub fn load_from_path(path: &Utf8Path) -> Result<MutatorConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path))
}

/// Like [`load_from_path`], but a missing file yields the built-in defaults.
pub fn load_or_default(path: &Utf8Path) -> Result<MutatorConfig> {
    if path.exists() {
        load_from_path(path)
    } else {
        Ok(MutatorConfig::default())
    }
}

pub fn write_example_config(path: &Utf8Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("{} already exists; rerun with --force to overwrite", path);
    }

    templates::write_template(path, templates::EXAMPLE_CONFIG)
}

/// Replace the `[append]` table, keeping the rest of the document as written.
pub fn set_append_record(path: &Utf8Path, record: &Record) -> Result<()> {
    record
        .validate()
        .with_context(|| format!("refusing to store append row ({})", record))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent))?;
    }

    let mut doc: DocumentMut = if path.exists() {
        let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        raw.parse()
            .with_context(|| format!("parsing config {}", path))?
    } else {
        DocumentMut::new()
    };

    let mut table = Table::new();
    table.insert("name", value(record.name.as_str()));
    table.insert("age", value(record.age));
    table.insert("city", value(record.city.as_str()));
    doc["append"] = Item::Table(table);

    fs::write(path, doc.to_string()).with_context(|| format!("writing config {}", path))
}

pub fn format_summary(config: &MutatorConfig) -> String {
    let mut out = String::new();
    let seed = config.seed_records();
    let seed_source = if config.seed.is_some() { "config" } else { "built-in" };
    let append_source = if config.append.is_some() { "config" } else { "built-in" };

    let _ = writeln!(out, "Dataset path: {}", config.dataset_path());
    let _ = writeln!(out, "Seed rows ({}): {}", seed_source, seed.len());
    for row in &seed {
        let _ = writeln!(out, "  - {}", row);
    }
    let _ = writeln!(out, "Append row ({}): {}", append_source, config.append_record());
    out
}
