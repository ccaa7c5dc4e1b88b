//! Engine configuration.
//!
//! Loaded from a TOML file; every key is optional. The CLI applies its own
//! flags on top of whatever the file says.
//!
//! ```toml
//! rules = "rules/extra.json"   # replaces the built-in table
//! base_version = 1
//! version = 2
//! enacted_on = "2024-01-01"
//! workers = 4
//! log = "billdiff=debug"
//! ```

use crate::classify::{rules, RuleTable};
use crate::error::Result;
use crate::walk::WalkOptions;
use crate::VersionId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// JSON rule table to use instead of the built-in rules.
    pub rules: Option<PathBuf>,
    /// Version of the code bills are applied against.
    pub base_version: u64,
    /// Version the produced diffs belong to. A batch gives its first bill
    /// this version and counts up from there.
    pub version: u64,
    pub enacted_on: Option<NaiveDate>,
    /// Batch worker threads. Unset means one per core.
    pub workers: Option<usize>,
    /// Log filter used when `BILLDIFF_LOG` is not set.
    pub log: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rules: None,
            base_version: 1,
            version: 2,
            enacted_on: None,
            workers: None,
            log: "warn".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::from_toml(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// The configured rule table, or the built-in one.
    pub fn rule_table(&self) -> Result<RuleTable> {
        match &self.rules {
            Some(path) => RuleTable::from_json(&fs::read_to_string(path)?),
            None => RuleTable::compile(rules::get()),
        }
    }

    pub fn walk_options(&self) -> WalkOptions {
        let options = WalkOptions::new(VersionId(self.base_version), VersionId(self.version));
        match self.enacted_on {
            Some(date) => options.enacted_on(date),
            None => options,
        }
    }
}
