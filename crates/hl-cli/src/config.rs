//! Service configuration.
//!
//! Loaded from one TOML file.  Every section and field is optional; missing
//! values take the defaults below.  Command-line flags override the file.
//!
//! ```toml
//! [database]
//! location = "./"
//! name     = "humble_logistics.sqlite"
//!
//! [clock]
//! scale = 60.0          # one real second is one virtual minute
//!
//! [scheduler]
//! max_sleep_secs = 5.0
//! retry_stranded = true
//!
//! [journal]
//! dir = "./journal"     # omit to disable
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use hl_sim::SchedulerConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "humble_logistics.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticsConfig {
    pub database:  DatabaseConfig,
    pub clock:     ClockConfig,
    pub scheduler: SchedulerSection,
    pub journal:   JournalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub location: PathBuf,
    pub name:     String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            location: PathBuf::from("./"),
            name:     "humble_logistics.sqlite".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn path(&self) -> PathBuf {
        self.location.join(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Virtual seconds per real second.
    pub scale:           f64,
    /// Virtual start time as Unix seconds.  Unset means "now".
    pub start_unix_secs: Option<f64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { scale: 1.0, start_unix_secs: None }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() {
            bail!("clock.scale must be a finite number, got {}", self.scale);
        }
        if let Some(start) = self.start_unix_secs.filter(|s| !s.is_finite()) {
            bail!("clock.start_unix_secs must be a finite number, got {start}");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub max_sleep_secs: f64,
    pub retry_stranded: bool,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            max_sleep_secs: defaults.max_sleep.as_secs_f64(),
            retry_stranded: defaults.retry_stranded,
        }
    }
}

impl SchedulerSection {
    pub fn to_scheduler_config(&self) -> Result<SchedulerConfig> {
        if !(self.max_sleep_secs > 0.0 && self.max_sleep_secs.is_finite()) {
            bail!("scheduler.max_sleep_secs must be a positive number, got {}", self.max_sleep_secs);
        }
        Ok(SchedulerConfig {
            max_sleep:      Duration::from_secs_f64(self.max_sleep_secs),
            retry_stranded: self.retry_stranded,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Directory for `legs.csv` and `ticks.csv`.  Unset disables the journal.
    pub dir: Option<PathBuf>,
}

impl LogisticsConfig {
    /// Read `path`, or return the defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot drive the service.  Run again
    /// after command-line overrides are applied.
    pub fn validate(&self) -> Result<()> {
        self.clock.validate()?;
        self.scheduler.to_scheduler_config()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}
