//! INI-backed configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;

use super::keys::ConfigKey;
use super::ConfigError;
use crate::control::{
    LoadConfig, SchedulerConfig, DEFAULT_RUN_EVERY, DEFAULT_TPS_WINDOW, TPS_DISABLE_THRESHOLD,
    TPS_RECOVER_THRESHOLD,
};
use crate::grouping::{GroupingConfig, DEFAULT_GROUP_SIZE, DEFAULT_PROXIMITY_THRESHOLD};
use crate::perf::{ProfilerConfig, DEFAULT_TOP_TYPES};

/// File name inside [`config_directory`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// `~/.config/warashi` on Linux, the platform equivalent elsewhere.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("warashi")
}

/// Full path of the default config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// `[ticket]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketSettings {
    pub enabled: bool,
    pub pause_all: bool,
    pub group_size: usize,
    pub run_every: u32,
    pub proximity_threshold: u64,
}

impl Default for TicketSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            pause_all: false,
            group_size: DEFAULT_GROUP_SIZE,
            run_every: DEFAULT_RUN_EVERY,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
        }
    }
}

/// `[load]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSettings {
    pub window: usize,
    pub disable_tps: f64,
    pub recover_tps: f64,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_TPS_WINDOW,
            disable_tps: TPS_DISABLE_THRESHOLD,
            recover_tps: TPS_RECOVER_THRESHOLD,
        }
    }
}

/// `[perf]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfSettings {
    pub exclude_paused: bool,
    pub top_types: usize,
}

impl Default for PerfSettings {
    fn default() -> Self {
        Self {
            exclude_paused: true,
            top_types: DEFAULT_TOP_TYPES,
        }
    }
}

/// All persisted settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub ticket: TicketSettings,
    pub load: LoadSettings,
    pub perf: PerfSettings,
}

impl ConfigFile {
    /// Load from [`config_file_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(err) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Save to [`config_file_path`], creating the directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path).map_err(io_err)?;
        tracing::debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Checks that span more than one key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load.recover_tps < self.load.disable_tps {
            return Err(ConfigError::InvalidValue {
                key: ConfigKey::LoadRecoverTps.name(),
                value: self.load.recover_tps.to_string(),
                reason: format!(
                    "must be at least load.disable_tps ({})",
                    self.load.disable_tps
                ),
            });
        }
        Ok(())
    }

    pub fn grouping_config(&self) -> GroupingConfig {
        GroupingConfig {
            target_size: self.ticket.group_size,
            proximity_threshold: self.ticket.proximity_threshold,
        }
    }

    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            window: self.load.window,
            disable_below: self.load.disable_tps,
            recover_at: self.load.recover_tps,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            enabled: self.ticket.enabled,
            pause_all: self.ticket.pause_all,
            run_every: self.ticket.run_every,
            grouping: self.grouping_config(),
            load: self.load_config(),
        }
    }

    pub fn profiler_config(&self) -> ProfilerConfig {
        ProfilerConfig {
            exclude_paused: self.perf.exclude_paused,
            top_types: self.perf.top_types,
            grouping: self.grouping_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = ConfigFile::default();
        config.ticket.group_size = 128;
        config.ticket.pause_all = true;
        config.load.disable_tps = 12.5;
        config.perf.top_types = 10;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[ticket]\nrun_every = 40\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.ticket.run_every, 40);
        assert_eq!(config.ticket.group_size, DEFAULT_GROUP_SIZE);
        assert_eq!(config.load, LoadSettings::default());
    }

    #[test]
    fn test_out_of_range_value_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[ticket]\ngroup_size = 8\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ticket.group_size"));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[load]\ndisable_tps = 18\nrecover_tps = 16\n").unwrap();
        assert!(ConfigFile::load_from(&path).is_err());
    }

    #[test]
    fn test_runtime_conversions() {
        let mut config = ConfigFile::default();
        config.ticket.enabled = false;
        config.ticket.group_size = 32;
        config.perf.exclude_paused = false;

        let scheduler = config.scheduler_config();
        assert!(!scheduler.enabled);
        assert_eq!(scheduler.grouping.target_size, 32);
        assert_eq!(scheduler.load.window, DEFAULT_TPS_WINDOW);

        let profiler = config.profiler_config();
        assert!(!profiler.exclude_paused);
        assert_eq!(profiler.grouping, scheduler.grouping);
    }

    #[test]
    fn test_default_path_under_config_dir() {
        let path = config_file_path();
        assert!(path.ends_with("warashi/config.ini"));
    }
}
