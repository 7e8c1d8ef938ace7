//! Addressable configuration keys.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use super::file::ConfigFile;
use super::ConfigError;

const GROUP_SIZE_RANGE: RangeInclusive<usize> = 16..=2048;
const RUN_EVERY_RANGE: RangeInclusive<u32> = 1..=1200;

/// A single setting, written `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    TicketEnabled,
    TicketPauseAll,
    TicketGroupSize,
    TicketRunEvery,
    TicketProximityThreshold,
    LoadWindow,
    LoadDisableTps,
    LoadRecoverTps,
    PerfExcludePaused,
    PerfTopTypes,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TicketEnabled,
            ConfigKey::TicketPauseAll,
            ConfigKey::TicketGroupSize,
            ConfigKey::TicketRunEvery,
            ConfigKey::TicketProximityThreshold,
            ConfigKey::LoadWindow,
            ConfigKey::LoadDisableTps,
            ConfigKey::LoadRecoverTps,
            ConfigKey::PerfExcludePaused,
            ConfigKey::PerfTopTypes,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::TicketEnabled
            | ConfigKey::TicketPauseAll
            | ConfigKey::TicketGroupSize
            | ConfigKey::TicketRunEvery
            | ConfigKey::TicketProximityThreshold => "ticket",
            ConfigKey::LoadWindow | ConfigKey::LoadDisableTps | ConfigKey::LoadRecoverTps => {
                "load"
            }
            ConfigKey::PerfExcludePaused | ConfigKey::PerfTopTypes => "perf",
        }
    }

    /// Key name within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::TicketEnabled => "enabled",
            ConfigKey::TicketPauseAll => "pause_all",
            ConfigKey::TicketGroupSize => "group_size",
            ConfigKey::TicketRunEvery => "run_every",
            ConfigKey::TicketProximityThreshold => "proximity_threshold",
            ConfigKey::LoadWindow => "window",
            ConfigKey::LoadDisableTps => "disable_tps",
            ConfigKey::LoadRecoverTps => "recover_tps",
            ConfigKey::PerfExcludePaused => "exclude_paused",
            ConfigKey::PerfTopTypes => "top_types",
        }
    }

    /// `section.key`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::TicketEnabled => config.ticket.enabled.to_string(),
            ConfigKey::TicketPauseAll => config.ticket.pause_all.to_string(),
            ConfigKey::TicketGroupSize => config.ticket.group_size.to_string(),
            ConfigKey::TicketRunEvery => config.ticket.run_every.to_string(),
            ConfigKey::TicketProximityThreshold => config.ticket.proximity_threshold.to_string(),
            ConfigKey::LoadWindow => config.load.window.to_string(),
            ConfigKey::LoadDisableTps => config.load.disable_tps.to_string(),
            ConfigKey::LoadRecoverTps => config.load.recover_tps.to_string(),
            ConfigKey::PerfExcludePaused => config.perf.exclude_paused.to_string(),
            ConfigKey::PerfTopTypes => config.perf.top_types.to_string(),
        }
    }

    /// Accepted values, for listings.
    pub fn hint(&self) -> String {
        match self {
            ConfigKey::TicketEnabled | ConfigKey::TicketPauseAll | ConfigKey::PerfExcludePaused => {
                "true | false".to_string()
            }
            ConfigKey::TicketGroupSize => {
                format!("{}-{}", GROUP_SIZE_RANGE.start(), GROUP_SIZE_RANGE.end())
            }
            ConfigKey::TicketRunEvery => {
                format!("{}-{} ticks", RUN_EVERY_RANGE.start(), RUN_EVERY_RANGE.end())
            }
            ConfigKey::TicketProximityThreshold => "0 or more".to_string(),
            ConfigKey::LoadWindow => "1 or more ticks".to_string(),
            ConfigKey::PerfTopTypes => "1 or more".to_string(),
            ConfigKey::LoadDisableTps => "ticks per second, 0 or more".to_string(),
            ConfigKey::LoadRecoverTps => "ticks per second, at least load.disable_tps".to_string(),
        }
    }

    /// Parse and store `value`, checking the key's own range.
    ///
    /// Constraints between keys are checked by [`ConfigFile::validate`].
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::TicketEnabled => config.ticket.enabled = self.parse_bool(value)?,
            ConfigKey::TicketPauseAll => config.ticket.pause_all = self.parse_bool(value)?,
            ConfigKey::TicketGroupSize => {
                config.ticket.group_size = self.parse_in(value, GROUP_SIZE_RANGE)?
            }
            ConfigKey::TicketRunEvery => {
                config.ticket.run_every = self.parse_in(value, RUN_EVERY_RANGE)?
            }
            ConfigKey::TicketProximityThreshold => {
                config.ticket.proximity_threshold = self.parse_in(value, 0..=u64::MAX)?
            }
            ConfigKey::LoadWindow => config.load.window = self.parse_in(value, 1..=usize::MAX)?,
            ConfigKey::LoadDisableTps => config.load.disable_tps = self.parse_rate(value)?,
            ConfigKey::LoadRecoverTps => config.load.recover_tps = self.parse_rate(value)?,
            ConfigKey::PerfExcludePaused => {
                config.perf.exclude_paused = self.parse_bool(value)?
            }
            ConfigKey::PerfTopTypes => config.perf.top_types = self.parse_in(value, 1..=usize::MAX)?,
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_in<T>(&self, value: &str, range: RangeInclusive<T>) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + fmt::Display,
    {
        let parsed: T = value
            .parse()
            .map_err(|_| self.invalid(value, "expected a whole number"))?;
        if !range.contains(&parsed) {
            return Err(self.invalid(
                value,
                format!("must be between {} and {}", range.start(), range.end()),
            ));
        }
        Ok(parsed)
    }

    fn parse_rate(&self, value: &str) -> Result<f64, ConfigError> {
        let parsed: f64 = value
            .parse()
            .map_err(|_| self.invalid(value, "expected a number"))?;
        if !parsed.is_finite() || parsed < 0.0 {
            return Err(self.invalid(value, "must be a non-negative number"));
        }
        Ok(parsed)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}
