use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::common::Offset;
use crate::error::AppError;

const DEFAULT_CONFIG_FILE: &str = "navbot";
const ENV_PREFIX: &str = "NAVBOT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub emulator: EmulatorSettings,
    pub navigation: NavigationSettings,
    pub retry: RetrySettings,
    pub daemon: DaemonSettings,
    pub logging: LoggingSettings,
}

/// Device identification, only reported back to the operator in diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorSettings {
    pub serial: String,
    pub control_method: String,
    pub screenshot_method: String,
    pub server: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// Tolerance box used when matching page checks, in pixels (x, y).
    pub page_offset: (i32, i32),
    /// Minimum time before the same page check is trusted again during a goto.
    pub page_interval_ms: u64,
    pub unknown_page_timeout_ms: u64,
    pub unknown_page_timeout_count: u32,
    pub recovery_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub retry_wait_ms: u64,
    pub confirm_wait_ms: u64,
    pub max_attempts: u32,
    pub index_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    pub cadence_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub ansi: bool,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            serial: "127.0.0.1:5555".to_string(),
            control_method: "minitouch".to_string(),
            screenshot_method: "adb".to_string(),
            server: "cn".to_string(),
        }
    }
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            page_offset: (30, 30),
            page_interval_ms: 5_000,
            unknown_page_timeout_ms: 10_000,
            unknown_page_timeout_count: 20,
            recovery_interval_ms: 2_000,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            retry_wait_ms: 10_000,
            confirm_wait_ms: 1_000,
            max_attempts: 5,
            index_interval_ms: 1_000,
        }
    }
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self { cadence_ms: 500 }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl NavigationSettings {
    pub fn offset(&self) -> Offset {
        Offset::symmetric(self.page_offset.0, self.page_offset.1)
    }

    pub fn page_interval(&self) -> Duration {
        Duration::from_millis(self.page_interval_ms)
    }

    pub fn unknown_page_timeout(&self) -> Duration {
        Duration::from_millis(self.unknown_page_timeout_ms)
    }

    pub fn recovery_interval(&self) -> Duration {
        Duration::from_millis(self.recovery_interval_ms)
    }
}

impl RetrySettings {
    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }

    pub fn confirm_wait(&self) -> Duration {
        Duration::from_millis(self.confirm_wait_ms)
    }

    pub fn index_interval(&self) -> Duration {
        Duration::from_millis(self.index_interval_ms)
    }
}

impl DaemonSettings {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }
}

impl Settings {
    /// Loads settings from an optional file, then `NAVBOT__SECTION__KEY` environment overrides.
    ///
    /// A missing file is not an error; every field falls back to its default.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Key/value pairs dumped to the log when the current page cannot be recognized.
    pub fn diagnostics(&self) -> Vec<(String, String)> {
        vec![
            (
                "EMULATOR__SCREENSHOT_METHOD".to_string(),
                self.emulator.screenshot_method.clone(),
            ),
            (
                "EMULATOR__CONTROL_METHOD".to_string(),
                self.emulator.control_method.clone(),
            ),
            ("SERVER".to_string(), self.emulator.server.clone()),
        ]
    }
}
