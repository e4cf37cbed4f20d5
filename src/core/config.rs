//! Configuration module for `NomosDB`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::progression::Rules;

/// Default CLI configuration loaded based on build profile.
/// Uses release defaults in release mode, debug defaults in debug mode.
#[cfg(not(debug_assertions))]
const CONFIG_DEFAULTS: &str = include_str!("../assets/DefaultCLIConfigRelease.toml");

#[cfg(debug_assertions)]
const CONFIG_DEFAULTS: &str = include_str!("../assets/DefaultCLIConfigDebug.toml");

#[cfg(not(debug_assertions))]
const CONFIG_FILE_NAME: &str = "config.toml";

#[cfg(debug_assertions)]
const CONFIG_FILE_NAME: &str = "dconfig.toml";

/// Environment variable that relocates the `$NOMOSDB` directory
pub const HOME_ENV: &str = "NOMOSDB_HOME";

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    #[serde(default)]
    pub level: String,
    /// Log file path
    #[serde(default)]
    pub file: String,
    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the `SQLite` database file
    #[serde(default)]
    pub path: String,
}

/// Institution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UniversityConfig {
    /// Full name, printed on reports
    pub name: String,
    /// Abbreviation
    pub short_name: String,
    /// Name used to sign reports
    pub admin_name: String,
    /// Contact address for the database admin team
    pub admin_email: String,
    /// Academic year used when the database is created
    pub start_year: i32,
    /// Lowest passing mark
    pub pass_mark: i32,
}

impl Default for UniversityConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            short_name: String::new(),
            admin_name: String::new(),
            admin_email: String::new(),
            start_year: 2013,
            pass_mark: 40,
        }
    }
}

/// Thresholds for the progression board
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Lowest module average that can be compensated
    pub compensation_floor: i32,
    /// Credits that may be compensated in one year
    pub max_compensated_credits: u32,
    /// Credits that may be trailed into the next year
    pub max_trailed_credits: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            compensation_floor: 30,
            max_compensated_credits: 20,
            max_trailed_credits: 40,
        }
    }
}

/// Paths configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for rendered reports
    #[serde(default)]
    pub reports_dir: String,
    /// Directory for CSV exports
    #[serde(default)]
    pub exports_dir: String,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings
    pub logging: LoggingConfig,
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Institution settings
    #[serde(default)]
    pub university: UniversityConfig,
    /// Progression thresholds
    #[serde(default)]
    pub progression: ProgressionConfig,
    /// Path settings
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Optional CLI overrides for configuration values
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override logging level
    pub level: Option<String>,
    /// Override log file path
    pub file: Option<String>,
    /// Override verbose flag
    pub verbose: Option<bool>,
    /// Override database file
    pub db_path: Option<String>,
    /// Override reports output directory
    pub reports_dir: Option<String>,
    /// Override exports output directory
    pub exports_dir: Option<String>,
}

impl Config {
    /// Get the `$NOMOSDB` directory path
    ///
    /// `NOMOSDB_HOME` wins when set. Otherwise:
    /// - Linux: `~/.config/nomosdb`
    /// - macOS: `~/Library/Application Support/nomosdb`
    /// - Windows: `%APPDATA%\nomosdb`
    #[must_use]
    pub fn get_nomosdb_dir() -> PathBuf {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(home);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nomosdb")
    }

    /// Merge missing fields from defaults into this config
    ///
    /// Only string fields that are empty here and non-empty in `defaults` are
    /// filled in; numeric settings already fall back through serde defaults.
    ///
    /// # Returns
    ///
    /// `true` if any fields were added/changed, `false` otherwise
    pub fn merge_defaults(&mut self, defaults: &Self) -> bool {
        fn fill(target: &mut String, default: &str) -> bool {
            if target.is_empty() && !default.is_empty() {
                default.clone_into(target);
                true
            } else {
                false
            }
        }

        let mut changed = fill(&mut self.logging.level, &defaults.logging.level);
        changed |= fill(&mut self.logging.file, &defaults.logging.file);
        changed |= fill(&mut self.database.path, &defaults.database.path);
        changed |= fill(&mut self.university.name, &defaults.university.name);
        changed |= fill(
            &mut self.university.short_name,
            &defaults.university.short_name,
        );
        changed |= fill(
            &mut self.university.admin_name,
            &defaults.university.admin_name,
        );
        changed |= fill(
            &mut self.university.admin_email,
            &defaults.university.admin_email,
        );
        changed |= fill(&mut self.paths.reports_dir, &defaults.paths.reports_dir);
        changed |= fill(&mut self.paths.exports_dir, &defaults.paths.exports_dir);
        changed
    }

    /// Apply CLI-provided overrides onto the loaded configuration
    ///
    /// Only non-`None` values replace config values; nothing is written to disk.
    ///
    /// # Arguments
    ///
    /// * `overrides` - A `ConfigOverrides` struct with optional override values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(level) = &overrides.level {
            self.logging.level.clone_from(level);
        }
        if let Some(file) = &overrides.file {
            self.logging.file.clone_from(file);
        }
        if let Some(verbose) = overrides.verbose {
            self.logging.verbose = verbose;
        }
        if let Some(path) = &overrides.db_path {
            self.database.path.clone_from(path);
        }
        if let Some(reports_dir) = &overrides.reports_dir {
            self.paths.reports_dir.clone_from(reports_dir);
        }
        if let Some(exports_dir) = &overrides.exports_dir {
            self.paths.exports_dir.clone_from(exports_dir);
        }
    }

    /// Get the user config file path
    ///
    /// `config.toml` for release builds, `dconfig.toml` for debug builds, inside
    /// [`get_nomosdb_dir`](Self::get_nomosdb_dir).
    #[must_use]
    pub fn get_config_file_path() -> PathBuf {
        Self::get_nomosdb_dir().join(CONFIG_FILE_NAME)
    }

    /// Expand `$NOMOSDB` in a string to the config directory
    #[must_use]
    fn expand_variables(value: &str) -> String {
        if value.contains("$NOMOSDB") {
            let dir = Self::get_nomosdb_dir();
            value.replace("$NOMOSDB", &dir.to_string_lossy())
        } else {
            value.to_string()
        }
    }

    /// Initialize config from a TOML string
    ///
    /// Missing fields use their serde defaults and `$NOMOSDB` is expanded in
    /// every path value.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML cannot be parsed or doesn't match the expected schema
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(toml_str)?;

        config.logging.file = Self::expand_variables(&config.logging.file);
        config.database.path = Self::expand_variables(&config.database.path);
        config.paths.reports_dir = Self::expand_variables(&config.paths.reports_dir);
        config.paths.exports_dir = Self::expand_variables(&config.paths.exports_dir);

        Ok(config)
    }

    /// Load configuration from embedded defaults
    ///
    /// Debug builds use `DefaultCLIConfigDebug.toml`, release builds
    /// `DefaultCLIConfigRelease.toml`. An unparsable embedded file yields the
    /// built-in `Default` values.
    #[must_use]
    pub fn from_defaults() -> Self {
        Self::from_toml(CONFIG_DEFAULTS).unwrap_or_default()
    }

    /// Load configuration from file, or create from defaults if not found
    ///
    /// Same as [`load_from`](Self::load_from) on
    /// [`get_config_file_path`](Self::get_config_file_path).
    #[must_use]
    pub fn load() -> Self {
        Self::load_from(&Self::get_config_file_path())
    }

    /// Load configuration from a given file, creating it from defaults
    ///
    /// An existing file has missing fields merged from the defaults (and is
    /// rewritten when that changed anything). On first run the defaults are
    /// saved. Any read or parse error falls back to the defaults.
    #[must_use]
    pub fn load_from(config_file: &Path) -> Self {
        let defaults = Self::from_defaults();

        if config_file.exists() {
            if let Ok(content) = fs::read_to_string(config_file) {
                if let Ok(mut config) = Self::from_toml(&content) {
                    if config.merge_defaults(&defaults) {
                        let _ = config.save_to(config_file);
                    }
                    return config;
                }
            }
        } else {
            let _ = defaults.save_to(config_file);
            return defaults;
        }

        defaults
    }

    /// Save configuration to the user config file
    ///
    /// # Errors
    /// As [`save_to`](Self::save_to).
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::get_config_file_path())
    }

    /// Save configuration to a file
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the config cannot
    /// be serialized or the file cannot be written.
    pub fn save_to(&self, config_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(config_file, toml_str)?;
        Ok(())
    }

    /// Get a configuration value by key
    ///
    /// Supported keys: `level`, `file`, `verbose`, `db_path`, `uni_name`,
    /// `uni_short_name`, `admin_name`, `admin_email`, `start_year`,
    /// `pass_mark`, `compensation_floor`, `max_compensated_credits`,
    /// `max_trailed_credits`, `reports_dir`, `exports_dir`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "level" => self.logging.level.clone(),
            "file" => self.logging.file.clone(),
            "verbose" => self.logging.verbose.to_string(),
            "db_path" | "db-path" => self.database.path.clone(),
            "uni_name" | "uni-name" => self.university.name.clone(),
            "uni_short_name" | "uni-short-name" => self.university.short_name.clone(),
            "admin_name" | "admin-name" => self.university.admin_name.clone(),
            "admin_email" | "admin-email" => self.university.admin_email.clone(),
            "start_year" | "start-year" => self.university.start_year.to_string(),
            "pass_mark" | "pass-mark" => self.university.pass_mark.to_string(),
            "compensation_floor" | "compensation-floor" => {
                self.progression.compensation_floor.to_string()
            }
            "max_compensated_credits" | "max-compensated-credits" => {
                self.progression.max_compensated_credits.to_string()
            }
            "max_trailed_credits" | "max-trailed-credits" => {
                self.progression.max_trailed_credits.to_string()
            }
            "reports_dir" | "reports-dir" => self.paths.reports_dir.clone(),
            "exports_dir" | "exports-dir" => self.paths.exports_dir.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a configuration value by key
    ///
    /// Accepts the keys listed in [`get`](Self::get). Call
    /// [`save()`](Config::save) to persist changes.
    ///
    /// # Errors
    /// Returns an error if the key is not recognized or the value cannot be
    /// parsed into the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| format!("Invalid value for '{key}': '{value}'"))
        }

        match key {
            "level" => {
                value
                    .parse::<crate::logger::Level>()
                    .map_err(|e| format!("Invalid value for 'level': {e}"))?;
                self.logging.level = value.to_ascii_lowercase();
            }
            "file" => self.logging.file = value.to_string(),
            "verbose" => self.logging.verbose = parse(key, value)?,
            "db_path" | "db-path" => self.database.path = value.to_string(),
            "uni_name" | "uni-name" => self.university.name = value.to_string(),
            "uni_short_name" | "uni-short-name" => self.university.short_name = value.to_string(),
            "admin_name" | "admin-name" => self.university.admin_name = value.to_string(),
            "admin_email" | "admin-email" => self.university.admin_email = value.to_string(),
            "start_year" | "start-year" => self.university.start_year = parse(key, value)?,
            "pass_mark" | "pass-mark" => {
                let mark: i32 = parse(key, value)?;
                if !(0..=100).contains(&mark) {
                    return Err(format!("Invalid value for '{key}': '{value}'"));
                }
                self.university.pass_mark = mark;
            }
            "compensation_floor" | "compensation-floor" => {
                self.progression.compensation_floor = parse(key, value)?;
            }
            "max_compensated_credits" | "max-compensated-credits" => {
                self.progression.max_compensated_credits = parse(key, value)?;
            }
            "max_trailed_credits" | "max-trailed-credits" => {
                self.progression.max_trailed_credits = parse(key, value)?;
            }
            "reports_dir" | "reports-dir" => self.paths.reports_dir = value.to_string(),
            "exports_dir" | "exports-dir" => self.paths.exports_dir = value.to_string(),
            _ => return Err(format!("Unknown config key: '{key}'")),
        }
        Ok(())
    }

    /// Unset a configuration value by key (reset to default)
    ///
    /// # Errors
    /// Returns an error if the key is not recognized.
    pub fn unset(&mut self, key: &str, defaults: &Self) -> Result<(), String> {
        let default = defaults
            .get(key)
            .ok_or_else(|| format!("Unknown config key: '{key}'"))?;
        self.set(key, &default)
    }

    /// Reset all configuration to defaults by deleting the config file
    ///
    /// The next [`load_from()`](Config::load_from) recreates it. Succeeds if
    /// the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be deleted.
    pub fn reset(config_file: &Path) -> Result<(), std::io::Error> {
        if config_file.exists() {
            fs::remove_file(config_file)?;
        }
        Ok(())
    }

    /// Progression thresholds combined with the pass mark
    #[must_use]
    pub const fn progression_rules(&self) -> Rules {
        Rules {
            pass_mark: self.university.pass_mark,
            compensation_floor: self.progression.compensation_floor,
            max_compensated_credits: self.progression.max_compensated_credits,
            max_trailed_credits: self.progression.max_trailed_credits,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[logging]")?;
        writeln!(f, "  level = \"{}\"", self.logging.level)?;
        writeln!(f, "  file = \"{}\"", self.logging.file)?;
        writeln!(f, "  verbose = {}", self.logging.verbose)?;

        writeln!(f, "\n[database]")?;
        writeln!(f, "  path = \"{}\"", self.database.path)?;

        writeln!(f, "\n[university]")?;
        writeln!(f, "  name = \"{}\"", self.university.name)?;
        writeln!(f, "  short_name = \"{}\"", self.university.short_name)?;
        writeln!(f, "  admin_name = \"{}\"", self.university.admin_name)?;
        writeln!(f, "  admin_email = \"{}\"", self.university.admin_email)?;
        writeln!(f, "  start_year = {}", self.university.start_year)?;
        writeln!(f, "  pass_mark = {}", self.university.pass_mark)?;

        writeln!(f, "\n[progression]")?;
        writeln!(
            f,
            "  compensation_floor = {}",
            self.progression.compensation_floor
        )?;
        writeln!(
            f,
            "  max_compensated_credits = {}",
            self.progression.max_compensated_credits
        )?;
        writeln!(
            f,
            "  max_trailed_credits = {}",
            self.progression.max_trailed_credits
        )?;

        writeln!(f, "\n[paths]")?;
        writeln!(f, "  reports_dir = \"{}\"", self.paths.reports_dir)?;
        writeln!(f, "  exports_dir = \"{}\"", self.paths.exports_dir)?;

        Ok(())
    }
}
