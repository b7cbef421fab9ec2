//! Run configuration.
//!
//! Values are resolved from three layers, highest precedence first:
//! 1. Command-line flags, each with an environment-variable fallback
//!    (`IMAP_ADDR`, `IMAP_USER`, `IMAP_PASS`, `IMAP_MBOX`, `CUPS_PRINTER`,
//!    `ALLOWED`, `EXTENSIONS`)
//! 2. A TOML settings file at `$MAILPRINT_CONFIG` or
//!    `~/.config/mailprint/config.toml`
//! 3. Built-in defaults
//!
//! A `.env` file in the working directory is loaded into the environment
//! before flag parsing, so scheduler deployments can keep credentials there.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MailprintError, Result};
use crate::policy::ExtensionFilter;

/// Mailbox processed when none is configured.
pub const DEFAULT_MAILBOX: &str = "INBOX";

/// Top-level settings file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IMAP connection settings.
    pub imap: ImapSettings,
    /// Printing settings.
    pub printer: PrinterSettings,
    /// Admission filter settings.
    pub filter: FilterSettings,
    /// General behavior settings.
    pub general: GeneralSettings,
}

/// IMAP connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImapSettings {
    /// Server address as `host:port`.
    pub addr: Option<String>,
    /// Account user.
    pub user: Option<String>,
    /// Account password.
    pub pass: Option<String>,
    /// Mailbox to process.
    pub mailbox: Option<String>,
}

/// Printing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSettings {
    /// CUPS destination name.
    pub name: Option<String>,
}

/// Admission filter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Exact-match sender addresses allowed to print.
    pub allowed_senders: Vec<String>,
    /// Attachment extensions (without the dot) allowed to print.
    /// Empty means no extension restriction.
    pub extensions: Vec<String>,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for the log file.
    pub cache_dir: Option<PathBuf>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load settings, searching the standard locations.
///
/// Returns the default settings if no file is found or on parse error.
pub fn load_settings() -> Settings {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Settings>(&contents) {
                    Ok(settings) => {
                        tracing::debug!(path = %path.display(), "loaded settings");
                        return settings;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to parse settings, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to read settings file, using defaults"
                    );
                }
            }
        }
    }
    Settings::default()
}

/// Determine the settings file path (env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILPRINT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailprint").join("config.toml"))
}

/// Cache directory for the log file.
pub fn cache_dir(settings: &Settings) -> PathBuf {
    if let Some(ref dir) = settings.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailprint")
}

// ── Resolution ──────────────────────────────────────────────────

/// Raw override values collected from flags and environment.
///
/// `None` means "not given"; the settings file fills the gaps.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub addr: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub mailbox: Option<String>,
    pub printer: Option<String>,
    /// `:`-separated sender addresses.
    pub allowed: Option<String>,
    /// `:`-separated extensions.
    pub extensions: Option<String>,
    pub dry_run: bool,
}

/// Fully resolved, validated configuration for one batch run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// IMAP server address as `host:port`.
    pub addr: String,
    pub user: String,
    pub pass: String,
    pub mailbox: String,
    /// CUPS destination name.
    pub printer: String,
    /// Exact-match sender allow-list (case-sensitive).
    pub allowed_senders: BTreeSet<String>,
    /// Extension filter for attachment storage names.
    pub extensions: ExtensionFilter,
    /// Evaluate and log only; no deletion, no printing.
    pub dry_run: bool,
}

impl RunConfig {
    /// Merge overrides onto settings and validate the result.
    pub fn resolve(overrides: Overrides, settings: &Settings) -> Result<Self> {
        let addr = require(
            non_empty(overrides.addr).or_else(|| non_empty(settings.imap.addr.clone())),
            "IMAP server address (--addr / IMAP_ADDR)",
        )?;
        let user = require(
            non_empty(overrides.user).or_else(|| non_empty(settings.imap.user.clone())),
            "IMAP user (--user / IMAP_USER)",
        )?;
        let pass = require(
            non_empty(overrides.pass).or_else(|| non_empty(settings.imap.pass.clone())),
            "IMAP password (--pass / IMAP_PASS)",
        )?;
        let printer = require(
            non_empty(overrides.printer).or_else(|| non_empty(settings.printer.name.clone())),
            "printer name (--printer / CUPS_PRINTER)",
        )?;
        let mailbox = non_empty(overrides.mailbox)
            .or_else(|| non_empty(settings.imap.mailbox.clone()))
            .unwrap_or_else(|| DEFAULT_MAILBOX.to_string());

        let allowed_senders: BTreeSet<String> = match overrides.allowed {
            Some(raw) => split_list(&raw).into_iter().collect(),
            None => settings
                .filter
                .allowed_senders
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let extensions = match overrides.extensions {
            Some(raw) => ExtensionFilter::from_entries(split_list(&raw)),
            None => ExtensionFilter::from_entries(&settings.filter.extensions),
        };

        Ok(Self {
            addr,
            user,
            pass,
            mailbox,
            printer,
            allowed_senders,
            extensions,
            dry_run: overrides.dry_run,
        })
    }
}

/// Split a `:`-separated list value, trimming and dropping empty segments.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(':')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn require(value: Option<String>, what: &str) -> Result<String> {
    value.ok_or_else(|| MailprintError::Config(format!("{what} is required")))
}
