//! Process-wide log setup for binaries embedding the client.
//!
//! Every call runs inside a `chat_completion` span carrying `request_id` and
//! `model`, so both outputs below attach those fields to each event.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::errors::ChatError;

pub const ENABLED_ENV: &str = "DEEPERSEEKER_OBSERVABILITY_ENABLED";
pub const LOG_LEVEL_ENV: &str = "DEEPERSEEKER_LOG_LEVEL";
pub const JSON_LOG_PATH_ENV: &str = "DEEPERSEEKER_JSON_LOG_PATH";

const DEFAULT_LOG_FILE: &str = "deeperseeker.logs.jsonl";

static INIT: OnceCell<InitOutcome> = OnceCell::new();

/// Where formatted events go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogOutput {
    /// Compact human-readable lines on stderr, leaving stdout to the reply.
    Stderr,
    /// One JSON object per line, appended to the file.
    JsonFile(PathBuf),
}

/// Settings for [`init_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub enabled: bool,
    /// Filter directives; `None` falls back to `RUST_LOG`, then `info`.
    pub filter: Option<String>,
    pub output: LogOutput,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: None,
            output: LogOutput::Stderr,
        }
    }
}

impl ObservabilityConfig {
    /// Reads `DEEPERSEEKER_OBSERVABILITY_ENABLED`, `DEEPERSEEKER_LOG_LEVEL`
    /// and `DEEPERSEEKER_JSON_LOG_PATH`.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChatError> {
        let enabled = match lookup(ENABLED_ENV) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ChatError::Config(format!("{ENABLED_ENV} must be a boolean, got `{raw}`"))
            })?,
            None => true,
        };
        let filter = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty());
        let output = match lookup(JSON_LOG_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            Some(path) => LogOutput::JsonFile(PathBuf::from(path)),
            None => LogOutput::Stderr,
        };
        Ok(Self {
            enabled,
            filter,
            output,
        })
    }

    fn env_filter(&self) -> Result<EnvFilter, ChatError> {
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).map_err(|err| {
                ChatError::Config(format!("invalid log filter `{directives}`: {err}"))
            }),
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// What an init call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    Installed,
    Disabled,
    /// An earlier call in this process already decided.
    AlreadyInitialized,
}

/// Installs the global subscriber described by the environment.
///
/// Hosts that install their own subscriber should not call this.
pub fn init_observability() -> Result<InitOutcome, ChatError> {
    init_with(&ObservabilityConfig::from_env()?)
}

/// Installs the global subscriber for `config`, at most once per process.
///
/// A failed attempt is not remembered, so a later call may retry.
pub fn init_with(config: &ObservabilityConfig) -> Result<InitOutcome, ChatError> {
    let mut ran = false;
    let outcome = *INIT.get_or_try_init(|| {
        ran = true;
        install(config)
    })?;
    Ok(if ran {
        outcome
    } else {
        InitOutcome::AlreadyInitialized
    })
}

fn install(config: &ObservabilityConfig) -> Result<InitOutcome, ChatError> {
    if !config.enabled {
        return Ok(InitOutcome::Disabled);
    }
    let filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match &config.output {
        LogOutput::Stderr => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogOutput::JsonFile(path) => {
            let (dir, file_name) = split_log_path(path)?;
            let writer = tracing_appender::rolling::never(dir, file_name);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(false)
                        .with_target(false)
                        .with_writer(writer),
                )
                .try_init()
        }
    };
    installed.map_err(|err| ChatError::Config(format!("cannot install log subscriber: {err}")))?;
    Ok(InitOutcome::Installed)
}

/// Creates the parent directory and splits `path` for the file appender.
fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr), ChatError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|err| {
                ChatError::Config(format!(
                    "cannot create log directory {}: {err}",
                    parent.display()
                ))
            })?;
            parent
        }
        None => Path::new("."),
    };
    let file_name = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new(DEFAULT_LOG_FILE));
    Ok((dir, file_name))
}
