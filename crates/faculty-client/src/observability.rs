use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "info";
const DEFAULT_LOG_FILE: &str = "faculty-client.logs.jsonl";

/// Log output settings resolved from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub enabled: bool,
    /// `EnvFilter` directive, for example `faculty_client=debug`.
    pub filter: String,
    /// JSON-lines log file; console output when unset.
    pub json_log_path: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: DEFAULT_FILTER.to_string(),
            json_log_path: None,
        }
    }
}

impl ObservabilityConfig {
    /// Reads the configuration from the environment.
    ///
    /// - `FACULTY_OBSERVABILITY_ENABLED`: enable/disable flag (default enabled).
    /// - `FACULTY_LOG_LEVEL`: filter directive; falls back to `RUST_LOG`, then `info`.
    /// - `FACULTY_JSON_LOG_PATH`: write JSON lines to this file instead of stderr.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            enabled: non_blank("FACULTY_OBSERVABILITY_ENABLED")
                .and_then(|v| parse_bool_env(&v))
                .unwrap_or(true),
            filter: non_blank("FACULTY_LOG_LEVEL")
                .or_else(|| non_blank("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            json_log_path: non_blank("FACULTY_JSON_LOG_PATH").map(PathBuf::from),
        }
    }

    fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        tracing_subscriber::EnvFilter::try_new(&self.filter)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER))
    }
}

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn split_log_path(path: &Path) -> (&Path, &str) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    (dir, file_name)
}

/// Installs a global `tracing` subscriber configured from the environment.
///
/// The library only emits events; applications opt in by calling this. Only
/// the first call in a process has an effect.
pub fn init_observability() {
    init_observability_with(ObservabilityConfig::from_env());
}

/// Same as [`init_observability`] with explicit settings.
pub fn init_observability_with(config: ObservabilityConfig) {
    INIT.get_or_init(|| {
        if !config.enabled {
            return;
        }
        let env_filter = config.env_filter();
        match &config.json_log_path {
            Some(path) => {
                let (dir, file_name) = split_log_path(path);
                let _ = std::fs::create_dir_all(dir);
                let json_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(tracing_appender::rolling::never(dir, file_name));
                let _ = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(json_layer)
                    .try_init();
            }
            None => {
                let console_layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr);
                let _ = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(console_layer)
                    .try_init();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_env_accepts_common_spellings() {
        assert_eq!(parse_bool_env(" Yes "), Some(true));
        assert_eq!(parse_bool_env("disabled"), Some(false));
        assert_eq!(parse_bool_env("maybe"), None);
    }

    #[test]
    fn from_lookup_prefers_faculty_level_over_rust_log() {
        let config = ObservabilityConfig::from_lookup(|key| match key {
            "FACULTY_LOG_LEVEL" => Some("faculty_client=debug".into()),
            "RUST_LOG" => Some("warn".into()),
            _ => None,
        });
        assert_eq!(config.filter, "faculty_client=debug");
        assert!(config.enabled);
        assert_eq!(config.json_log_path, None);
    }

    #[test]
    fn from_lookup_reads_disable_flag_and_log_path() {
        let config = ObservabilityConfig::from_lookup(|key| match key {
            "FACULTY_OBSERVABILITY_ENABLED" => Some("off".into()),
            "FACULTY_JSON_LOG_PATH" => Some("logs/client.jsonl".into()),
            _ => None,
        });
        assert!(!config.enabled);
        assert_eq!(config.filter, "info");
        assert_eq!(
            config.json_log_path.as_deref(),
            Some(Path::new("logs/client.jsonl"))
        );
    }

    #[test]
    fn split_log_path_defaults_to_current_dir() {
        assert_eq!(
            split_log_path(Path::new("client.jsonl")),
            (Path::new("."), "client.jsonl")
        );
        assert_eq!(
            split_log_path(Path::new("/var/log/faculty/out.jsonl")),
            (Path::new("/var/log/faculty"), "out.jsonl")
        );
    }

    #[test]
    fn disabled_config_installs_nothing_and_later_calls_are_noops() {
        init_observability_with(ObservabilityConfig {
            enabled: false,
            ..ObservabilityConfig::default()
        });
        init_observability();
        assert!(INIT.get().is_some());
    }
}
