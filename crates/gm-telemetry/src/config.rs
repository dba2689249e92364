use gm_ports::{EnvPort, LogLevel};

/// How (or whether) a repository identity is attached to metric tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoTagMode {
    #[default]
    Off,
    Hash,
    Plain,
}

/// Which digest backs [`RepoTagMode::Hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgo {
    #[default]
    Fnv,
    Sha256,
}

/// Log-line rendering format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Maximum number of validated extra tags the environment may contribute.
pub const MAX_EXTRA_TAGS: usize = 3;

const MAX_KEY_LEN: usize = 31;
const MAX_VALUE_LEN: usize = 63;

/// Telemetry configuration parsed from the `GITMIND_*` environment
/// variables in the specification's §6 table. Every field has a safe
/// default so a repository with no configuration at all still gets
/// metrics, text logs at INFO, and no repository identity leaked into
/// tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub metrics_enabled: bool,
    pub tag_branch: bool,
    pub tag_mode: bool,
    pub repo_tag: RepoTagMode,
    pub repo_hash_algo: HashAlgo,
    /// Up to [`MAX_EXTRA_TAGS`] validated `(key, value)` pairs.
    pub extras: Vec<(String, String)>,
    /// `true` when at least one extra was dropped, either for failing
    /// validation or for exceeding capacity.
    pub extras_dropped: bool,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            tag_branch: true,
            tag_mode: true,
            repo_tag: RepoTagMode::Off,
            repo_hash_algo: HashAlgo::Fnv,
            extras: Vec::new(),
            extras_dropped: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from `env`, applying the defaults above for any
    /// variable that is unset, empty, or unrecognized.
    pub fn load(env: &dyn EnvPort) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env.get("GITMIND_METRICS_ENABLED") {
            cfg.metrics_enabled = parse_bool_default_true(&v);
        }
        if let Some(v) = env.get("GITMIND_METRICS_BRANCH_TAG") {
            cfg.tag_branch = parse_bool_default_true(&v);
        }
        if let Some(v) = env.get("GITMIND_METRICS_MODE_TAG") {
            cfg.tag_mode = parse_bool_default_true(&v);
        }
        if let Some(v) = env.get("GITMIND_METRICS_REPO_TAG") {
            cfg.repo_tag = parse_repo_tag_mode(&v);
        }
        if let Some(v) = env.get("GITMIND_METRICS_REPO_HASH_ALGO") {
            cfg.repo_hash_algo = parse_hash_algo(&v);
        }
        if let Some(v) = env.get("GITMIND_METRICS_EXTRA_TAGS") {
            parse_extras(&v, &mut cfg);
        }
        if let Some(v) = env.get("GITMIND_LOG_LEVEL") {
            cfg.log_level = parse_log_level(&v);
        }
        if let Some(v) = env.get("GITMIND_LOG_FORMAT") {
            cfg.log_format = parse_log_format(&v);
        }

        cfg
    }
}

fn parse_bool_default_true(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if value == "0" {
        return false;
    }
    !matches!(value.to_ascii_lowercase().as_str(), "false" | "off" | "no")
}

fn parse_repo_tag_mode(value: &str) -> RepoTagMode {
    match value.to_ascii_lowercase().as_str() {
        "hash" => RepoTagMode::Hash,
        "plain" => RepoTagMode::Plain,
        _ => RepoTagMode::Off,
    }
}

fn parse_hash_algo(value: &str) -> HashAlgo {
    match value.to_ascii_lowercase().as_str() {
        "sha256" => HashAlgo::Sha256,
        _ => HashAlgo::Fnv,
    }
}

fn parse_log_level(value: &str) -> LogLevel {
    match value.to_ascii_uppercase().as_str() {
        "DEBUG" => LogLevel::Debug,
        "WARN" => LogLevel::Warn,
        "ERROR" => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

fn parse_log_format(value: &str) -> LogFormat {
    match value.to_ascii_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

fn is_key_char(c: char) -> bool {
    c == '_' || c == '-' || c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_value_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '@' | '/')
}

fn valid_key(key: &str) -> bool {
    !key.is_empty() && key.len() <= MAX_KEY_LEN && key.chars().all(is_key_char)
}

fn valid_value(value: &str) -> bool {
    !value.is_empty() && value.len() <= MAX_VALUE_LEN && value.chars().all(is_value_char)
}

fn parse_extras(csv: &str, cfg: &mut TelemetryConfig) {
    for token in csv.split(',') {
        let token = token.trim_start_matches(' ');
        let Some((key, value)) = token.split_once('=') else {
            cfg.extras_dropped = true;
            continue;
        };
        if cfg.extras.len() >= MAX_EXTRA_TAGS {
            cfg.extras_dropped = true;
            continue;
        }
        if !valid_key(key) || !valid_value(value) {
            cfg.extras_dropped = true;
            continue;
        }
        cfg.extras.push((key.to_string(), value.to_string()));
    }
}
