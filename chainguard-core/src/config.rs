//! Layered configuration: defaults → `$CHAINGUARD_HOME/config.toml` →
//! `CHAINGUARD_*` environment overrides (§3.1, modeled on the teacher's
//! `config_loader.rs` three-layer precedence).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// All tunable thresholds in one place, loaded once at process startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub debounce_window: Duration,
    pub project_cache_capacity: usize,
    pub out_of_scope_cap: usize,
    pub changed_files_cap: usize,
    pub recent_actions_cap: usize,
    pub error_index_cap: usize,
    pub db_schema_check_ttl: Duration,
    pub db_schema_cache_ttl: Duration,
    pub http_session_cache_capacity: usize,
    pub http_session_ttl: Duration,
    pub similarity_threshold: f64,
    pub auto_suggest_max_results: usize,
    pub syntax_validator_timeout: Duration,
    pub checklist_item_timeout: Duration,
    pub scope_description_max_chars: usize,
    pub schema_file_patterns: Vec<String>,
    pub chainguard_home: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(500),
            project_cache_capacity: 20,
            out_of_scope_cap: 20,
            changed_files_cap: 30,
            recent_actions_cap: 5,
            error_index_cap: 100,
            db_schema_check_ttl: Duration::from_secs(600),
            db_schema_cache_ttl: Duration::from_secs(300),
            http_session_cache_capacity: 50,
            http_session_ttl: Duration::from_secs(24 * 60 * 60),
            similarity_threshold: 0.6,
            auto_suggest_max_results: 2,
            syntax_validator_timeout: Duration::from_secs(10),
            checklist_item_timeout: Duration::from_secs(10),
            scope_description_max_chars: 500,
            schema_file_patterns: vec![
                ".sql".to_string(),
                "migration".to_string(),
                "migrate".to_string(),
                "schema".to_string(),
                "database".to_string(),
            ],
            chainguard_home: default_home(),
        }
    }
}

fn default_home() -> PathBuf {
    env::var_os("CHAINGUARD_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs_home().map(|h| h.join(".chainguard")))
        .unwrap_or_else(|| PathBuf::from(".chainguard"))
}

fn dirs_home() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

/// Subset of fields overridable from `config.toml`; anything absent keeps
/// the built-in default.
#[derive(Debug, Default, Deserialize)]
struct FileOverrides {
    debounce_window_ms: Option<u64>,
    project_cache_capacity: Option<usize>,
    db_schema_check_ttl_secs: Option<u64>,
    db_schema_cache_ttl_secs: Option<u64>,
    similarity_threshold: Option<f64>,
    syntax_validator_timeout_secs: Option<u64>,
    checklist_item_timeout_secs: Option<u64>,
}

impl Settings {
    /// Loads defaults, then `$CHAINGUARD_HOME/config.toml` if present, then
    /// `CHAINGUARD_*` environment variables.
    pub fn load() -> Self {
        let mut settings = Self::default();

        let config_path = settings.chainguard_home.join("config.toml");
        if let Ok(contents) = std::fs::read_to_string(&config_path) {
            if let Ok(overrides) = toml::from_str::<FileOverrides>(&contents) {
                settings.apply_file_overrides(overrides);
            }
        }

        settings.apply_env_overrides();
        settings
    }

    fn apply_file_overrides(&mut self, overrides: FileOverrides) {
        if let Some(v) = overrides.debounce_window_ms {
            self.debounce_window = Duration::from_millis(v);
        }
        if let Some(v) = overrides.project_cache_capacity {
            self.project_cache_capacity = v;
        }
        if let Some(v) = overrides.db_schema_check_ttl_secs {
            self.db_schema_check_ttl = Duration::from_secs(v);
        }
        if let Some(v) = overrides.db_schema_cache_ttl_secs {
            self.db_schema_cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = overrides.similarity_threshold {
            self.similarity_threshold = v;
        }
        if let Some(v) = overrides.syntax_validator_timeout_secs {
            self.syntax_validator_timeout = Duration::from_secs(v);
        }
        if let Some(v) = overrides.checklist_item_timeout_secs {
            self.checklist_item_timeout = Duration::from_secs(v);
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_u64("CHAINGUARD_DEBOUNCE_WINDOW_MS") {
            self.debounce_window = Duration::from_millis(v);
        }
        if let Some(v) = env_usize("CHAINGUARD_PROJECT_CACHE_CAPACITY") {
            self.project_cache_capacity = v;
        }
        if let Some(v) = env_u64("CHAINGUARD_DB_SCHEMA_CHECK_TTL_SECS") {
            self.db_schema_check_ttl = Duration::from_secs(v);
        }
        if let Some(v) = env_u64("CHAINGUARD_DB_SCHEMA_CACHE_TTL_SECS") {
            self.db_schema_cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = env_f64("CHAINGUARD_SIMILARITY_THRESHOLD") {
            self.similarity_threshold = v;
        }
    }

    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.chainguard_home.join("projects").join(project_id)
    }

    pub fn matches_schema_pattern(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        self.schema_file_patterns.iter().any(|p| lower.contains(p))
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let settings = Settings::default();
        assert_eq!(settings.debounce_window, Duration::from_millis(500));
        assert_eq!(settings.project_cache_capacity, 20);
        assert_eq!(settings.db_schema_check_ttl, Duration::from_secs(600));
        assert_eq!(settings.similarity_threshold, 0.6);
        assert_eq!(settings.auto_suggest_max_results, 2);
    }

    #[test]
    fn file_overrides_parse_via_toml() {
        let contents = "debounce_window_ms = 250\nsimilarity_threshold = 0.75\n";
        let overrides: FileOverrides = toml::from_str(contents).unwrap();
        assert_eq!(overrides.debounce_window_ms, Some(250));
        assert_eq!(overrides.similarity_threshold, Some(0.75));
        assert_eq!(overrides.project_cache_capacity, None);
    }

    #[test]
    fn matches_schema_pattern_is_case_insensitive_substring() {
        let settings = Settings::default();
        assert!(settings.matches_schema_pattern("db/001.sql"));
        assert!(settings.matches_schema_pattern("src/Migrations/Add_Users.php"));
        assert!(settings.matches_schema_pattern("app/Database/Connection.php"));
        assert!(!settings.matches_schema_pattern("src/UserController.php"));
    }
}
