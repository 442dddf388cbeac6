use crate::batch::DEFAULT_ROUND_SIZE;
use crate::db::default_data_dir;
use crate::logger;
use crate::session::{DEFAULT_RESOLVE_DELAY, SessionConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub learner_id: String,
    pub round_size: usize,
    pub resolve_delay: Duration,
    pub flashcards_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub persist: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learner_id: "guest".to_string(),
            round_size: DEFAULT_ROUND_SIZE,
            resolve_delay: DEFAULT_RESOLVE_DELAY,
            flashcards_dir: PathBuf::from("flashcards"),
            data_dir: default_data_dir(),
            log_file: PathBuf::from("match_debug.log"),
            persist: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(vars, key);

        let learner_id = get("MATCH_LEARNER_ID")
            .or_else(|| get("USER"))
            .map(str::to_string)
            .unwrap_or(defaults.learner_id);

        let round_size = parse_or("MATCH_ROUND_SIZE", get("MATCH_ROUND_SIZE"), defaults.round_size)
            .max(1);
        let resolve_delay = parse_or(
            "MATCH_RESOLVE_DELAY_MS",
            get("MATCH_RESOLVE_DELAY_MS"),
            defaults.resolve_delay.as_millis() as u64,
        );

        Self {
            learner_id,
            round_size,
            resolve_delay: Duration::from_millis(resolve_delay),
            flashcards_dir: get("MATCH_FLASHCARDS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.flashcards_dir),
            data_dir: get("MATCH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_file: get("MATCH_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            persist: !parse_or("MATCH_NO_PERSIST", get("MATCH_NO_PERSIST").map(normalize_bool), false),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            round_size: self.round_size,
            resolve_delay: self.resolve_delay,
        }
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn normalize_bool(raw: &str) -> &str {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "yes" | "on" | "true" => "true",
        "0" | "no" | "off" | "false" => "false",
        _ => raw,
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            logger::warn(&format!("Invalid {}={:?}, using default", key, value));
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&HashMap::new());
        assert_eq!(config.learner_id, "guest");
        assert_eq!(config.round_size, 6);
        assert_eq!(config.resolve_delay, Duration::from_millis(250));
        assert_eq!(config.flashcards_dir, PathBuf::from("flashcards"));
        assert!(config.persist);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(&vars(&[
            ("MATCH_LEARNER_ID", "learner-7"),
            ("USER", "ignored"),
            ("MATCH_ROUND_SIZE", "4"),
            ("MATCH_RESOLVE_DELAY_MS", "0"),
            ("MATCH_DATA_DIR", "/tmp/match"),
            ("MATCH_NO_PERSIST", "yes"),
        ]));
        assert_eq!(config.learner_id, "learner-7");
        assert_eq!(config.round_size, 4);
        assert_eq!(config.resolve_delay, Duration::ZERO);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/match"));
        assert!(!config.persist);
        assert_eq!(config.session_config().round_size, 4);
    }

    #[test]
    fn test_user_fallback_for_learner() {
        let config = Config::from_vars(&vars(&[("USER", "sam")]));
        assert_eq!(config.learner_id, "sam");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_vars(&vars(&[
            ("MATCH_ROUND_SIZE", "lots"),
            ("MATCH_RESOLVE_DELAY_MS", "-5"),
            ("MATCH_NO_PERSIST", "maybe"),
        ]));
        assert_eq!(config.round_size, 6);
        assert_eq!(config.resolve_delay, Duration::from_millis(250));
        assert!(config.persist);
    }

    #[test]
    fn test_round_size_at_least_one() {
        let config = Config::from_vars(&vars(&[("MATCH_ROUND_SIZE", "0")]));
        assert_eq!(config.round_size, 1);
    }
}
