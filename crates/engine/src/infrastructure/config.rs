//! Engine configuration loaded from the environment.
//!
//! | Variable                          | Default | Meaning                                    |
//! |-----------------------------------|---------|--------------------------------------------|
//! | `PLACETREE_MAX_DEPTH`             | 32      | Deepest level a cascade may walk below its start |
//! | `PLACETREE_QUERY_CACHE`           | true    | Wrap the store in the lookup cache         |
//! | `PLACETREE_QUERY_CACHE_TTL_SECS`  | 300     | Lifetime of a cached lookup                |
//! | `PLACETREE_SEED_FILE`             | unset   | JSON file of locations to load at startup  |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MAX_DEPTH: usize = 32;
pub const DEFAULT_QUERY_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bound on cascade depth; exceeding it is a structural error.
    pub max_depth: usize,
    pub query_cache: bool,
    pub query_cache_ttl: Duration,
    pub seed_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            query_cache: true,
            query_cache_ttl: DEFAULT_QUERY_CACHE_TTL,
            seed_file: None,
        }
    }
}

impl EngineConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Values that fail to parse fall back to their default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_depth: parse_or("PLACETREE_MAX_DEPTH", &lookup, defaults.max_depth),
            query_cache: lookup("PLACETREE_QUERY_CACHE")
                .map(|raw| parse_flag("PLACETREE_QUERY_CACHE", &raw, defaults.query_cache))
                .unwrap_or(defaults.query_cache),
            query_cache_ttl: Duration::from_secs(parse_or(
                "PLACETREE_QUERY_CACHE_TTL_SECS",
                &lookup,
                defaults.query_cache_ttl.as_secs(),
            )),
            seed_file: lookup("PLACETREE_SEED_FILE")
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from),
        }
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, %default, "Unparseable setting, using default");
            default
        }),
    }
}

fn parse_flag(key: &str, raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!(key, value = %raw, default, "Unparseable flag, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]), EngineConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("PLACETREE_MAX_DEPTH", "8"),
            ("PLACETREE_QUERY_CACHE", "off"),
            ("PLACETREE_QUERY_CACHE_TTL_SECS", "5"),
            ("PLACETREE_SEED_FILE", "seeds/sierra_leone.json"),
        ]);
        assert_eq!(config.max_depth, 8);
        assert!(!config.query_cache);
        assert_eq!(config.query_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.seed_file, Some(PathBuf::from("seeds/sierra_leone.json")));
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let config = config_from(&[
            ("PLACETREE_MAX_DEPTH", "deep"),
            ("PLACETREE_QUERY_CACHE", "maybe"),
            ("PLACETREE_SEED_FILE", "   "),
        ]);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.query_cache);
        assert_eq!(config.seed_file, None);
    }
}
