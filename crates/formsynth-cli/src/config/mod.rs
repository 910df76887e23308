//! Document path resolution.

use std::path::PathBuf;

/// Env var overriding the schema document path.
pub const SCHEMA_ENV: &str = "FORMSYNTH_SCHEMA";

/// Env var overriding the rules document path.
pub const RULES_ENV: &str = "FORMSYNTH_RULES";

const DEFAULT_SCHEMA_FILE: &str = "data.json";
const DEFAULT_RULES_FILE: &str = "responses.json";

/// Resolve the schema document path: flag, then env, then `./data.json`.
pub fn resolve_schema_path(explicit: Option<&str>) -> PathBuf {
    resolve(explicit, std::env::var(SCHEMA_ENV).ok(), DEFAULT_SCHEMA_FILE)
}

/// Resolve the rules document path: flag, then env, then `./responses.json`.
pub fn resolve_rules_path(explicit: Option<&str>) -> PathBuf {
    resolve(explicit, std::env::var(RULES_ENV).ok(), DEFAULT_RULES_FILE)
}

fn resolve(explicit: Option<&str>, from_env: Option<String>, default: &str) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }
    match from_env {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        let path = resolve(Some("a.json"), Some("b.json".into()), "c.json");
        assert_eq!(path, PathBuf::from("a.json"));
    }

    #[test]
    fn test_env_then_default() {
        assert_eq!(
            resolve(None, Some("b.json".into()), "c.json"),
            PathBuf::from("b.json")
        );
        assert_eq!(resolve(None, Some("  ".into()), "c.json"), PathBuf::from("c.json"));
        assert_eq!(resolve(None, None, "c.json"), PathBuf::from("c.json"));
    }
}
