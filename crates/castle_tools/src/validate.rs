//! Rules file validation.

use std::path::Path;

use castle_core::rules::RulesConfig;

use crate::error::Result;

/// Parse and validate a RON rules file.
///
/// Fields missing from the file take their default values.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or holds
/// values the engine cannot run with.
pub fn validate_rules_file(path: &Path) -> Result<RulesConfig> {
    let text = std::fs::read_to_string(path)?;
    let rules: RulesConfig = ron::from_str(&text)?;
    rules.validate()?;
    tracing::debug!(?rules, "Rules validated");
    Ok(rules)
}

/// Load rules from `path`, or the defaults when no path is given.
///
/// # Errors
///
/// See [`validate_rules_file`].
pub fn rules_or_default(path: Option<&Path>) -> Result<RulesConfig> {
    match path {
        Some(path) => validate_rules_file(path),
        None => Ok(RulesConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;

    fn write(text: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.ron");
        std::fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[test]
    fn test_partial_rules_use_defaults() {
        let (_dir, path) = write("(soldier_price: 50)");
        let rules = validate_rules_file(&path).unwrap();
        assert_eq!(rules.soldier_price, 50);
        assert_eq!(rules.winner_cooldown_ms, 30_000);
    }

    #[test]
    fn test_unparseable_rules() {
        let (_dir, path) = write("(soldier_price: \"lots\")");
        assert!(matches!(validate_rules_file(&path), Err(ToolError::Ron(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let (_dir, path) = write("(max_target_draws: 0)");
        assert!(matches!(
            validate_rules_file(&path),
            Err(ToolError::Engine(_))
        ));
    }

    #[test]
    fn test_no_path_gives_defaults() {
        assert_eq!(rules_or_default(None).unwrap(), RulesConfig::default());
    }
}
