//! Rule file loading.

use std::path::Path;

use tracing::{debug, warn};

use super::Rule;
use crate::RuleSourceError;

/// Parses a JSON array of rule records.
///
/// # Errors
///
/// Returns an error if the document is not an array of valid rule records.
pub fn parse_rules(json: &str) -> Result<Vec<Rule>, serde_json::Error> {
    let rules: Vec<Rule> = serde_json::from_str(json)?;

    for (index, rule) in rules.iter().enumerate() {
        if rule.matches_everything() {
            warn!(
                index,
                comment = %rule.comment,
                "rule has no sender or subject pattern and matches every message in its window"
            );
        }
    }

    Ok(rules)
}

/// Loads rules from a JSON rule file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not contain a valid
/// rule list.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, RuleSourceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RuleSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rules = parse_rules(&contents).map_err(|source| RuleSourceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), count = rules.len(), "Loaded rules");
    Ok(rules)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    const RULES: &str = r#"[
        {"mail": "ops@x.com", "subject": "Heartbeat", "fail_if_not_found": true, "hour_threshold": 1},
        {"mail": "*", "subject": "ALERT", "fail_if_found": true, "hour_threshold": 24},
        {"mail": "news@x.com", "subject": "", "hour_threshold": 6, "comment": "newsletter"}
    ]"#;

    #[test]
    fn test_parse_preserves_order() {
        let rules = parse_rules(RULES).unwrap();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].sender_pattern, "ops@x.com");
        assert_eq!(rules[1].subject_pattern, "ALERT");
        assert_eq!(rules[2].comment, "newsletter");
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_rules("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_object() {
        assert!(parse_rules(r#"{"mail": "a"}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RULES.as_bytes()).unwrap();

        let rules = load_rules(file.path()).unwrap();
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");

        let err = load_rules(&path).unwrap_err();
        assert!(matches!(err, RuleSourceError::Io { .. }));
        assert!(err.to_string().contains("filters.json"));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[{\"hour_threshold\": \"soon\"}]").unwrap();

        let err = load_rules(file.path()).unwrap_err();
        assert!(matches!(err, RuleSourceError::Parse { .. }));
    }
}
