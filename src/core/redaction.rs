//! Redaction guard: refuses to upload documents containing secret values.

use glob_match::glob_match;
use serde_json::Value;

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::log_warn;

/// Values shorter than this are skipped: they over-match the punctuation
/// and short tokens of a serialized document.
pub const MIN_NEEDLE_LEN: usize = 6;

/// Resolve redaction needles from the environment.
///
/// An environment variable contributes its value when its name matches any
/// of the patterns. Patterns may be literal names or globs (`*_PASSWORD`).
pub fn values_to_redact(patterns: &[String], env: &Environment) -> Vec<String> {
    let mut needles = Vec::new();

    for (name, value) in env.to_map() {
        if !patterns.iter().any(|pattern| glob_match(pattern, name)) {
            continue;
        }
        if value.is_empty() {
            continue;
        }
        if value.len() < MIN_NEEDLE_LEN {
            log_warn!(
                "Value of {} is shorter than {} bytes and will not be redacted",
                name,
                MIN_NEEDLE_LEN
            );
            continue;
        }
        needles.push(value.clone());
    }

    needles
}

/// Scan the serialized document for secret values, in one self-contained
/// pass before any network attempt.
///
/// Inactive when the pattern list is empty. Any match is fatal; there is no
/// partial upload.
pub fn check(document: &Value, patterns: &[String], env: &Environment, origin: &str) -> Result<()> {
    if patterns.is_empty() {
        return Ok(());
    }

    let needles = values_to_redact(patterns, env);

    let serialized = serde_json::to_string(document)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize document".to_string())))?;

    for needle in &needles {
        if serialized.contains(needle.as_str()) {
            return Err(Error::redaction_secret_detected(origin));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn document_containing_secret_is_refused() {
        let env = env(&[("SECRET", "foo123")]);
        let doc = json!({"steps": [{"command": "echo foo123"}]});

        let err = check(&doc, &["SECRET".to_string()], &env, "pipeline.yml").unwrap_err();

        assert_eq!(err.code, ErrorCode::RedactionSecretDetected);
        assert!(err.message.contains("pipeline.yml"));
    }

    #[test]
    fn document_without_secret_passes() {
        let env = env(&[("SECRET", "foo123")]);
        let doc = json!({"steps": [{"command": "echo hello"}]});

        assert!(check(&doc, &["SECRET".to_string()], &env, "pipeline.yml").is_ok());
    }

    #[test]
    fn empty_spec_deactivates_the_guard() {
        let env = env(&[("SECRET", "foo123")]);
        let doc = json!({"steps": [{"command": "echo foo123"}]});

        assert!(check(&doc, &[], &env, "pipeline.yml").is_ok());
    }

    #[test]
    fn glob_patterns_match_variable_names() {
        let env = env(&[("DB_PASSWORD", "hunter22")]);
        let needles = values_to_redact(&["*_PASSWORD".to_string()], &env);

        assert_eq!(needles, vec!["hunter22".to_string()]);
    }

    #[test]
    fn short_values_are_not_used_as_needles() {
        let env = env(&[("SECRET", "abc")]);
        let doc = json!({"steps": [{"command": "echo abc"}]});

        assert!(values_to_redact(&["SECRET".to_string()], &env).is_empty());
        assert!(check(&doc, &["SECRET".to_string()], &env, "pipeline.yml").is_ok());
    }

    #[test]
    fn unmatched_names_contribute_nothing() {
        let env = env(&[("HARMLESS", "visible-value")]);
        let needles = values_to_redact(&["SECRET".to_string()], &env);

        assert!(needles.is_empty());
    }
}
