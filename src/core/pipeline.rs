//! Pipeline parsing and variable interpolation.
//!
//! Pipelines are YAML (JSON being a YAML subset, `.json` sources parse the
//! same way). Interpolation runs over the raw document text before parsing,
//! so generated values can appear anywhere in the structure.

use std::borrow::Cow;
use std::io::Write;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::environment::Environment;
use crate::error::{Error, Result};

/// Parser collaborator: `(bytes, env, origin, flag) → document | error`.
pub struct PipelineParser<'a> {
    pub env: &'a Environment,
    pub filename: String,
    pub no_interpolation: bool,
}

impl PipelineParser<'_> {
    pub fn parse(&self, content: &[u8]) -> Result<Value> {
        let text = std::str::from_utf8(content)
            .map_err(|e| Error::pipeline_parse_failed(&self.filename, e.to_string()))?;

        let text = if self.no_interpolation {
            Cow::Borrowed(text)
        } else {
            interpolate(text, self.env)
        };

        let yaml: serde_yml::Value = serde_yml::from_str(&text)
            .map_err(|e| Error::pipeline_parse_failed(&self.filename, e.to_string()))?;

        serde_json::to_value(yaml)
            .map_err(|e| Error::pipeline_parse_failed(&self.filename, e.to_string()))
    }
}

/// Substitute `$VAR` and `${VAR}` references from the environment.
///
/// `$$` escapes a literal dollar sign; unset variables substitute to the
/// empty string.
pub fn interpolate<'a>(text: &'a str, env: &Environment) -> Cow<'a, str> {
    let re = Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap();

    re.replace_all(text, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2));
        match name {
            Some(name) => env.get(name.as_str()).unwrap_or("").to_string(),
            None => "$".to_string(), // the $$ escape
        }
    })
}

/// Serialize a document as indented JSON to `out`, for dry-run mode.
///
/// Logging goes to stderr, so this output can be piped into other tools to
/// get the interpolated document.
pub fn write_document_pretty(document: &Value, out: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, document)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize document".to_string())))?;
    out.write_all(b"\n")
        .map_err(|e| Error::internal_io(e.to_string(), Some("write stdout".to_string())))?;
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

    fn parser<'a>(env: &'a Environment, no_interpolation: bool) -> PipelineParser<'a> {
        PipelineParser {
            env,
            filename: "pipeline.yml".to_string(),
            no_interpolation,
        }
    }

    #[test]
    fn parses_yaml_into_document() {
        let env = Environment::default();
        let doc = parser(&env, false)
            .parse(b"steps:\n  - command: echo hello\n")
            .unwrap();

        assert_eq!(doc, json!({"steps": [{"command": "echo hello"}]}));
    }

    #[test]
    fn parses_json_content() {
        let env = Environment::default();
        let doc = parser(&env, false)
            .parse(br#"{"steps": [{"command": "make"}]}"#)
            .unwrap();

        assert_eq!(doc, json!({"steps": [{"command": "make"}]}));
    }

    #[test]
    fn interpolates_braced_and_bare_references() {
        let env = env(&[("BRANCH", "main"), ("TARGET", "prod")]);
        let doc = parser(&env, false)
            .parse(b"steps:\n  - command: deploy ${TARGET} $BRANCH\n")
            .unwrap();

        assert_eq!(doc["steps"][0]["command"], "deploy prod main");
    }

    #[test]
    fn unset_variables_interpolate_to_empty() {
        let env = Environment::default();
        let doc = parser(&env, false)
            .parse(b"steps:\n  - command: \"echo ${MISSING}end\"\n")
            .unwrap();

        assert_eq!(doc["steps"][0]["command"], "echo end");
    }

    #[test]
    fn double_dollar_escapes_literal() {
        let env = env(&[("HOME", "/root")]);
        let doc = parser(&env, false)
            .parse(b"steps:\n  - command: \"echo $$HOME\"\n")
            .unwrap();

        assert_eq!(doc["steps"][0]["command"], "echo $HOME");
    }

    #[test]
    fn no_interpolation_leaves_references_untouched() {
        let env = env(&[("BRANCH", "main")]);
        let doc = parser(&env, true)
            .parse(b"steps:\n  - command: \"echo ${BRANCH}\"\n")
            .unwrap();

        assert_eq!(doc["steps"][0]["command"], "echo ${BRANCH}");
    }

    #[test]
    fn parse_failure_names_the_origin() {
        let env = Environment::default();
        let err = parser(&env, false)
            .parse(b"steps: [unbalanced\n")
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::PipelineParseFailed);
        assert!(err.message.contains("pipeline.yml"));
    }

    #[test]
    fn dry_run_output_reparses_to_an_equivalent_document() {
        let env = env(&[("BRANCH", "main")]);
        let p = parser(&env, false);
        let doc = p.parse(b"steps:\n  - command: echo $BRANCH\n").unwrap();

        let mut out = Vec::new();
        write_document_pretty(&doc, &mut out).unwrap();

        let reparsed = parser(&env, false).parse(&out).unwrap();
        assert_eq!(doc, reparsed);
    }
}
