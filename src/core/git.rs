//! Revision resolution via the local git repository.

use std::process::{Command, Output};

use crate::environment::RevisionResolver;
use crate::error::{Error, Result};

/// Resolves revision expressions by spawning `git rev-parse` in the
/// working directory.
#[derive(Debug, Default)]
pub struct GitRevisionResolver;

impl RevisionResolver for GitRevisionResolver {
    fn rev_parse(&self, spec: &str) -> Result<String> {
        let output = Command::new("git")
            .args(["rev-parse", spec])
            .output()
            .map_err(|e| Error::git_command_failed(format!("Failed to run git rev-parse: {}", e)))?;

        if !output.status.success() {
            return Err(Error::git_command_failed(format!(
                "git rev-parse failed: {}",
                error_text(&output)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Prefers stderr, falls back to stdout if stderr is empty.
fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rev_parse_fails_for_garbage_spec_outside_a_repo() {
        let resolver = GitRevisionResolver;
        // An object name no repository will resolve.
        let result = resolver.rev_parse("definitely-not-a-revision-xyz");
        assert!(result.is_err());
    }
}
