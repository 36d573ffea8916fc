//! Interpolation environment for the pipeline parser.

use std::collections::HashMap;

use crate::error::Result;
use crate::{log_info, log_warn};

/// Variable holding the commit/revision expression that may be rewritten
/// to a resolved hash before interpolation.
pub const COMMIT_VAR: &str = "BUILDKITE_COMMIT";

/// String→string variable mapping handed to the parser as interpolation
/// context. Owned exclusively by one invocation; never written back to the
/// process environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn to_map(&self) -> &HashMap<String, String> {
        &self.vars
    }
}

impl FromIterator<(String, String)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Resolves a revision expression to a commit hash.
///
/// Injectable so tests can substitute the spawned-process implementation
/// in `git.rs`.
pub trait RevisionResolver {
    fn rev_parse(&self, spec: &str) -> Result<String>;
}

/// Rewrite the commit variable to a resolved hash when possible.
///
/// Resolution failure is the one recovered failure in the workflow: the
/// original value is kept and a warning logged.
pub fn resolve_commit(env: &mut Environment, resolver: &dyn RevisionResolver) {
    let Some(commit) = env.get(COMMIT_VAR).map(str::to_string) else {
        return;
    };

    match resolver.rev_parse(&commit) {
        Ok(resolved) => {
            log_info!("Updating {} to {:?}", COMMIT_VAR, resolved);
            env.set(COMMIT_VAR, resolved);
        }
        Err(err) => {
            log_warn!("Error running git rev-parse {:?}: {}", commit, err);
        }
    }
}
