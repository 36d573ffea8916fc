//! Pipeline source resolution.
//!
//! Exactly one source is used per run: an explicit path, piped input, or
//! the unique match among the default discovery candidates.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::log_info;

/// Default discovery candidates, relative to the working directory, in
/// priority order. At most one of these may exist.
pub const DEFAULT_CANDIDATES: [&str; 9] = [
    "buildkite.yml",
    "buildkite.yaml",
    "buildkite.json",
    ".buildkite/pipeline.yml",
    ".buildkite/pipeline.yaml",
    ".buildkite/pipeline.json",
    "buildkite/pipeline.yml",
    "buildkite/pipeline.yaml",
    "buildkite/pipeline.json",
];

/// Origin name used for piped input in log and error messages.
pub const STDIN_ORIGIN: &str = "(stdin)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    Explicit,
    Piped,
    Discovered,
}

#[derive(Debug)]
pub struct PipelineSource {
    pub content: Vec<u8>,
    pub origin_name: String,
    pub kind: OriginKind,
}

/// Resolve the single pipeline source for this run.
///
/// Priority: explicit path, then piped input, then candidate discovery in
/// `search_dir`. Candidate discovery fails when zero or more than one of
/// the candidates exist. Empty content after a successful read is an error
/// distinct from not finding a source at all.
pub fn resolve(
    explicit: Option<&Path>,
    piped: Option<&mut dyn Read>,
    search_dir: &Path,
    candidates: &[&str],
) -> Result<PipelineSource> {
    let source = if let Some(path) = explicit {
        log_info!("Reading pipeline config from \"{}\"", path.display());
        read_source(search_dir.join(path).as_path(), path, OriginKind::Explicit)?
    } else if let Some(reader) = piped {
        log_info!("Reading pipeline config from STDIN");

        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .map_err(|e| Error::internal_io(e.to_string(), Some("read stdin".to_string())))?;

        PipelineSource {
            content,
            origin_name: STDIN_ORIGIN.to_string(),
            kind: OriginKind::Piped,
        }
    } else {
        log_info!("Searching for pipeline config...");
        discover(search_dir, candidates)?
    };

    if source.content.is_empty() {
        return Err(Error::source_empty(&source.origin_name));
    }

    Ok(source)
}

fn discover(search_dir: &Path, candidates: &[&str]) -> Result<PipelineSource> {
    let exists: Vec<&str> = candidates
        .iter()
        .copied()
        .filter(|candidate| search_dir.join(candidate).exists())
        .collect();

    // Only one default config file may be present.
    if exists.len() > 1 {
        return Err(Error::source_ambiguous(
            exists.iter().map(|s| s.to_string()).collect(),
        ));
    }

    let found = exists.first().ok_or_else(|| {
        Error::source_not_found(None, candidates.iter().map(|s| s.to_string()).collect())
    })?;

    log_info!("Found config file \"{}\"", found);

    let relative = Path::new(found);
    read_source(
        search_dir.join(relative).as_path(),
        relative,
        OriginKind::Discovered,
    )
}

fn read_source(full_path: &Path, origin_path: &Path, kind: OriginKind) -> Result<PipelineSource> {
    let content = fs::read(full_path)
        .map_err(|_| Error::source_not_found(Some(origin_path.display().to_string()), Vec::new()))?;

    // Log and error messages use the base file name, matching how the
    // origin is reported by the parser and the redaction guard.
    let origin_name = origin_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| origin_path.display().to_string());

    Ok(PipelineSource {
        content,
        origin_name,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Cursor;

    fn write_candidate(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "steps:\n  - command: echo hi\n").unwrap();
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = tempfile::tempdir().unwrap();
        write_candidate(dir.path(), "custom-pipeline.yml");

        let source = resolve(
            Some(Path::new("custom-pipeline.yml")),
            None,
            dir.path(),
            &DEFAULT_CANDIDATES,
        )
        .unwrap();

        assert_eq!(source.kind, OriginKind::Explicit);
        assert_eq!(source.origin_name, "custom-pipeline.yml");
        assert!(!source.content.is_empty());
    }

    #[test]
    fn explicit_path_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let err = resolve(
            Some(Path::new("nope.yml")),
            None,
            dir.path(),
            &DEFAULT_CANDIDATES,
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::SourceNotFound);
    }

    #[test]
    fn piped_input_wins_when_no_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        write_candidate(dir.path(), "buildkite.yml");

        let mut piped = Cursor::new(b"steps: []\n".to_vec());
        let source = resolve(
            None,
            Some(&mut piped),
            dir.path(),
            &DEFAULT_CANDIDATES,
        )
        .unwrap();

        assert_eq!(source.kind, OriginKind::Piped);
        assert_eq!(source.origin_name, STDIN_ORIGIN);
        assert_eq!(source.content, b"steps: []\n");
    }

    #[test]
    fn all_nine_candidates_present_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        for candidate in DEFAULT_CANDIDATES {
            write_candidate(dir.path(), candidate);
        }

        let err = resolve(None, None, dir.path(), &DEFAULT_CANDIDATES).unwrap_err();

        assert_eq!(err.code, ErrorCode::SourceAmbiguous);
        for candidate in DEFAULT_CANDIDATES {
            assert!(err.message.contains(candidate));
        }
    }

    #[test]
    fn two_candidates_present_lists_both() {
        let dir = tempfile::tempdir().unwrap();
        write_candidate(dir.path(), "buildkite.yml");
        write_candidate(dir.path(), ".buildkite/pipeline.yml");

        let err = resolve(None, None, dir.path(), &DEFAULT_CANDIDATES).unwrap_err();

        assert_eq!(err.code, ErrorCode::SourceAmbiguous);
        assert!(err.message.contains("buildkite.yml"));
        assert!(err.message.contains(".buildkite/pipeline.yml"));
    }

    #[test]
    fn zero_candidates_is_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let err = resolve(None, None, dir.path(), &DEFAULT_CANDIDATES).unwrap_err();

        assert_eq!(err.code, ErrorCode::SourceNotFound);
    }

    #[test]
    fn unique_candidate_is_read_with_base_origin_name() {
        let dir = tempfile::tempdir().unwrap();
        write_candidate(dir.path(), ".buildkite/pipeline.yml");

        let source = resolve(None, None, dir.path(), &DEFAULT_CANDIDATES).unwrap();

        assert_eq!(source.kind, OriginKind::Discovered);
        assert_eq!(source.origin_name, "pipeline.yml");
    }

    #[test]
    fn empty_file_is_distinct_from_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("buildkite.yml"), "").unwrap();

        let err = resolve(None, None, dir.path(), &DEFAULT_CANDIDATES).unwrap_err();

        assert_eq!(err.code, ErrorCode::SourceEmpty);
    }

    #[test]
    fn empty_piped_input_is_source_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut piped = Cursor::new(Vec::new());

        let err = resolve(None, Some(&mut piped), dir.path(), &DEFAULT_CANDIDATES).unwrap_err();

        assert_eq!(err.code, ErrorCode::SourceEmpty);
    }

    #[test]
    fn alternate_candidate_list_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        write_candidate(dir.path(), "other.yml");

        let source = resolve(None, None, dir.path(), &["other.yml"]).unwrap();

        assert_eq!(source.origin_name, "other.yml");
    }
}
