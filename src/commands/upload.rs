use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Args;

use pipeup::api::{ApiClient, ApiConfig, DEFAULT_ENDPOINT};
use pipeup::environment::{self, Environment};
use pipeup::git::GitRevisionResolver;
use pipeup::source::{self, DEFAULT_CANDIDATES};
use pipeup::upload::{self, RetryPolicy, UploadConfig, UploadOutcome};

use super::CmdResult;

pub const UPLOAD_HELP: &str = "\
Uploads a YAML (recommended) or JSON pipeline definition, adding it to the
currently running build after the current job. If no file is given, the
command looks in the following locations:

  - buildkite.yml
  - buildkite.yaml
  - buildkite.json
  - .buildkite/pipeline.yml
  - .buildkite/pipeline.yaml
  - .buildkite/pipeline.json
  - buildkite/pipeline.yml
  - buildkite/pipeline.yaml
  - buildkite/pipeline.json

You can also pipe pipelines to the command, allowing scripts that generate
dynamic pipelines:

  $ pipeup upload
  $ pipeup upload my-custom-pipeline.yml
  $ ./script/dynamic_step_generator | pipeup upload";

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Path to the pipeline file (otherwise STDIN or the default locations)
    pub path: Option<PathBuf>,

    /// Replace the rest of the existing pipeline with the uploaded steps.
    /// Jobs that are already running are not removed.
    #[arg(long, env = "BUILDKITE_PIPELINE_REPLACE")]
    pub replace: bool,

    /// The job that is making the changes to its build
    #[arg(long, env = "BUILDKITE_JOB_ID", default_value = "", hide_env_values = true)]
    pub job: String,

    /// Echo the parsed pipeline to stdout instead of uploading it
    #[arg(long, env = "BUILDKITE_PIPELINE_UPLOAD_DRY_RUN")]
    pub dry_run: bool,

    /// Skip variable interpolation when parsing the pipeline
    #[arg(long, env = "BUILDKITE_PIPELINE_NO_INTERPOLATION")]
    pub no_interpolation: bool,

    /// Variable name patterns whose values must not appear in the uploaded
    /// pipeline (comma separated, globs allowed)
    #[arg(
        long,
        env = "BUILDKITE_REDACTED_VARS",
        value_delimiter = ',',
        value_name = "PATTERN"
    )]
    pub redacted_vars: Vec<String>,

    #[command(flatten)]
    pub api: ApiArgs,
}

/// Agent API connection flags.
#[derive(Args, Debug)]
pub struct ApiArgs {
    /// Agent API endpoint
    #[arg(long, env = "BUILDKITE_AGENT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Agent access token
    #[arg(
        long = "agent-access-token",
        env = "BUILDKITE_AGENT_ACCESS_TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    pub agent_access_token: String,

    /// Disable HTTP/2 for agent API requests
    #[arg(long = "no-http2")]
    pub no_http2: bool,

    /// Log HTTP requests to the agent API
    #[arg(long = "debug-http")]
    pub debug_http: bool,
}

pub fn run(args: UploadArgs, global: &super::GlobalArgs) -> CmdResult<UploadOutcome> {
    // Candidate discovery must stay reachable when stdin is /dev/null or
    // another empty non-terminal stream, so terminal detection alone is
    // not enough here.
    let stdin = io::stdin();
    let mut stdin_reader: io::StdinLock;
    let piped: Option<&mut dyn Read> = if crate::tty::stdin_is_readable() {
        stdin_reader = stdin.lock();
        Some(&mut stdin_reader)
    } else {
        None
    };

    let source = source::resolve(
        args.path.as_deref(),
        piped,
        Path::new("."),
        &DEFAULT_CANDIDATES,
    )?;

    let mut env = Environment::from_process();
    environment::resolve_commit(&mut env, &GitRevisionResolver);

    let cfg = UploadConfig {
        job_id: args.job,
        access_token: args.api.agent_access_token.clone(),
        replace: args.replace,
        dry_run: args.dry_run,
        no_interpolation: args.no_interpolation,
        redacted_vars: args.redacted_vars,
        retry: RetryPolicy::default(),
    };

    let api = ApiClient::new(&ApiConfig {
        endpoint: args.api.endpoint,
        access_token: args.api.agent_access_token,
        no_http2: args.api.no_http2,
        debug_http: args.api.debug_http && global.debug,
    })?;

    let outcome = upload::run(&cfg, &source, &env, &api, &mut io::stdout())?;

    Ok((outcome, 0))
}
