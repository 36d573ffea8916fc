use clap::Args;

pub mod upload;

pub type CmdResult<T> = pipeup::Result<(T, i32)>;

/// Flags shared by every subcommand. `no-color`, `experiment` and
/// `profile` are accepted for job-environment compatibility but drive no
/// further behavior here.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Enable experimental features (comma separated)
    #[arg(long = "experiment", global = true, value_delimiter = ',')]
    pub experiments: Vec<String>,

    /// Enable a profiling mode
    #[arg(long, global = true)]
    pub profile: Option<String>,
}
