use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::{upload, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pipeup")]
#[command(version = VERSION)]
#[command(about = "Uploads build-pipeline definitions to the build orchestration service")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a pipeline definition to the currently running build
    #[command(long_about = upload::UPLOAD_HELP)]
    Upload(upload::UploadArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Upload(args) => upload::run(args, &cli.global),
    };

    match result {
        Ok((_, exit_code)) => std::process::ExitCode::from(exit_code_to_u8(exit_code)),
        Err(err) => {
            output::print_error(&err);
            std::process::ExitCode::from(exit_code_to_u8(err.code.exit_code()))
        }
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
