//! Fatal-error reporting for the CLI.
//!
//! Core functions return errors instead of terminating; this layer
//! preserves the "message + terminate" behavior by printing to stderr and
//! handing the mapped exit code back to main.

use pipeup::{log_error, Error};

pub fn print_error(err: &Error) {
    log_error!("{} ({})", err.message, err.code.as_str());
    for hint in &err.hints {
        eprintln!("        {}", hint.message);
    }
}
