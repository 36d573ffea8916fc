/// Leveled logging macros writing to stderr.
///
/// Usage:
/// ```ignore
/// log_info!("Reading pipeline config from \"{}\"", path);
/// log_warn!("Error running git rev-parse {:?}: {}", spec, err);
/// ```
///
/// All logging goes to stderr so stdout stays reserved for machine-readable
/// output (the dry-run document in particular).
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        eprintln!("[info] {}", format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        eprintln!("[warn] {}", format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        eprintln!("[error] {}", format_args!($($arg)*));
    };
}

pub mod core;

// Re-export everything from core for ergonomic library use
// Users can write `pipeup::source` instead of `pipeup::core::source`
pub use core::*;
