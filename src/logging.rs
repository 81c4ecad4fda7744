//! Log setup. The stub is a GUI-subsystem process with no console, so events
//! go to a file in the temp directory unless it cannot be opened.
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "SITEWRAP_LOG";
pub const LOG_FILE_NAME: &str = "sitewrap-debug.log";

pub fn log_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging() {
    let file = OpenOptions::new().create(true).append(true).open(log_path());

    let installed = match file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(Mutex::new(file))
            .try_init()
            .is_ok(),
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!("Logging to {:?}", log_path());
    }
}
