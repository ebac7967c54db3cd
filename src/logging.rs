use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{prelude::*, EnvFilter, Layer, Registry};

use crate::errors::{ConvertError, Result};

/// Name of the log file created inside the configured log directory.
pub const LOG_FILE_NAME: &str = "hierarchy-to-rdf.log";

pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Initialize logging.  `RUST_LOG` picks the filter when it is set and
/// non-empty, otherwise everything at `info` and above is logged.  Logs always
/// go to stderr; when `log_dir` is given they are also appended to
/// `<log_dir>/hierarchy-to-rdf.log`.
pub fn init_logging(log_dir: Option<&Path>) -> Result<()> {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(rustlog) if !rustlog.is_empty() => EnvFilter::try_new(&rustlog)
            .map_err(|err| ConvertError::Config(format!("bad RUST_LOG: {}", err)))?,
        _ => EnvFilter::new("info"),
    };

    let mut layers = Vec::new();
    layers.push(
        tracing_subscriber::fmt::layer()
            .compact()
            // Mostly read in terminals and CI logs where ANSI is noise.
            .with_ansi(false)
            .without_time()
            .with_writer(std::io::stderr)
            .boxed(),
    );

    if let Some(log_dir) = log_dir {
        std::fs::create_dir_all(log_dir).map_err(|err| ConvertError::io(log_dir, err))?;
        let path = log_file_path(log_dir);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| ConvertError::io(&path, err))?;
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed(),
        );
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|err| ConvertError::Config(format!("logging already initialized: {}", err)))
}
