//! File logging. The TUI owns stderr, so tracing output goes to a file.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing::Level;

/// `<data_local_dir>/smartlife/smartlife.log`
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("smartlife").join("smartlife.log"))
}

/// Log to `explicit` if given, failing loudly when it can't be opened.
/// Otherwise try `fallback` and carry on without logging if that fails.
pub fn init_with_fallback(
    explicit: Option<&Path>,
    fallback: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    match (explicit, fallback) {
        (Some(path), _) => init(path, verbose),
        (None, Some(path)) => {
            let _ = init(&path, verbose);
            Ok(())
        }
        (None, None) => Ok(()),
    }
}

pub fn init(path: &Path, verbose: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| anyhow!("Could not start logging: {e}"))
}
