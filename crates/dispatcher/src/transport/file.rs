//! Append-only file transport

use std::io;
use tokio::fs::{File, OpenOptions};
use tracing::{debug, instrument};

/// Open for append, create if absent, write-only, owner read/write
#[instrument(name = "file_open_append")]
pub async fn open_append(path: &str) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    options.mode(0o600);

    let file = options.open(path).await?;
    debug!(path, "File opened for append");
    Ok(file)
}
