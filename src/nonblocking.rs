//! Engine operations on tokio's blocking pool.
//!
//! Requires a tokio runtime. Each call runs on its own blocking worker; the
//! caller still has to keep at most one operation in flight per document.

use crate::error::{Error, Result};
use crate::model::{DocumentMetadata, ModificationSettings};
use std::io;
use std::path::PathBuf;
use tokio::task::{self, JoinError};

fn join_error(err: JoinError) -> Error {
    Error::Io(io::Error::other(err))
}

/// Async form of [`crate::inspect`].
pub async fn inspect(path: impl Into<PathBuf>) -> Result<DocumentMetadata> {
    let path = path.into();
    task::spawn_blocking(move || crate::inspect(path))
        .await
        .map_err(join_error)?
}

/// Async form of [`crate::apply`].
pub async fn apply(metadata: DocumentMetadata, settings: ModificationSettings) -> Result<PathBuf> {
    task::spawn_blocking(move || crate::apply(metadata, &settings))
        .await
        .map_err(join_error)?
}
