//! File Origin
//!
//! The data source the server fronts: one file per key under a directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::cache::Loader;
use crate::error::BoxError;
use crate::models::validate_key;

/// Loads the value for `key` from the file `<root>/<key>`.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Loader<String, String> for FileLoader {
    async fn load(&self, key: &String) -> Result<String, BoxError> {
        if let Some(reason) = validate_key(key) {
            return Err(reason.into());
        }

        let path = self.root.join(key);
        debug!(path = %path.display(), "Reading origin file");
        let contents = tokio::fs::read_to_string(&path).await?;
        Ok(contents)
    }
}
