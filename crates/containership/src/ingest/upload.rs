// crates/containership/src/ingest/upload.rs
// Upload payload and its pre-flight identity check

use crate::error::{ContainershipError, Result};
use std::borrow::Cow;
use std::path::Path;

/// A file to be analyzed: its name and raw contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    name: String,
    contents: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }

    /// Read a file from disk, named after its final path component
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ContainershipError::Validation(format!("{} is not a file path", path.display())))?;
        let contents = tokio::fs::read(path).await?;
        Ok(Self::new(name, contents))
    }

    /// Exact, case-sensitive file name check. Runs before any request.
    pub fn validate(&self, expected_name: &str) -> Result<()> {
        if self.name != expected_name {
            return Err(ContainershipError::Validation(format!(
                "please upload a file named '{}' (got '{}')",
                expected_name, self.name
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }
}
