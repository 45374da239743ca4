//! Single-document JSON reads.

use crate::Result;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;

/// Reads a JSON document, returning `None` if the file does not exist.
///
/// An empty (or whitespace-only) file is also treated as absent, which is
/// what a freshly initialized repository contains.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or decoded.
pub async fn read_json_document<T, P>(path: P) -> Result<Option<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let content = match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        let value: Option<u32> = read_json_document(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn empty_file_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cycle.json");
        tokio::fs::write(&path, "\n").await.unwrap();

        let value: Option<u32> = read_json_document(&path).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cycle.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let result: Result<Option<u32>> = read_json_document(&path).await;
        assert!(matches!(result, Err(crate::Error::Json(_))));
    }
}
