//! Atomic write operations.
//!
//! Data is written to a sibling temporary file, flushed, and renamed over the
//! target. On POSIX systems a rename within one filesystem is atomic, so the
//! target is never observed half-written. A crash may leave the `.tmp` file
//! behind; the target stays intact.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Atomically writes an iterator of values to a JSONL file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, a value fails to
/// serialize, or the rename fails. The original file is left unchanged.
///
/// # Examples
///
/// ```no_run
/// use rollover_jsonl::write_jsonl_atomic;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ids = ["cycle-1", "cycle-2"];
/// write_jsonl_atomic("history.jsonl", ids.iter()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn write_jsonl_atomic<T, I, P>(path: P, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    let write_result = async {
        let file = File::create(&temp_path).await?;
        let mut writer = JsonlWriter::new(file);
        writer.write_all(values).await?;
        writer.flush().await?;
        Ok::<(), crate::Error>(())
    }
    .await;

    finish(path, &temp_path, write_result).await
}

/// Atomically writes a single value as a pretty-printed JSON document.
///
/// # Errors
///
/// See [`write_jsonl_atomic`].
pub async fn write_json_atomic<T, P>(path: P, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    let write_result = async {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        let mut file = File::create(&temp_path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok::<(), crate::Error>(())
    }
    .await;

    finish(path, &temp_path, write_result).await
}

/// Renames the temp file into place, or cleans it up on failure.
async fn finish(path: &Path, temp_path: &Path, write_result: Result<()>) -> Result<()> {
    if let Err(e) = write_result {
        let _ = tokio::fs::remove_file(temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(temp_path, path).await?;
    Ok(())
}

/// Creates the temporary path used for atomic writes.
///
/// `file.ext` becomes `file.ext.tmp`; `file` becomes `file.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Record {
        id: u32,
        name: String,
    }

    #[rstest]
    #[case::with_extension("/path/to/cycle.json", "/path/to/cycle.json.tmp")]
    #[case::without_extension("/path/to/cycle", "/path/to/cycle.tmp")]
    #[case::multiple_extensions("/path/to/history.jsonl.bak", "/path/to/history.jsonl.bak.tmp")]
    #[case::relative("history.jsonl", "history.jsonl.tmp")]
    fn make_temp_path_appends_tmp(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(make_temp_path(Path::new(input)), Path::new(expected));
    }

    #[tokio::test]
    async fn jsonl_write_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        tokio::fs::write(&path, "stale\n").await.unwrap();

        let records = [
            Record {
                id: 1,
                name: "Alice".to_string(),
            },
            Record {
                id: 2,
                name: "Bob".to_string(),
            },
        ];
        write_jsonl_atomic(&path, records.iter()).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            content,
            "{\"id\":1,\"name\":\"Alice\"}\n{\"id\":2,\"name\":\"Bob\"}\n"
        );
        assert!(!make_temp_path(&path).exists());
    }

    #[tokio::test]
    async fn json_document_write_is_readable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cycle.json");
        let record = Record {
            id: 7,
            name: "Carol".to_string(),
        };

        write_json_atomic(&path, &record).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let decoded: Record = serde_json::from_str(&content).unwrap();
        assert_eq!(decoded, record);
    }

    #[tokio::test]
    async fn failed_write_leaves_target_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("cycle.json");

        let result = write_json_atomic(&path, &1).await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
