use crate::models::FileObject;
use anyhow::{Context, Result};
use futures::stream::{self, Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::io::ReaderStream;

/// Opens a single path as a streamed [`FileObject`]. Directories become
/// objects without contents; nothing below them is visited.
pub async fn open_file(path: &Path) -> Result<FileObject> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("failed to stat {}", path.display()))?;

    if metadata.is_dir() {
        return Ok(FileObject::directory(path));
    }

    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;

    Ok(FileObject::from_stream(path, ReaderStream::new(file)))
}

/// Turns a list of paths into an upstream of files.
///
/// A path is opened only when the stream is polled for it, so at most as many
/// handles are open as the consumer has pulled. Paths that cannot be opened
/// are logged, counted in `failures` and left out.
pub fn open_files(
    paths: Vec<PathBuf>,
    failures: Arc<AtomicUsize>,
) -> impl Stream<Item = FileObject> + Send + 'static {
    stream::iter(paths).filter_map(move |path| {
        let failures = failures.clone();
        async move {
            match open_file(&path).await {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::error!("{:#}", e);
                    failures.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_open_regular_file_as_stream() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();

        let file = open_file(tmp.path()).await.unwrap();
        assert!(file.is_stream());
        assert_eq!(file.path, tmp.path());
    }

    #[tokio::test]
    async fn test_open_directory_has_no_contents() {
        let dir = tempfile::tempdir().unwrap();
        let file = open_file(dir.path()).await.unwrap();
        assert!(file.is_null());
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_file(&dir.path().join("missing.txt")).await.is_err());
    }

    #[tokio::test]
    async fn test_open_files_opens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let late = dir.path().join("late.txt");
        let failures = Arc::new(AtomicUsize::new(0));

        // Nothing is opened when the stream is built, so a file created
        // afterwards is still picked up.
        let upstream = open_files(vec![late.clone()], failures.clone());
        std::fs::write(&late, b"created after").unwrap();

        let files: Vec<FileObject> = upstream.collect().await;
        assert_eq!(files.len(), 1);
        assert!(files[0].is_stream());
        assert_eq!(failures.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_open_files_skips_and_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, b"abc").unwrap();
        let failures = Arc::new(AtomicUsize::new(0));

        let files: Vec<FileObject> = open_files(
            vec![dir.path().join("missing.txt"), present.clone(), dir.path().to_path_buf()],
            failures.clone(),
        )
        .collect()
        .await;

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, present);
        assert!(files[1].is_null());
        assert_eq!(failures.load(Ordering::Relaxed), 1);
    }
}
