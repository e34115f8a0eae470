use crate::utils::filesize::format_exact;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Content carried by a [`FileObject`].
pub enum Contents {
    /// No contents, e.g. a directory entry
    Absent,
    /// Complete in-memory buffer
    Buffer(Bytes),
    /// Incremental source, drained before measuring
    Stream(BoxStream<'static, std::io::Result<Bytes>>),
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Absent => f.write_str("Absent"),
            Contents::Buffer(buf) => f.debug_tuple("Buffer").field(&buf.len()).finish(),
            Contents::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// One unit flowing through a pipeline.
#[derive(Debug)]
pub struct FileObject {
    pub path: PathBuf,
    pub contents: Contents,
}

impl FileObject {
    pub fn new(path: impl Into<PathBuf>, contents: Contents) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }

    pub fn from_bytes(path: impl Into<PathBuf>, data: impl Into<Bytes>) -> Self {
        Self::new(path, Contents::Buffer(data.into()))
    }

    pub fn from_stream<S>(path: impl Into<PathBuf>, stream: S) -> Self
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        Self::new(path, Contents::Stream(stream.boxed()))
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Contents::Absent)
    }

    /// Basename used in reports. Falls back to the whole path when it has no
    /// final component (e.g. `..`).
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.contents, Contents::Absent)
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.contents, Contents::Buffer(_))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.contents, Contents::Stream(_))
    }

    /// Buffered contents, if already materialized.
    pub fn buffer(&self) -> Option<&Bytes> {
        match &self.contents {
            Contents::Buffer(buf) => Some(buf),
            _ => None,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// A measured size, either exact or human-readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Bytes(u64),
    Human(String),
}

impl SizeValue {
    /// Raw byte count when the value was produced in exact mode.
    pub fn as_bytes(&self) -> Option<u64> {
        match self {
            SizeValue::Bytes(n) => Some(*n),
            SizeValue::Human(_) => None,
        }
    }
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeValue::Bytes(n) => f.write_str(&format_exact(*n)),
            SizeValue::Human(s) => f.write_str(s),
        }
    }
}

/// Per-file measurement handed to callbacks.
///
/// `to_string()` gives the formatted size; the fields give named access to
/// the same data, so a callback can use whichever shape it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeReport {
    pub filename: String,
    pub size: SizeValue,
    pub gzip: Option<SizeValue>,
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.size, f)
    }
}
