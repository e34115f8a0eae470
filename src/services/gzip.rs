use anyhow::{Context, Result};
use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

/// Computes the gzip-compressed length of a buffer.
#[async_trait::async_trait]
pub trait GzipSizer: Send + Sync {
    async fn compressed_len(&self, data: Bytes) -> Result<u64>;
}

/// Gzip sizer backed by flate2.
///
/// Compression runs on the blocking pool so large files do not stall the
/// runtime's worker threads.
pub struct FlateGzipSizer {
    level: Compression,
}

impl FlateGzipSizer {
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for FlateGzipSizer {
    fn default() -> Self {
        Self {
            level: Compression::best(),
        }
    }
}

#[async_trait::async_trait]
impl GzipSizer for FlateGzipSizer {
    async fn compressed_len(&self, data: Bytes) -> Result<u64> {
        let level = self.level;
        tokio::task::spawn_blocking(move || gzip_len(&data, level))
            .await
            .context("gzip task panicked")?
    }
}

pub fn gzip_len(data: &[u8], level: Compression) -> Result<u64> {
    let mut encoder = GzEncoder::new(Vec::new(), level);
    encoder
        .write_all(data)
        .context("failed to compress content")?;
    let compressed = encoder
        .finish()
        .context("failed to finalize compression")?;
    Ok(compressed.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10-byte header + 8-byte trailer
    const GZIP_OVERHEAD: u64 = 18;

    #[test]
    fn test_gzip_len_empty() {
        let len = gzip_len(b"", Compression::best()).unwrap();
        assert!(len >= GZIP_OVERHEAD);
    }

    #[test]
    fn test_gzip_len_repetitive_content_shrinks() {
        let content = "test ".repeat(1000);
        let len = gzip_len(content.as_bytes(), Compression::best()).unwrap();
        assert!(len < content.len() as u64);
        assert!(len > GZIP_OVERHEAD);
    }

    #[tokio::test]
    async fn test_flate_sizer_zero_buffer() {
        let sizer = FlateGzipSizer::default();
        let len = sizer
            .compressed_len(Bytes::from(vec![0u8; 1234]))
            .await
            .unwrap();
        assert!(len > GZIP_OVERHEAD && len < 64, "unexpected gzip size {}", len);
    }

    #[tokio::test]
    async fn test_flate_sizer_level_clamped() {
        let sizer = FlateGzipSizer::new(42);
        let len = sizer
            .compressed_len(Bytes::from_static(b"hello hello hello"))
            .await
            .unwrap();
        assert!(len > 0);
    }
}
