use crate::config::SizeOptions;
use crate::error::{Result, SizeError};
use crate::models::{Contents, FileObject, SizeReport, SizeValue};
use crate::services::gzip::{FlateGzipSizer, GzipSizer};
use crate::utils::filesize::format_size;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub type SizeCallback = Box<dyn FnMut(&SizeReport) + Send>;

/// Pipeline stage that prints the size of every file passing through it.
///
/// Files are forwarded unchanged, except that streamed contents are
/// materialized into a buffer so the size can be known.
pub struct SizeStage {
    options: Arc<SizeOptions>,
    sizer: Arc<dyn GzipSizer>,
    sink: Box<dyn Write + Send>,
    callback: Option<SizeCallback>,
}

/// A file whose contents have been read and measured, not yet reported.
struct Measured {
    file: FileObject,
    report: Option<SizeReport>,
}

impl SizeStage {
    pub fn new(options: SizeOptions) -> Self {
        Self {
            options: Arc::new(options),
            sizer: Arc::new(FlateGzipSizer::default()),
            sink: Box::new(std::io::stdout()),
            callback: None,
        }
    }

    /// Called once per measured file, after its line has been written.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&SizeReport) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Replaces stdout as the destination of report lines.
    pub fn with_sink<W>(mut self, sink: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_sizer(mut self, sizer: Arc<dyn GzipSizer>) -> Self {
        self.sizer = sizer;
        self
    }

    pub fn options(&self) -> &SizeOptions {
        &self.options
    }

    /// Measures, reports and forwards a single file.
    pub async fn process(&mut self, file: FileObject) -> Result<FileObject> {
        let measured = measure(file, self.options.clone(), self.sizer.clone()).await?;
        self.emit(measured)
    }

    /// Runs the stage over an upstream of files.
    ///
    /// Up to `options.concurrency` files are measured at once, but lines,
    /// callbacks and forwarded files keep input order. A failing file yields
    /// an `Err` in its place and the stream moves on to the next one.
    pub fn pipe<S>(self, upstream: S) -> BoxStream<'static, Result<FileObject>>
    where
        S: Stream<Item = FileObject> + Send + 'static,
    {
        let mut stage = self;
        let options = stage.options.clone();
        let sizer = stage.sizer.clone();
        let concurrency = options.concurrency.max(1);

        let measured = upstream
            .map(move |file| measure(file, options.clone(), sizer.clone()))
            .buffered(concurrency);

        async_stream::stream! {
            futures::pin_mut!(measured);
            while let Some(result) = measured.next().await {
                let item = result.and_then(|m| stage.emit(m));
                if let Err(e) = &item {
                    tracing::warn!("Skipping file: {}", e);
                }
                yield item;
            }
        }
        .boxed()
    }

    fn emit(&mut self, measured: Measured) -> Result<FileObject> {
        if let Some(report) = &measured.report {
            let line = report_line(report, self.options.title.as_deref());
            writeln!(self.sink, "{}", line)?;
            self.sink.flush()?;

            if let Some(callback) = self.callback.as_mut() {
                callback(report);
            }
        }
        Ok(measured.file)
    }
}

/// Formats the line printed for a report.
pub fn report_line(report: &SizeReport, title: Option<&str>) -> String {
    let mut line = match title {
        Some(title) => format!("{} {}: {}", title, report.filename, report.size),
        None => format!("{}: {}", report.filename, report.size),
    };
    if let Some(gzip) = &report.gzip {
        line.push_str(&format!(" (gzipped: {})", gzip));
    }
    line
}

async fn measure(
    file: FileObject,
    options: Arc<SizeOptions>,
    sizer: Arc<dyn GzipSizer>,
) -> Result<Measured> {
    let FileObject { path, contents } = file;

    let data = match contents {
        Contents::Absent => {
            tracing::debug!("No contents for {}, skipping", path.display());
            return Ok(Measured {
                file: FileObject::new(path, Contents::Absent),
                report: None,
            });
        }
        Contents::Buffer(data) => data,
        Contents::Stream(stream) => materialize(&path, stream).await?,
    };

    let size = size_value(data.len() as u64, &options);

    let gzip = if options.gzip {
        let compressed = sizer
            .compressed_len(data.clone())
            .await
            .map_err(|source| SizeError::Compression {
                path: path.display().to_string(),
                source,
            })?;
        Some(size_value(compressed, &options))
    } else {
        None
    };

    let file = FileObject::new(path, Contents::Buffer(data));
    tracing::debug!(
        "Measured {}: {} bytes{}",
        file.path.display(),
        file.buffer().map(|b| b.len()).unwrap_or_default(),
        gzip.as_ref()
            .map(|g| format!(", gzip {}", g))
            .unwrap_or_default()
    );

    Ok(Measured {
        report: Some(SizeReport {
            filename: file.file_name(),
            size,
            gzip,
        }),
        file,
    })
}

async fn materialize(
    path: &Path,
    mut stream: BoxStream<'static, std::io::Result<Bytes>>,
) -> Result<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| SizeError::Stream {
            path: path.display().to_string(),
            source,
        })?;
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

fn size_value(len: u64, options: &SizeOptions) -> SizeValue {
    if options.bytes {
        SizeValue::Bytes(len)
    } else {
        SizeValue::Human(format_size(len, &options.format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(gzip: Option<SizeValue>) -> SizeReport {
        SizeReport {
            filename: "example.js".to_string(),
            size: SizeValue::Human("1.23 kB".to_string()),
            gzip,
        }
    }

    #[test]
    fn test_report_line_plain() {
        assert_eq!(report_line(&report(None), None), "example.js: 1.23 kB");
    }

    #[test]
    fn test_report_line_gzip_and_title() {
        let line = report_line(&report(Some(SizeValue::Bytes(30))), Some("dist"));
        assert_eq!(line, "dist example.js: 1.23 kB (gzipped: 30 B)");
    }

    #[test]
    fn test_size_value_modes() {
        let options = SizeOptions::default();
        assert_eq!(size_value(1234, &options).to_string(), "1.23 kB");

        let options = SizeOptions::default().with_bytes(true);
        assert_eq!(size_value(1234, &options), SizeValue::Bytes(1234));
    }

    #[tokio::test]
    async fn test_materialize_concatenates_chunks() {
        let stream = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ])
        .boxed();
        let data = materialize(Path::new("a.txt"), stream).await.unwrap();
        assert_eq!(&data[..], b"hello world");
    }

    #[tokio::test]
    async fn test_materialize_reports_read_error() {
        let stream = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("disk gone")),
        ])
        .boxed();
        let err = materialize(Path::new("a.txt"), stream).await.unwrap_err();
        assert!(matches!(err, SizeError::Stream { ref path, .. } if path == "a.txt"));
    }
}
