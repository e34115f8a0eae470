use clap::Parser;
use dotenvy::dotenv;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use stream_size::utils::files::open_files;
use stream_size::{Base, SizeOptions, SizeStage};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Print the size of each file, optionally with its gzipped size.
#[derive(Parser, Debug)]
#[command(name = "stream-size", version)]
struct Args {
    /// Also report gzip-compressed size
    #[arg(long)]
    gzip: bool,

    /// Show exact byte counts instead of kB/MB
    #[arg(long)]
    bytes: bool,

    /// Unit base: 10 (kB, MB) or 2 (KiB, MiB)
    #[arg(long)]
    base: Option<u32>,

    /// Decimal places kept in human-readable sizes
    #[arg(long)]
    round: Option<u32>,

    /// Prefix for every report line
    #[arg(long)]
    title: Option<String>,

    /// Files measured at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Files to measure
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Args {
    fn into_options(self, mut options: SizeOptions) -> anyhow::Result<(SizeOptions, Vec<PathBuf>)> {
        options.gzip |= self.gzip;
        options.bytes |= self.bytes;
        if let Some(base) = self.base {
            options.format.base = Base::try_from(base)?;
        }
        if let Some(round) = self.round {
            options.format.round = round;
        }
        if let Some(concurrency) = self.concurrency {
            options.concurrency = concurrency.max(1);
        }
        if self.title.is_some() {
            options.title = self.title;
        }
        Ok((options, self.files))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Logs go to stderr; stdout only carries report lines.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stream_size=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (options, paths) = Args::parse().into_options(SizeOptions::from_env())?;
    info!(
        "Measuring {} file(s): gzip={}, bytes={}, base={:?}",
        paths.len(),
        options.gzip,
        options.bytes,
        options.format.base
    );

    let open_failures = Arc::new(AtomicUsize::new(0));
    let upstream = open_files(paths, open_failures.clone());

    let mut failures = 0usize;
    let mut output = SizeStage::new(options).pipe(upstream);
    while let Some(item) = output.next().await {
        if let Err(e) = item {
            error!("{}", e);
            failures += 1;
        }
    }
    failures += open_failures.load(Ordering::Relaxed);

    if failures > 0 {
        anyhow::bail!("{} file(s) could not be measured", failures);
    }
    Ok(())
}
