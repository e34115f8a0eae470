pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::SizeOptions;
pub use error::{Result, SizeError};
pub use models::{Contents, FileObject, SizeReport, SizeValue};
pub use services::gzip::{FlateGzipSizer, GzipSizer};
pub use services::stage::{SizeCallback, SizeStage, report_line};
pub use utils::filesize::{Base, FormatOptions, format_exact, format_size, format_value};

/// Creates a stage with the given options and optional callback.
pub fn create_stage(options: Option<SizeOptions>, callback: Option<SizeCallback>) -> SizeStage {
    let stage = SizeStage::new(options.unwrap_or_default());
    match callback {
        Some(callback) => stage.with_callback(callback),
        None => stage,
    }
}
