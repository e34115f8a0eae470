use thiserror::Error;

#[derive(Error, Debug)]
pub enum SizeError {
    #[error("Failed to compute gzip size of {path}: {source}")]
    Compression {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read stream contents of {path}: {source}")]
    Stream {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write size report: {0}")]
    Output(#[from] std::io::Error),

    #[error("Invalid byte count: {value}")]
    InvalidSize { value: String },

    #[error("Invalid option {name} = {value}")]
    InvalidOption { name: String, value: String },
}

pub type Result<T> = std::result::Result<T, SizeError>;
