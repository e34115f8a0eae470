use crate::utils::filesize::{Base, FormatOptions};
use serde::{Deserialize, Serialize};
use std::env;

/// Options for a size-reporting stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeOptions {
    /// Also measure gzip-compressed size (default: false)
    pub gzip: bool,

    /// Report exact byte counts instead of human-readable units (default: false)
    pub bytes: bool,

    /// Display options forwarded to the formatter
    pub format: FormatOptions,

    /// Files measured concurrently by `SizeStage::pipe` (default: 1)
    pub concurrency: usize,

    /// Prefix printed before each file name (default: none)
    pub title: Option<String>,
}

impl Default for SizeOptions {
    fn default() -> Self {
        Self {
            gzip: false,
            bytes: false,
            format: FormatOptions::default(),
            concurrency: 1,
            title: None,
        }
    }
}

impl SizeOptions {
    /// Load options from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let base = env::var("STREAM_SIZE_BASE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .and_then(|v| Base::try_from(v).ok())
            .unwrap_or(default.format.base);

        let round = env::var("STREAM_SIZE_ROUND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.format.round);

        Self {
            gzip: env::var("STREAM_SIZE_GZIP")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.gzip),

            bytes: env::var("STREAM_SIZE_BYTES")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.bytes),

            format: FormatOptions {
                base,
                round,
                ..default.format
            },

            concurrency: env::var("STREAM_SIZE_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.concurrency),

            title: env::var("STREAM_SIZE_TITLE")
                .ok()
                .filter(|v| !v.is_empty())
                .or(default.title),
        }
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn with_bytes(mut self, bytes: bool) -> Self {
        self.bytes = bytes;
        self
    }

    pub fn with_base(mut self, base: Base) -> Self {
        self.format.base = base;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value != "false" && value != "0" && !value.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SizeOptions::default();
        assert!(!options.gzip);
        assert!(!options.bytes);
        assert_eq!(options.format.base, Base::Decimal);
        assert_eq!(options.format.round, 2);
        assert_eq!(options.concurrency, 1);
        assert!(options.title.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let options = SizeOptions::default()
            .with_gzip(true)
            .with_bytes(true)
            .with_base(Base::Binary);
        assert!(options.gzip);
        assert!(options.bytes);
        assert_eq!(options.format.base, Base::Binary);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("FALSE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_options_deserialize_from_json() {
        let json = serde_json::json!({
            "gzip": true,
            "format": { "base": "Binary" },
            "concurrency": 4
        });
        let options: SizeOptions = serde_json::from_value(json).unwrap();
        assert!(options.gzip);
        assert!(!options.bytes);
        assert_eq!(options.format.base, Base::Binary);
        assert_eq!(options.format.round, 2);
        assert_eq!(options.concurrency, 4);
        assert!(options.title.is_none());
    }

    #[test]
    fn test_options_deserialize_empty_object() {
        let options: SizeOptions = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(options, SizeOptions::default());
    }
}
