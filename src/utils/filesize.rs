use crate::error::{Result, SizeError};
use serde::{Deserialize, Serialize};

const DECIMAL_UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const BINARY_UNITS: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// f64 carries about 17 significant digits; more decimals only add noise.
const MAX_ROUND: u32 = 17;

/// Unit system used for human-readable sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Base {
    /// Powers of 1000: kB, MB, GB
    #[default]
    Decimal,
    /// Powers of 1024: KiB, MiB, GiB
    Binary,
}

impl Base {
    fn ceil(self) -> f64 {
        match self {
            Base::Decimal => 1000.0,
            Base::Binary => 1024.0,
        }
    }

    fn units(self) -> &'static [&'static str; 9] {
        match self {
            Base::Decimal => &DECIMAL_UNITS,
            Base::Binary => &BINARY_UNITS,
        }
    }
}

impl TryFrom<u32> for Base {
    type Error = SizeError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            10 => Ok(Base::Decimal),
            2 => Ok(Base::Binary),
            other => Err(SizeError::InvalidOption {
                name: "base".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Display options forwarded to the formatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub base: Base,

    /// Decimal places kept after rounding (default: 2, capped at 17)
    pub round: u32,

    /// Text between the number and the unit (default: " ")
    pub spacer: String,

    /// Replacement for the decimal point, e.g. "," for some locales
    pub separator: Option<String>,

    /// Forces a fixed unit index (0 = B, 1 = kB/KiB, ...)
    pub exponent: Option<u32>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            base: Base::Decimal,
            round: 2,
            spacer: " ".to_string(),
            separator: None,
            exponent: None,
        }
    }
}

/// Renders an exact byte count, e.g. `1234 B`.
pub fn format_exact(bytes: u64) -> String {
    format!("{} B", bytes)
}

/// Converts a byte count into a human-readable string such as `1.23 kB`.
pub fn format_size(bytes: u64, options: &FormatOptions) -> String {
    render(bytes as f64, options)
}

/// Same as [`format_size`] for callers holding a float; rejects values that
/// cannot be a byte count.
pub fn format_value(value: f64, options: &FormatOptions) -> Result<String> {
    if !value.is_finite() || value < 0.0 {
        return Err(SizeError::InvalidSize {
            value: value.to_string(),
        });
    }
    Ok(render(value, options))
}

fn render(value: f64, options: &FormatOptions) -> String {
    let units = options.base.units();
    let max_exponent = (units.len() - 1) as i32;
    let ceil = options.base.ceil();
    let round = options.round.min(MAX_ROUND);

    let mut exponent = match options.exponent {
        Some(e) => e.min(max_exponent as u32) as i32,
        None if value > 0.0 => ((value.ln() / ceil.ln()).floor() as i32).clamp(0, max_exponent),
        None => 0,
    };

    let mut scaled = if exponent == 0 {
        value
    } else {
        value / ceil.powi(exponent)
    };
    let mut rounded = round_to(scaled, round);

    // 999_999 rounds to 1000 kB; promote to the next unit.
    if options.exponent.is_none() && rounded >= ceil && exponent < max_exponent {
        exponent += 1;
        scaled /= ceil;
        rounded = round_to(scaled, round);
    }

    if exponent == 0 {
        rounded = rounded.round();
    }

    let mut number = trim_decimal(format!("{:.*}", round as usize, rounded));
    if let Some(separator) = &options.separator {
        number = number.replacen('.', separator, 1);
    }

    format!("{}{}{}", number, options.spacer, units[exponent as usize])
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let shifted = value * factor;
    if !shifted.is_finite() {
        return value;
    }
    shifted.round() / factor
}

fn trim_decimal(number: String) -> String {
    if !number.contains('.') {
        return number;
    }
    number
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
