// Locale-aware number helpers shared by the engine and presentation layer.

pub mod locale {
    use std::str::FromStr;
    use thiserror::Error;

    #[derive(Debug, Error, Clone, PartialEq)]
    #[error("failed to parse decimal '{input}' with separator '{separator}'")]
    pub struct ParseDecimalError {
        pub input: String,
        pub separator: char,
    }

    /// Parses a decimal written with the given decimal separator.
    ///
    /// The other of `.`/`,` is treated as a thousands separator and removed, so
    /// `"1.234,56"` with `','` and `"1,234.56"` with `'.'` both give `1234.56`.
    pub fn parse_decimal(s: &str, separator: char) -> Result<f64, ParseDecimalError> {
        let thousands = if separator == ',' { '.' } else { ',' };
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != thousands)
            .map(|c| if c == separator { '.' } else { c })
            .collect();

        match f64::from_str(&normalized) {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ParseDecimalError {
                input: s.to_string(),
                separator,
            }),
        }
    }

}
