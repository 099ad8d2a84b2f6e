//! Journal entry numbering: `<PREFIX>-<YEAR>-<NNNN>`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error parsing an entry number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed entry number: {0}")]
pub struct EntryNumberError(String);

/// A company-scoped, year-scoped entry number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryNumber {
    /// Configured prefix, e.g. `JE`.
    pub prefix: String,
    /// Calendar year of the entry date.
    pub year: i32,
    /// 1-based sequence within the company and year.
    pub sequence: u64,
}

impl EntryNumber {
    /// The number following `existing_count` entries already in the year.
    #[must_use]
    pub fn next(prefix: &str, year: i32, existing_count: u64) -> Self {
        Self {
            prefix: prefix.to_string(),
            year,
            sequence: existing_count + 1,
        }
    }
}

impl fmt::Display for EntryNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:04}", self.prefix, self.year, self.sequence)
    }
}

impl FromStr for EntryNumber {
    type Err = EntryNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || EntryNumberError(s.to_string());

        let mut parts = s.rsplitn(3, '-');
        let sequence = parts.next().ok_or_else(malformed)?;
        let year = parts.next().ok_or_else(malformed)?;
        let prefix = parts.next().filter(|p| !p.is_empty()).ok_or_else(malformed)?;

        Ok(Self {
            prefix: prefix.to_string(),
            year: year.parse().map_err(|_| malformed())?,
            sequence: sequence.parse().map_err(|_| malformed())?,
        })
    }
}
