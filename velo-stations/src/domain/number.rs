//! Station number type.

use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an invalid station number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station number: {reason}")]
pub struct InvalidStationNumber {
    reason: &'static str,
}

/// Identifier of a rental station within a contract.
///
/// Station numbers are stable across fetches and are the join key between
/// a snapshot and the persisted favorite / large-tile sets.
///
/// # Examples
///
/// ```
/// use velo_stations::domain::StationNumber;
///
/// let n: StationNumber = "42".parse().unwrap();
/// assert_eq!(n.get(), 42);
///
/// // Negative and non-numeric values are rejected
/// assert!("-1".parse::<StationNumber>().is_err());
/// assert!("abc".parse::<StationNumber>().is_err());
/// ```
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct StationNumber(u32);

impl StationNumber {
    /// Wrap a raw station number.
    pub const fn new(n: u32) -> Self {
        Self(n)
    }

    /// Returns the raw number.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for StationNumber {
    type Err = InvalidStationNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InvalidStationNumber {
                reason: "must not be empty",
            });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidStationNumber {
                reason: "must be decimal digits only",
            });
        }
        s.parse::<u32>().map(Self).map_err(|_| InvalidStationNumber {
            reason: "out of range",
        })
    }
}

impl From<u32> for StationNumber {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

impl fmt::Debug for StationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationNumber({})", self.0)
    }
}

impl fmt::Display for StationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
