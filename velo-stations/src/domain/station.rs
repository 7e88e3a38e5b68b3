//! Bike-share station snapshot types.

use std::fmt;

use super::number::StationNumber;
use super::position::Position;

/// Operating status reported by the network.
///
/// Upstream sends an open-ended string; anything other than `OPEN` or
/// `CLOSED` is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StationStatus {
    Open,
    Closed,
    Other(String),
}

impl StationStatus {
    /// Parse the upstream status string. Never fails.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "OPEN" => Self::Open,
            "CLOSED" => Self::Closed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the upstream representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Other(s) => s,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability counts for one group of stands.
///
/// The sub-counts are upstream data and are not cross-validated: `bikes`
/// need not equal `mechanical_bikes + electrical_bikes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availabilities {
    pub bikes: u32,
    pub stands: u32,
    pub mechanical_bikes: u32,
    pub electrical_bikes: u32,
    pub electrical_internal_battery_bikes: u32,
    pub electrical_removable_battery_bikes: u32,
}

/// A group of stands (all stands, or only the main ones) and what is
/// currently available in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stands {
    pub capacity: u32,
    pub availabilities: Availabilities,
}

/// A value snapshot of one rental station at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Unique within a snapshot; stable across fetches.
    pub number: StationNumber,
    pub name: String,
    pub address: String,
    pub position: Position,
    /// Payment terminal available.
    pub banking: bool,
    pub bonus: bool,
    pub connected: bool,
    pub overflow: bool,
    pub status: StationStatus,
    pub contract_name: String,
    /// Milliseconds since the Unix epoch; 0 when upstream sent nothing usable.
    pub last_update: i64,
    pub total_stands: Stands,
    pub main_stands: Stands,
}

impl Station {
    /// Availability counts over all stands.
    pub fn availabilities(&self) -> &Availabilities {
        &self.total_stands.availabilities
    }

    /// Case-insensitive substring match on name or address.
    ///
    /// `needle` must already be trimmed and lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.address.to_lowercase().contains(needle)
    }

    /// Upstream update time, if it is a valid timestamp.
    pub fn last_update_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if self.last_update <= 0 {
            return None;
        }
        chrono::DateTime::from_timestamp_millis(self.last_update)
    }
}
