//! Sorting and filtering of station lists.
//!
//! One pure function, [`compute_view`], produces both the filtered list and
//! the favorites list, so the two always share the same sort criteria.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::{Position, Station, StationNumber};

/// Error returned when parsing an unknown sort field or order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort {kind}: {value:?}")]
pub struct InvalidSortKey {
    kind: &'static str,
    value: String,
}

/// What a station list is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    #[default]
    Number,
    TotalBikes,
    MechanicalBikes,
    ElectricalBikes,
    AvailableStands,
    /// Great-circle distance from the user's location.
    Proximity,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Name,
        SortField::Number,
        SortField::TotalBikes,
        SortField::MechanicalBikes,
        SortField::ElectricalBikes,
        SortField::AvailableStands,
        SortField::Proximity,
    ];

    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "NAME",
            SortField::Number => "NUMBER",
            SortField::TotalBikes => "TOTAL_BIKES",
            SortField::MechanicalBikes => "MECHANICAL_BIKES",
            SortField::ElectricalBikes => "ELECTRICAL_BIKES",
            SortField::AvailableStands => "AVAILABLE_STANDS",
            SortField::Proximity => "PROXIMITY",
        }
    }
}

impl FromStr for SortField {
    type Err = InvalidSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| InvalidSortKey {
                kind: "field",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASCENDING",
            SortOrder::Descending => "DESCENDING",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl FromStr for SortOrder {
    type Err = InvalidSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASCENDING" => Ok(SortOrder::Ascending),
            "DESCENDING" => Ok(SortOrder::Descending),
            _ => Err(InvalidSortKey {
                kind: "order",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that decides the order of a view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SortCriteria {
    pub field: SortField,
    pub order: SortOrder,
    /// Required by `SortField::Proximity`; ignored otherwise.
    pub location: Option<Position>,
}

/// Trim and case-fold a search query for matching.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Keep stations whose name or address contains `query`, ignoring case.
///
/// An empty (or whitespace-only) query keeps everything.
pub fn filter_by_query(stations: &[Station], query: &str) -> Vec<Station> {
    let needle = normalize_query(query);
    stations
        .iter()
        .filter(|s| s.matches_query(&needle))
        .cloned()
        .collect()
}

/// Sort stations in place.
///
/// The sort is stable. `Descending` reverses the ascending result rather
/// than using a reversed comparator. `Proximity` without a location skips
/// the sort, so `Descending` then reverses the input order.
pub fn sort_stations(stations: &mut [Station], criteria: &SortCriteria) {
    let unsortable = criteria.field == SortField::Proximity && criteria.location.is_none();
    if !unsortable {
        stations.sort_by(|a, b| compare(a, b, criteria));
    }

    if criteria.order == SortOrder::Descending {
        stations.reverse();
    }
}

/// Ascending comparison on the sort field.
fn compare(a: &Station, b: &Station, criteria: &SortCriteria) -> Ordering {
    let (x, y) = (a.availabilities(), b.availabilities());
    match criteria.field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Number => a.number.cmp(&b.number),
        SortField::TotalBikes => x.bikes.cmp(&y.bikes),
        SortField::MechanicalBikes => x.mechanical_bikes.cmp(&y.mechanical_bikes),
        SortField::ElectricalBikes => x.electrical_bikes.cmp(&y.electrical_bikes),
        SortField::AvailableStands => x.stands.cmp(&y.stands),
        SortField::Proximity => match criteria.location {
            Some(origin) => origin
                .distance_to(&a.position)
                .total_cmp(&origin.distance_to(&b.position)),
            None => Ordering::Equal,
        },
    }
}

/// Derive one view from a snapshot.
///
/// 1. keep only stations in `restrict_to`, when given;
/// 2. keep only stations matching `query`, when non-empty;
/// 3. sort by `criteria`.
pub fn compute_view(
    snapshot: &[Station],
    restrict_to: Option<&BTreeSet<StationNumber>>,
    query: &str,
    criteria: &SortCriteria,
) -> Vec<Station> {
    let needle = normalize_query(query);

    let mut view: Vec<Station> = snapshot
        .iter()
        .filter(|s| restrict_to.is_none_or(|set| set.contains(&s.number)))
        .filter(|s| s.matches_query(&needle))
        .cloned()
        .collect();

    sort_stations(&mut view, criteria);
    view
}
