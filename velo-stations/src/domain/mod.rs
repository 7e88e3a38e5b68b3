//! Domain types for bike-share stations.
//!
//! These are the validated types the state layer works with. Wire formats
//! never leak past the data source; everything here is independent of how
//! the upstream API spells its fields.

mod number;
mod position;
mod station;

pub use number::{InvalidStationNumber, StationNumber};
pub use position::Position;
pub use station::{Availabilities, Stands, Station, StationStatus};

#[cfg(test)]
pub(crate) use station::fixtures;
