//! JCDecaux self-service bike API client.
//!
//! This module is the station data source: it fetches the live station list
//! for one contract and translates it into domain types.
//!
//! Key characteristics of the API:
//! - Authentication is an `apiKey` query parameter, not a header
//! - Two incompatible wire generations exist (nested `total_stands` vs flat
//!   `available_bikes`); both are accepted and normalized here
//! - `last_update` is either epoch milliseconds or an ISO-8601 string

mod client;
mod convert;
mod error;
mod mock;
mod source;
mod types;

pub use client::{DEFAULT_CONTRACT, JcDecauxClient, JcDecauxConfig};
pub use convert::{ConversionError, convert_station, convert_stations};
pub use error::{FailureKind, JcDecauxError};
pub use mock::MockStationSource;
pub use source::StationSource;
pub use types::{AvailabilitiesDto, PositionDto, StandsDto, StationDto};
