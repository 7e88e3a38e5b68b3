//! Conversion from JCDecaux DTOs to domain types.
//!
//! This is the only place that knows which wire generation a station came
//! from. The state layer only ever sees `domain::Station`.

use std::collections::HashSet;

use tracing::warn;

use crate::domain::{Availabilities, Position, Stands, Station, StationNumber, StationStatus};

use super::types::{AvailabilitiesDto, StandsDto, StationDto};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// Neither nested nor flat stand counts were present
    #[error("station {0} has no stand information")]
    MissingStands(u32),

    /// Coordinates outside WGS84 bounds
    #[error("station {number} has invalid position ({latitude}, {longitude})")]
    InvalidPosition {
        number: u32,
        latitude: f64,
        longitude: f64,
    },
}

/// Convert a full station list.
///
/// Invalid stations are logged and skipped rather than failing the whole
/// list. A station number seen twice keeps its first occurrence.
pub fn convert_stations(dtos: Vec<StationDto>) -> Vec<Station> {
    let mut seen = HashSet::with_capacity(dtos.len());
    let mut stations = Vec::with_capacity(dtos.len());

    for dto in dtos {
        let number = dto.number;
        match convert_station(dto) {
            Ok(station) => {
                if seen.insert(station.number) {
                    stations.push(station);
                } else {
                    warn!(station = number, "Duplicate station number, skipping");
                }
            }
            Err(e) => {
                warn!(station = number, error = %e, "Skipping invalid station");
            }
        }
    }

    stations
}

/// Convert a single station.
pub fn convert_station(dto: StationDto) -> Result<Station, ConversionError> {
    let position = convert_position(&dto)?;
    let (total_stands, main_stands) = convert_stands(&dto)?;
    let last_update = dto.last_update.as_ref().map(parse_last_update).unwrap_or(0);

    Ok(Station {
        number: StationNumber::new(dto.number),
        name: dto.name,
        address: dto.address,
        position,
        banking: dto.banking,
        bonus: dto.bonus,
        connected: dto.connected.unwrap_or(true),
        overflow: dto.overflow.unwrap_or(false),
        status: StationStatus::parse(&dto.status),
        contract_name: dto.contract_name,
        last_update,
        total_stands,
        main_stands,
    })
}

fn convert_position(dto: &StationDto) -> Result<Position, ConversionError> {
    let p = dto.position;
    if !(-90.0..=90.0).contains(&p.latitude) || !(-180.0..=180.0).contains(&p.longitude) {
        return Err(ConversionError::InvalidPosition {
            number: dto.number,
            latitude: p.latitude,
            longitude: p.longitude,
        });
    }
    Ok(Position::new(p.latitude, p.longitude))
}

/// Returns `(total_stands, main_stands)`.
fn convert_stands(dto: &StationDto) -> Result<(Stands, Stands), ConversionError> {
    if let Some(total) = dto.total_stands {
        let total = stands_from_nested(total);
        let main = dto.main_stands.map(stands_from_nested).unwrap_or(total);
        return Ok((total, main));
    }

    match (dto.bike_stands, dto.available_bike_stands, dto.available_bikes) {
        (None, None, None) => Err(ConversionError::MissingStands(dto.number)),
        (capacity, stands, bikes) => {
            let bikes = bikes.unwrap_or(0);
            // The flat generation predates electrical bikes.
            let stands = Stands {
                capacity: capacity.unwrap_or(0),
                availabilities: Availabilities {
                    bikes,
                    stands: stands.unwrap_or(0),
                    mechanical_bikes: bikes,
                    ..Availabilities::default()
                },
            };
            Ok((stands, stands))
        }
    }
}

fn stands_from_nested(dto: StandsDto) -> Stands {
    Stands {
        capacity: dto.capacity,
        availabilities: availabilities_from_nested(dto.availabilities),
    }
}

fn availabilities_from_nested(dto: AvailabilitiesDto) -> Availabilities {
    Availabilities {
        bikes: dto.bikes,
        stands: dto.stands,
        mechanical_bikes: dto.mechanical_bikes,
        electrical_bikes: dto.electrical_bikes,
        electrical_internal_battery_bikes: dto.electrical_internal_battery_bikes,
        electrical_removable_battery_bikes: dto.electrical_removable_battery_bikes,
    }
}

/// Parse `last_update` as milliseconds since epoch.
///
/// Accepts a JSON number, a numeric string, or an ISO-8601 datetime.
/// Anything else yields 0.
fn parse_last_update(value: &serde_json::Value) -> i64 {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    chrono::DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.timestamp_millis())
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}
