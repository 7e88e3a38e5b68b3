//! JCDecaux station API response DTOs.
//!
//! Two wire generations are accepted:
//!
//! - the nested one, where counts live under `total_stands` / `main_stands`
//!   → `availabilities`;
//! - the flat one, which only carries `bike_stands`,
//!   `available_bike_stands` and `available_bikes`.
//!
//! Field names are snake_case; camelCase spellings are accepted as aliases.
//! Everything that older payloads may omit is an `Option` or defaulted.

use serde::Deserialize;

/// One station as returned by `/vls/v1/stations`.
#[derive(Debug, Clone, Deserialize)]
pub struct StationDto {
    pub number: u32,

    pub name: String,

    #[serde(default)]
    pub address: String,

    pub position: PositionDto,

    #[serde(default)]
    pub banking: bool,

    #[serde(default)]
    pub bonus: bool,

    /// Absent in the flat generation.
    pub connected: Option<bool>,

    /// Not sent by every deployment.
    pub overflow: Option<bool>,

    /// `OPEN`, `CLOSED`, or anything else upstream invents.
    #[serde(default)]
    pub status: String,

    #[serde(default, alias = "contractName")]
    pub contract_name: String,

    /// Milliseconds since epoch as a number, or an ISO-8601 string.
    #[serde(default, alias = "lastUpdate")]
    pub last_update: Option<serde_json::Value>,

    // Nested generation
    #[serde(alias = "totalStands")]
    pub total_stands: Option<StandsDto>,

    #[serde(alias = "mainStands")]
    pub main_stands: Option<StandsDto>,

    // Flat generation
    #[serde(alias = "bikeStands")]
    pub bike_stands: Option<u32>,

    #[serde(alias = "availableBikeStands")]
    pub available_bike_stands: Option<u32>,

    #[serde(alias = "availableBikes")]
    pub available_bikes: Option<u32>,
}

/// Station coordinates.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PositionDto {
    #[serde(alias = "lat")]
    pub latitude: f64,

    #[serde(alias = "lng")]
    pub longitude: f64,
}

/// A stands group in the nested generation.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StandsDto {
    #[serde(default)]
    pub availabilities: AvailabilitiesDto,

    #[serde(default)]
    pub capacity: u32,
}

/// Availability counts in the nested generation.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AvailabilitiesDto {
    #[serde(default)]
    pub bikes: u32,

    #[serde(default)]
    pub stands: u32,

    #[serde(default, alias = "mechanicalBikes")]
    pub mechanical_bikes: u32,

    #[serde(default, alias = "electricalBikes")]
    pub electrical_bikes: u32,

    #[serde(
        default,
        alias = "electrical_internal_batteries",
        alias = "electricalInternalBatteryBikes"
    )]
    pub electrical_internal_battery_bikes: u32,

    #[serde(
        default,
        alias = "electrical_removable_batteries",
        alias = "electricalRemovableBatteryBikes"
    )]
    pub electrical_removable_battery_bikes: u32,
}
