//! JCDecaux station API HTTP client.
//!
//! Fetches the live station list for one contract. Authentication is an
//! `apiKey` query parameter; the contract is fixed at construction.

use crate::domain::{Station, StationNumber};

use super::convert::{convert_station, convert_stations};
use super::error::JcDecauxError;
use super::types::StationDto;

/// Default base URL for the JCDecaux API.
const DEFAULT_BASE_URL: &str = "https://api.jcdecaux.com";

/// Default contract (network/city) name.
pub const DEFAULT_CONTRACT: &str = "besancon";

/// Path of the station collection, relative to the base URL.
const STATIONS_PATH: &str = "vls/v1/stations";

/// Configuration for the JCDecaux client.
#[derive(Debug, Clone)]
pub struct JcDecauxConfig {
    /// API key sent as the `apiKey` query parameter
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Contract whose stations are fetched
    pub contract: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl JcDecauxConfig {
    /// Create a new config with the given API key and default contract.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            contract: DEFAULT_CONTRACT.to_string(),
            timeout_secs: 30,
        }
    }

    /// Create a config from the API key baked in at build time, if any.
    pub fn from_build_env() -> Option<Self> {
        option_env!("JCDECAUX_API_KEY")
            .filter(|key| !key.is_empty())
            .map(Self::new)
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the contract name.
    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = contract.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// JCDecaux station API client.
#[derive(Debug, Clone)]
pub struct JcDecauxClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    contract: String,
}

impl JcDecauxClient {
    /// Create a new client with the given configuration.
    pub fn new(config: JcDecauxConfig) -> Result<Self, JcDecauxError> {
        if config.contract.trim().is_empty() {
            return Err(JcDecauxError::Config("contract must not be empty".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            contract: config.contract,
        })
    }

    /// The contract this client fetches.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Fetch every station of the contract.
    pub async fn fetch_all(&self) -> Result<Vec<Station>, JcDecauxError> {
        let url = format!("{}/{}", self.base_url, STATIONS_PATH);
        let body = self.get(&url, None).await?;

        let dtos: Vec<StationDto> = parse_json(&body)?;
        Ok(convert_stations(dtos))
    }

    /// Fetch a single station by number.
    pub async fn fetch_one(&self, number: StationNumber) -> Result<Station, JcDecauxError> {
        let url = format!("{}/{}/{}", self.base_url, STATIONS_PATH, number);
        let body = self.get(&url, Some(number)).await?;

        let dto: StationDto = parse_json(&body)?;
        convert_station(dto).map_err(|e| JcDecauxError::Json {
            message: e.to_string(),
            body: None,
        })
    }

    /// Issue an authenticated GET and return the body of a 2xx response.
    async fn get(&self, url: &str, number: Option<StationNumber>) -> Result<String, JcDecauxError> {
        let response = self
            .http
            .get(url)
            .query(&[
                ("contract", self.contract.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(JcDecauxError::Unauthorized);
        }

        if status == reqwest::StatusCode::NOT_FOUND
            && let Some(number) = number
        {
            return Err(JcDecauxError::StationNotFound(number.get()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JcDecauxError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text().await?)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, JcDecauxError> {
    serde_json::from_str(body).map_err(|e| JcDecauxError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(500).collect()),
    })
}
