//! Mock station source for testing without API access.
//!
//! Serves scripted responses in order, then repeats a fallback response.
//! Can be loaded from a JSON payload in the same shape the live API
//! returns, and can hold each fetch until released.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use crate::domain::{Station, StationNumber};
use crate::resource::Resource;

use super::convert::convert_stations;
use super::error::JcDecauxError;
use super::source::StationSource;
use super::types::StationDto;

/// Mock station source.
#[derive(Clone)]
pub struct MockStationSource {
    inner: Arc<MockInner>,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

struct MockInner {
    /// Responses served once each, front first.
    scripted: Mutex<VecDeque<Resource<Vec<Station>>>>,
    /// Served when the script is exhausted.
    fallback: Mutex<Resource<Vec<Station>>>,
    calls: AtomicUsize,
}

impl MockStationSource {
    /// A source that always returns `stations`.
    pub fn new(stations: Vec<Station>) -> Self {
        Self::build(Resource::Success(stations))
    }

    /// A source that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::build(Resource::Error(message.into()))
    }

    /// Parse a station list payload in the live API shape.
    pub fn from_json(json: &str) -> Result<Self, JcDecauxError> {
        let dtos: Vec<StationDto> = serde_json::from_str(json).map_err(|e| JcDecauxError::Json {
            message: e.to_string(),
            body: None,
        })?;
        Ok(Self::new(convert_stations(dtos)))
    }

    /// Load a station list payload from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, JcDecauxError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            JcDecauxError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Sleep for `delay` before answering each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait for `gate` to be notified before answering each fetch.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn build(fallback: Resource<Vec<Station>>) -> Self {
        Self {
            inner: Arc::new(MockInner {
                scripted: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(fallback),
                calls: AtomicUsize::new(0),
            }),
            delay: None,
            gate: None,
        }
    }

    /// Queue a response to be served before the fallback.
    pub async fn push_response(&self, response: Resource<Vec<Station>>) {
        self.inner.scripted.lock().await.push_back(response);
    }

    /// Replace the fallback response.
    pub async fn set_stations(&self, stations: Vec<Station>) {
        *self.inner.fallback.lock().await = Resource::Success(stations);
    }

    /// Make every subsequent fallback fetch fail.
    pub async fn set_failing(&self, message: impl Into<String>) {
        *self.inner.fallback.lock().await = Resource::Error(message.into());
    }

    /// Number of fetches served so far (list and single).
    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Resource<Vec<Station>> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(response) = self.inner.scripted.lock().await.pop_front() {
            return response;
        }
        self.inner.fallback.lock().await.clone()
    }
}

impl StationSource for MockStationSource {
    async fn fetch_stations(&self) -> Resource<Vec<Station>> {
        self.answer().await
    }

    async fn fetch_station(&self, number: StationNumber) -> Resource<Station> {
        match self.answer().await {
            Resource::Success(stations) => stations
                .into_iter()
                .find(|s| s.number == number)
                .map(Resource::Success)
                .unwrap_or_else(|| Resource::Error(format!("station {number} not found"))),
            Resource::Error(message) => Resource::Error(message),
            Resource::Loading => Resource::Loading,
        }
    }
}
