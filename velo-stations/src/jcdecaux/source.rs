//! The station data source seam.

use std::future::Future;

use tracing::{debug, warn};

use crate::domain::{Station, StationNumber};
use crate::resource::Resource;

use super::client::JcDecauxClient;

/// Something that can fetch stations.
///
/// Implementations never fail with an error type: every failure is turned
/// into `Resource::Error` carrying a user-presentable message. This
/// abstraction allows the state layer to be tested with mock data.
pub trait StationSource: Send + Sync + 'static {
    /// Fetch the full station list.
    fn fetch_stations(&self) -> impl Future<Output = Resource<Vec<Station>>> + Send;

    /// Fetch a single station, for detail views.
    fn fetch_station(
        &self,
        number: StationNumber,
    ) -> impl Future<Output = Resource<Station>> + Send;
}

impl StationSource for JcDecauxClient {
    async fn fetch_stations(&self) -> Resource<Vec<Station>> {
        match self.fetch_all().await {
            Ok(stations) => {
                debug!(
                    contract = self.contract(),
                    count = stations.len(),
                    "Fetched stations"
                );
                Resource::Success(stations)
            }
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "Failed to fetch stations");
                Resource::Error(e.user_message())
            }
        }
    }

    async fn fetch_station(&self, number: StationNumber) -> Resource<Station> {
        match self.fetch_one(number).await {
            Ok(station) => Resource::Success(station),
            Err(e) => {
                warn!(station = %number, kind = %e.kind(), error = %e, "Failed to fetch station");
                Resource::Error(e.user_message())
            }
        }
    }
}
