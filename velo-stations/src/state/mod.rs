//! Station list state: snapshot, view settings and derived views.
//!
//! [`StationStateManager`] is the single owner of the station list shown by
//! every screen. It fetches from a [`StationSource`](crate::jcdecaux::StationSource),
//! persists user settings through [`Preferences`](crate::preferences::Preferences)
//! and publishes [`StationViews`] on a watch channel.

mod config;
mod manager;
mod refresh;
mod sort;
mod views;

pub use config::StationsConfig;
pub use manager::{RefreshRequest, StationStateManager, ViewsWatcher};
pub use sort::{
    InvalidSortKey, SortCriteria, SortField, SortOrder, compute_view, filter_by_query,
    normalize_query, sort_stations,
};
pub use views::StationViews;
