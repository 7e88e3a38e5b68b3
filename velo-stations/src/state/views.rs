//! The observable state published by the manager.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Position, Station, StationNumber};
use crate::resource::Resource;

use super::sort::{SortCriteria, SortField, SortOrder, compute_view};

/// One consistent snapshot of everything a station list screen shows.
///
/// Cloning is cheap: the station lists and sets are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct StationViews {
    /// Status of the most recent fetch.
    pub status: Resource<Arc<[Station]>>,
    /// The last successfully fetched list. Survives later `Loading` and
    /// `Error` states.
    pub snapshot: Arc<[Station]>,
    /// The snapshot after favorites-only, search and sort are applied.
    pub filtered: Arc<[Station]>,
    /// Favorite stations present in the snapshot, sorted like `filtered`.
    /// Never filtered by the search query.
    pub favorites: Arc<[Station]>,
    pub favorite_numbers: Arc<BTreeSet<StationNumber>>,
    pub large_tiles: Arc<BTreeSet<StationNumber>>,
    /// Raw query as entered. Matching trims and case-folds it.
    pub search_query: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub show_only_favorites: bool,
    pub user_location: Option<Position>,
    /// When the last successful fetch completed.
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl Default for StationViews {
    fn default() -> Self {
        let empty: Arc<[Station]> = Arc::from(Vec::new());
        Self {
            status: Resource::Loading,
            snapshot: empty.clone(),
            filtered: empty.clone(),
            favorites: empty,
            favorite_numbers: Arc::default(),
            large_tiles: Arc::default(),
            search_query: String::new(),
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            show_only_favorites: false,
            user_location: None,
            last_refreshed: None,
        }
    }
}

impl StationViews {
    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    /// Message of the most recent failed fetch, if it failed.
    pub fn error_message(&self) -> Option<&str> {
        self.status.error_message()
    }

    pub fn is_favorite(&self, number: StationNumber) -> bool {
        self.favorite_numbers.contains(&number)
    }

    pub fn is_large_tile(&self, number: StationNumber) -> bool {
        self.large_tiles.contains(&number)
    }

    /// Look up a station in the last good snapshot.
    pub fn station(&self, number: StationNumber) -> Option<&Station> {
        self.snapshot.iter().find(|s| s.number == number)
    }

    /// The favorites view narrowed by a query local to the favorites screen.
    ///
    /// Independent of `search_query`.
    pub fn favorites_matching(&self, query: &str) -> Vec<Station> {
        compute_view(&self.favorites, None, query, &self.criteria())
    }

    /// Newest upstream update time across the snapshot.
    pub fn data_updated_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.iter().filter_map(Station::last_update_time).max()
    }

    pub fn criteria(&self) -> SortCriteria {
        SortCriteria {
            field: self.sort_field,
            order: self.sort_order,
            location: self.user_location,
        }
    }

    /// Recompute the filtered list from the current snapshot and criteria.
    pub(crate) fn recompute_filtered(&mut self) {
        let restrict_to = self.show_only_favorites.then_some(&*self.favorite_numbers);
        let view = compute_view(&self.snapshot, restrict_to, &self.search_query, &self.criteria());
        self.filtered = Arc::from(view);
    }

    /// Recompute the favorites list from the current snapshot and criteria.
    pub(crate) fn recompute_favorites(&mut self) {
        let view = compute_view(&self.snapshot, Some(&self.favorite_numbers), "", &self.criteria());
        self.favorites = Arc::from(view);
    }

    pub(crate) fn recompute_all(&mut self) {
        self.recompute_filtered();
        self.recompute_favorites();
    }
}
