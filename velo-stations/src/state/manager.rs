//! The station state manager.
//!
//! Owns the last good station snapshot, the user's view settings and the
//! derived views, and publishes a fresh [`StationViews`] on every change.
//!
//! All mutators except the fetches are synchronous: the published views
//! already reflect the change when the call returns. The fetches publish
//! twice, once for `Loading` and once with the outcome.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{Position, Station, StationNumber};
use crate::jcdecaux::StationSource;
use crate::preferences::{KeyValueStore, PreferenceError, Preferences, toggle};
use crate::resource::Resource;

use super::config::StationsConfig;
use super::refresh::AutoRefresh;
use super::sort::{SortField, SortOrder};
use super::views::StationViews;

/// Receiver half for observing the published views.
pub type ViewsWatcher = watch::Receiver<StationViews>;

/// Outcome of a user-requested refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRequest {
    /// The refresh ran.
    Refreshed,
    /// Too soon after the previous one; nothing was fetched.
    Throttled { retry_after: Duration },
}

/// Station list state shared by every screen.
///
/// Cheap to clone; clones share the same state. The background refresh
/// holds only a weak reference, so dropping the last clone stops it.
pub struct StationStateManager<S, K> {
    inner: Arc<Inner<S, K>>,
}

struct Inner<S, K> {
    source: S,
    preferences: Preferences<K>,
    config: StationsConfig,
    views: watch::Sender<StationViews>,
    auto_refresh: AutoRefresh,
    last_manual_refresh: Mutex<Option<Instant>>,
}

impl<S, K> Clone for StationStateManager<S, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: StationSource, K: KeyValueStore> StationStateManager<S, K> {
    /// Create a manager with default view settings and no stations.
    ///
    /// Call [`initialize`](Self::initialize) to restore persisted settings.
    pub fn new(source: S, store: K, config: StationsConfig) -> Self {
        let (views, _) = watch::channel(StationViews::default());
        Self {
            inner: Arc::new(Inner {
                source,
                preferences: Preferences::new(store),
                config,
                views,
                auto_refresh: AutoRefresh::default(),
                last_manual_refresh: Mutex::new(None),
            }),
        }
    }

    /// Restore sort criteria, favorites and tile sizes from preferences.
    pub fn initialize(&self) {
        let prefs = &self.inner.preferences;
        let sort_field = prefs.sort_field();
        let sort_order = prefs.sort_order();
        let favorites = prefs.favorite_stations();
        let large_tiles = prefs.large_tile_stations();

        info!(
            %sort_field,
            %sort_order,
            favorites = favorites.len(),
            large_tiles = large_tiles.len(),
            "Restored preferences"
        );

        self.inner.views.send_modify(|v| {
            v.sort_field = sort_field;
            v.sort_order = sort_order;
            v.favorite_numbers = Arc::new(favorites);
            v.large_tiles = Arc::new(large_tiles);
            v.recompute_all();
        });
    }

    /// Fetch the station list.
    ///
    /// Publishes `Loading` first; the derived views keep showing the previous
    /// snapshot until the fetch settles. A failure keeps the previous snapshot
    /// and only changes the status. Overlapping calls are allowed; the last
    /// one to settle wins.
    pub async fn load_stations(&self) {
        self.inner.views.send_modify(|v| v.status = Resource::Loading);

        let result = self.inner.source.fetch_stations().await;

        self.inner.views.send_modify(|v| match result {
            Resource::Success(stations) => {
                debug!(count = stations.len(), "Station snapshot replaced");
                let snapshot: Arc<[Station]> = Arc::from(stations);
                v.snapshot = snapshot.clone();
                v.status = Resource::Success(snapshot);
                v.last_refreshed = Some(Utc::now());
                v.recompute_all();
            }
            Resource::Error(message) => {
                info!(error = %message, "Station refresh failed, keeping previous snapshot");
                v.status = Resource::Error(message);
            }
            Resource::Loading => v.status = Resource::Loading,
        });
    }

    /// Fetch one station for a detail view, bypassing the snapshot.
    pub async fn station_details(&self, number: StationNumber) -> Resource<Station> {
        self.inner.source.fetch_station(number).await
    }

    /// A user-requested refresh, rate limited by the manual cooldown.
    ///
    /// Rejected requests are not queued.
    pub async fn request_refresh(&self) -> RefreshRequest {
        let cooldown = self.inner.config.manual_refresh_cooldown();
        {
            let mut last = self
                .inner
                .last_manual_refresh
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            if let Some(previous) = *last {
                let elapsed = now.duration_since(previous);
                if elapsed < cooldown {
                    let retry_after = cooldown - elapsed;
                    debug!(?retry_after, "Manual refresh throttled");
                    return RefreshRequest::Throttled { retry_after };
                }
            }
            *last = Some(now);
        }

        self.load_stations().await;
        RefreshRequest::Refreshed
    }

    /// Start the periodic refresh. A no-op if already running.
    ///
    /// The first refresh happens one period after the call. Must be called
    /// from within a Tokio runtime; returns whether a new loop was started.
    pub fn start_auto_refresh(&self) -> bool {
        let period = self.inner.config.refresh_interval();
        let weak = Arc::downgrade(&self.inner);

        let started = self.inner.auto_refresh.start(period, move || {
            let inner = weak.upgrade()?;
            Some(async move {
                debug!("Auto-refresh tick");
                StationStateManager { inner }.load_stations().await;
            })
        });

        if started {
            info!(period_secs = period.as_secs(), "Auto-refresh started");
        }
        started
    }

    /// Stop the periodic refresh. A no-op if not running; an in-flight
    /// refresh still completes.
    pub fn stop_auto_refresh(&self) -> bool {
        let stopped = self.inner.auto_refresh.stop();
        if stopped {
            info!("Auto-refresh stopped");
        }
        stopped
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.inner.auto_refresh.is_running()
    }

    /// Set the search query. Matching trims and case-folds it.
    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.inner.views.send_modify(|v| {
            v.search_query = query;
            v.recompute_filtered();
        });
    }

    /// Set and persist the sort field.
    pub fn set_sort_field(&self, field: SortField) {
        log_persist_failure("sort field", self.inner.preferences.set_sort_field(field));
        self.inner.views.send_modify(|v| {
            v.sort_field = field;
            v.recompute_all();
        });
    }

    /// Set and persist the sort order.
    pub fn set_sort_order(&self, order: SortOrder) {
        log_persist_failure("sort order", self.inner.preferences.set_sort_order(order));
        self.inner.views.send_modify(|v| {
            v.sort_order = order;
            v.recompute_all();
        });
    }

    /// Flip the favorites-only restriction on the filtered view.
    /// Returns the new setting. Not persisted.
    pub fn toggle_favorites_filter(&self) -> bool {
        let mut enabled = false;
        self.inner.views.send_modify(|v| {
            v.show_only_favorites = !v.show_only_favorites;
            enabled = v.show_only_favorites;
            v.recompute_filtered();
        });
        enabled
    }

    /// Flip favorite membership of `number` and persist it.
    /// Returns whether the station is now a favorite.
    pub fn toggle_favorite(&self, number: StationNumber) -> bool {
        let mut now_favorite = false;
        self.inner.views.send_modify(|v| {
            let mut favorites: BTreeSet<StationNumber> = (*v.favorite_numbers).clone();
            now_favorite = toggle(&mut favorites, number);
            log_persist_failure(
                "favorites",
                self.inner.preferences.set_favorite_stations(&favorites),
            );

            v.favorite_numbers = Arc::new(favorites);
            v.recompute_favorites();
            if v.show_only_favorites {
                v.recompute_filtered();
            }
        });
        debug!(station = %number, favorite = now_favorite, "Toggled favorite");
        now_favorite
    }

    /// Flip the large-tile display of `number` and persist it.
    /// Returns whether the station is now shown large.
    pub fn toggle_station_size(&self, number: StationNumber) -> bool {
        let mut now_large = false;
        self.inner.views.send_modify(|v| {
            let mut tiles: BTreeSet<StationNumber> = (*v.large_tiles).clone();
            now_large = toggle(&mut tiles, number);
            log_persist_failure(
                "tile sizes",
                self.inner.preferences.set_tile_size(number, now_large),
            );
            v.large_tiles = Arc::new(tiles);
        });
        now_large
    }

    /// Record the device location. Only affects proximity sorting.
    pub fn update_user_location(&self, location: Option<Position>) {
        self.inner.views.send_modify(|v| {
            v.user_location = location;
            v.recompute_all();
        });
    }

    /// Screen to restore on startup.
    pub fn last_screen(&self) -> String {
        self.inner.preferences.last_screen()
    }

    pub fn set_last_screen(&self, screen: &str) {
        log_persist_failure("last screen", self.inner.preferences.set_last_screen(screen));
    }

    /// A copy of the current views.
    pub fn views(&self) -> StationViews {
        self.inner.views.borrow().clone()
    }

    /// Observe the views. The receiver sees the current value immediately
    /// and is notified on every change.
    pub fn subscribe(&self) -> ViewsWatcher {
        self.inner.views.subscribe()
    }

    /// Look up a station in the last good snapshot.
    pub fn station(&self, number: StationNumber) -> Option<Station> {
        self.inner.views.borrow().station(number).cloned()
    }

    pub fn preferences(&self) -> &Preferences<K> {
        &self.inner.preferences
    }

    pub fn config(&self) -> &StationsConfig {
        &self.inner.config
    }
}

/// Persistence failures are not surfaced; the in-memory change stands.
fn log_persist_failure(what: &str, result: Result<(), PreferenceError>) {
    if let Err(e) = result {
        warn!(preference = what, error = %e, "Failed to persist preference");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::*;
    use crate::jcdecaux::MockStationSource;
    use crate::preferences::MemoryStore;
    use tokio::sync::Notify;

    type TestManager = StationStateManager<MockStationSource, MemoryStore>;

    fn n(x: u32) -> StationNumber {
        StationNumber::new(x)
    }

    fn numbers(stations: &[Station]) -> Vec<u32> {
        stations.iter().map(|s| s.number.get()).collect()
    }

    fn bike_stations() -> Vec<Station> {
        vec![
            with_bikes(station(10, "10 - Rue de la Gare"), 5, 0),
            with_bikes(station(20, "20 - Avenue Victor Hugo"), 0, 0),
            with_bikes(station(30, "30 - Place Pasteur"), 2, 0),
        ]
    }

    fn manager_with(source: MockStationSource, store: MemoryStore) -> TestManager {
        let manager = StationStateManager::new(source, store, StationsConfig::default());
        manager.initialize();
        manager
    }

    async fn loaded_manager() -> TestManager {
        let manager = manager_with(MockStationSource::new(bike_stations()), MemoryStore::new());
        manager.load_stations().await;
        manager
    }

    /// Store that rejects every write.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), PreferenceError> {
            Err(PreferenceError::Io {
                message: "read-only".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn starts_loading_with_empty_views() {
        let manager = manager_with(MockStationSource::new(bike_stations()), MemoryStore::new());
        let views = manager.views();

        assert!(views.is_loading());
        assert!(views.filtered.is_empty());
        assert!(views.last_refreshed.is_none());
    }

    #[tokio::test]
    async fn load_populates_views_sorted_by_number() {
        let manager = loaded_manager().await;
        let views = manager.views();

        assert!(views.status.is_success());
        assert_eq!(numbers(&views.filtered), vec![10, 20, 30]);
        assert!(views.favorites.is_empty());
        assert!(views.last_refreshed.is_some());
        assert!(views.data_updated_at().is_some());
    }

    #[tokio::test]
    async fn sort_by_mechanical_bikes() {
        let manager = loaded_manager().await;

        manager.set_sort_field(SortField::MechanicalBikes);
        assert_eq!(numbers(&manager.views().filtered), vec![20, 30, 10]);

        manager.set_sort_order(SortOrder::Descending);
        assert_eq!(numbers(&manager.views().filtered), vec![10, 30, 20]);

        let prefs = manager.preferences();
        assert_eq!(prefs.sort_field(), SortField::MechanicalBikes);
        assert_eq!(prefs.sort_order(), SortOrder::Descending);
    }

    #[tokio::test]
    async fn toggle_favorite_updates_views_and_store() {
        let manager = loaded_manager().await;

        assert!(manager.toggle_favorite(n(20)));
        let views = manager.views();
        assert_eq!(numbers(&views.favorites), vec![20]);
        assert!(views.is_favorite(n(20)));
        assert_eq!(
            manager.preferences().store().get("favorite_stations").as_deref(),
            Some("20")
        );

        assert!(!manager.toggle_favorite(n(20)));
        let views = manager.views();
        assert!(views.favorites.is_empty());
        assert_eq!(
            manager.preferences().store().get("favorite_stations").as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn search_filters_name_case_insensitively() {
        let manager = loaded_manager().await;
        manager.toggle_favorite(n(10));

        manager.set_search_query("avenue");
        let views = manager.views();
        assert_eq!(numbers(&views.filtered), vec![20]);
        // The favorites view ignores the search query
        assert_eq!(numbers(&views.favorites), vec![10]);

        manager.set_search_query("   ");
        assert_eq!(numbers(&manager.views().filtered), vec![10, 20, 30]);

        manager.set_search_query("nowhere");
        assert!(manager.views().filtered.is_empty());
    }

    #[tokio::test]
    async fn favorites_filter_restricts_and_tracks_toggles() {
        let manager = loaded_manager().await;
        manager.toggle_favorite(n(30));

        assert!(manager.toggle_favorites_filter());
        assert_eq!(numbers(&manager.views().filtered), vec![30]);

        manager.toggle_favorite(n(10));
        assert_eq!(numbers(&manager.views().filtered), vec![10, 30]);

        assert!(!manager.toggle_favorites_filter());
        assert_eq!(numbers(&manager.views().filtered), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn favorites_absent_from_snapshot_are_not_shown() {
        let store = MemoryStore::with_entries([("favorite_stations", "20,999")]);
        let manager = manager_with(MockStationSource::new(bike_stations()), store);
        manager.load_stations().await;

        let views = manager.views();
        assert_eq!(numbers(&views.favorites), vec![20]);
        assert!(views.is_favorite(n(999)));
    }

    #[tokio::test]
    async fn loading_keeps_previous_views() {
        let gate = Arc::new(Notify::new());
        let source = MockStationSource::new(bike_stations()).with_gate(gate.clone());
        let manager = manager_with(source.clone(), MemoryStore::new());

        gate.notify_one();
        manager.load_stations().await;
        manager.toggle_favorite(n(20));
        let before = manager.views();
        assert_eq!(numbers(&before.filtered), vec![10, 20, 30]);
        assert_eq!(numbers(&before.favorites), vec![20]);

        source.set_stations(vec![station(40, "40 - Chamars")]).await;
        let task = tokio::spawn({
            let manager = manager.clone();
            async move { manager.load_stations().await }
        });

        // Wait until the fetch is in flight
        let mut watcher = manager.subscribe();
        watcher.wait_for(|v| v.is_loading()).await.unwrap();

        let during = manager.views();
        assert_eq!(during.filtered, before.filtered);
        assert_eq!(during.favorites, before.favorites);
        assert!(!during.favorites.is_empty());
        assert_eq!(during.snapshot, before.snapshot);

        gate.notify_one();
        task.await.unwrap();

        let after = manager.views();
        assert!(after.status.is_success());
        assert_eq!(numbers(&after.filtered), vec![40]);
        assert!(after.favorites.is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_previous_snapshot() {
        let source = MockStationSource::new(bike_stations());
        let manager = manager_with(source.clone(), MemoryStore::new());
        manager.load_stations().await;
        let refreshed_at = manager.views().last_refreshed;

        source.set_failing("Network error").await;
        manager.load_stations().await;

        let views = manager.views();
        assert_eq!(views.error_message(), Some("Network error"));
        assert_eq!(numbers(&views.filtered), vec![10, 20, 30]);
        assert_eq!(views.last_refreshed, refreshed_at);
    }

    #[tokio::test]
    async fn failure_before_any_success_has_empty_views() {
        let manager = manager_with(MockStationSource::failing("Network error"), MemoryStore::new());
        manager.load_stations().await;

        let views = manager.views();
        assert!(views.status.is_error());
        assert!(views.filtered.is_empty());
        assert!(views.last_refreshed.is_none());
    }

    #[tokio::test]
    async fn corrupt_sort_preference_falls_back() {
        let store = MemoryStore::with_entries([("sort_field", "BY_VIBES"), ("sort_order", "UP")]);
        let manager = manager_with(MockStationSource::new(bike_stations()), store);

        let views = manager.views();
        assert_eq!(views.sort_field, SortField::Number);
        assert_eq!(views.sort_order, SortOrder::Ascending);
    }

    #[tokio::test]
    async fn initialize_restores_persisted_settings() {
        let store = MemoryStore::with_entries([
            ("sort_field", "NAME"),
            ("sort_order", "DESCENDING"),
            ("favorite_stations", "10"),
            ("large_tiles_stations", "30"),
        ]);
        let manager = manager_with(MockStationSource::new(bike_stations()), store);
        manager.load_stations().await;

        let views = manager.views();
        assert_eq!(views.sort_field, SortField::Name);
        assert_eq!(views.sort_order, SortOrder::Descending);
        assert_eq!(numbers(&views.filtered), vec![30, 20, 10]);
        assert_eq!(numbers(&views.favorites), vec![10]);
        assert!(views.is_large_tile(n(30)));
    }

    #[tokio::test]
    async fn proximity_uses_user_location() {
        let stations = vec![
            at(station(1, "far"), 47.30, 6.10),
            at(station(2, "near"), 47.2381, 6.0244),
        ];
        let manager = manager_with(MockStationSource::new(stations), MemoryStore::new());
        manager.load_stations().await;

        manager.set_sort_field(SortField::Proximity);
        manager.set_sort_order(SortOrder::Descending);
        // No location yet: snapshot order, reversed
        assert_eq!(numbers(&manager.views().filtered), vec![2, 1]);

        manager.set_sort_order(SortOrder::Ascending);
        manager.update_user_location(Some(Position::new(47.2380, 6.0243)));
        assert_eq!(numbers(&manager.views().filtered), vec![2, 1]);
    }

    #[tokio::test]
    async fn toggle_station_size_is_independent_of_favorites() {
        let manager = loaded_manager().await;

        assert!(manager.toggle_station_size(n(10)));
        let views = manager.views();
        assert!(views.is_large_tile(n(10)));
        assert!(!views.is_favorite(n(10)));
        assert!(manager.preferences().is_large_tile(n(10)));

        assert!(!manager.toggle_station_size(n(10)));
        assert!(!manager.views().is_large_tile(n(10)));
    }

    #[tokio::test]
    async fn persist_failure_keeps_in_memory_change() {
        let manager = StationStateManager::new(
            MockStationSource::new(bike_stations()),
            ReadOnlyStore,
            StationsConfig::default(),
        );
        manager.initialize();
        manager.load_stations().await;

        assert!(manager.toggle_favorite(n(20)));
        manager.set_sort_field(SortField::MechanicalBikes);

        let views = manager.views();
        assert_eq!(numbers(&views.favorites), vec![20]);
        assert_eq!(numbers(&views.filtered), vec![20, 30, 10]);
    }

    #[tokio::test]
    async fn last_screen_defaults_and_persists() {
        let manager = loaded_manager().await;
        assert_eq!(manager.last_screen(), "HOME");

        manager.set_last_screen("FAVORITES");
        assert_eq!(manager.last_screen(), "FAVORITES");
    }

    #[tokio::test]
    async fn station_lookup_and_details() {
        let manager = loaded_manager().await;

        assert_eq!(
            manager.station(n(20)).map(|s| s.name).as_deref(),
            Some("20 - Avenue Victor Hugo")
        );
        assert!(manager.station(n(99)).is_none());

        let details = manager.station_details(n(30)).await;
        assert_eq!(details.success().map(|s| s.number), Some(n(30)));
        assert!(manager.station_details(n(99)).await.is_error());
    }

    #[tokio::test]
    async fn subscribers_see_every_change() {
        let manager = loaded_manager().await;
        let mut watcher = manager.subscribe();
        assert!(!watcher.has_changed().unwrap());

        manager.set_search_query("gare");
        assert!(watcher.has_changed().unwrap());
        assert_eq!(numbers(&watcher.borrow_and_update().filtered), vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn request_refresh_is_throttled() {
        let source = MockStationSource::new(bike_stations());
        let manager = manager_with(source.clone(), MemoryStore::new());

        assert_eq!(manager.request_refresh().await, RefreshRequest::Refreshed);
        assert_eq!(source.call_count(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(
            manager.request_refresh().await,
            RefreshRequest::Throttled {
                retry_after: Duration::from_secs(10)
            }
        );
        assert_eq!(source.call_count(), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(manager.request_refresh().await, RefreshRequest::Refreshed);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_is_idempotent() {
        let source = MockStationSource::new(bike_stations());
        let manager = manager_with(source.clone(), MemoryStore::new());

        assert!(manager.start_auto_refresh());
        assert!(!manager.start_auto_refresh());
        assert!(manager.is_auto_refreshing());

        // Nothing at start, one fetch per period
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.call_count(), 0);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.call_count(), 1);
        assert!(manager.views().status.is_success());

        assert!(manager.stop_auto_refresh());
        assert!(!manager.stop_auto_refresh());
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_manager_stops_auto_refresh() {
        let source = MockStationSource::new(bike_stations());
        let manager = manager_with(source.clone(), MemoryStore::new());
        manager.start_auto_refresh();
        drop(manager);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.call_count(), 0);
    }
}
