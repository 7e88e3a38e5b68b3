//! Typed preferences on top of a raw key-value store.

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::StationNumber;
use crate::state::{SortField, SortOrder};

use super::codec::{decode_set, encode_set};
use super::error::PreferenceError;
use super::store::KeyValueStore;

const SORT_FIELD_KEY: &str = "sort_field";
const SORT_ORDER_KEY: &str = "sort_order";
const FAVORITES_KEY: &str = "favorite_stations";
const LARGE_TILES_KEY: &str = "large_tiles_stations";
const LAST_SCREEN_KEY: &str = "last_screen";

/// Screen restored when nothing was saved.
pub const DEFAULT_SCREEN: &str = "HOME";

/// Typed access to the persisted user preferences.
///
/// Reads never fail. Unknown enum values fall back to `SortField::Number`
/// and `SortOrder::Ascending`; missing sets are empty.
#[derive(Debug)]
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sort_field(&self) -> SortField {
        match self.store.get(SORT_FIELD_KEY) {
            None => SortField::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                debug!(value = %raw, error = %e, "Unknown sort field, using default");
                SortField::default()
            }),
        }
    }

    pub fn set_sort_field(&self, field: SortField) -> Result<(), PreferenceError> {
        self.store.set(SORT_FIELD_KEY, field.as_str())
    }

    pub fn sort_order(&self) -> SortOrder {
        match self.store.get(SORT_ORDER_KEY) {
            None => SortOrder::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                debug!(value = %raw, error = %e, "Unknown sort order, using default");
                SortOrder::default()
            }),
        }
    }

    pub fn set_sort_order(&self, order: SortOrder) -> Result<(), PreferenceError> {
        self.store.set(SORT_ORDER_KEY, order.as_str())
    }

    pub fn favorite_stations(&self) -> BTreeSet<StationNumber> {
        decode_set(self.store.get(FAVORITES_KEY).as_deref())
    }

    pub fn set_favorite_stations(
        &self,
        favorites: &BTreeSet<StationNumber>,
    ) -> Result<(), PreferenceError> {
        self.store.set(FAVORITES_KEY, &encode_set(favorites))
    }

    pub fn is_favorite(&self, number: StationNumber) -> bool {
        self.favorite_stations().contains(&number)
    }

    pub fn large_tile_stations(&self) -> BTreeSet<StationNumber> {
        decode_set(self.store.get(LARGE_TILES_KEY).as_deref())
    }

    pub fn is_large_tile(&self, number: StationNumber) -> bool {
        self.large_tile_stations().contains(&number)
    }

    /// Set whether `number` is shown as a large tile.
    pub fn set_tile_size(&self, number: StationNumber, large: bool) -> Result<(), PreferenceError> {
        let mut tiles = self.large_tile_stations();
        if large {
            tiles.insert(number);
        } else {
            tiles.remove(&number);
        }
        self.store.set(LARGE_TILES_KEY, &encode_set(&tiles))
    }

    pub fn last_screen(&self) -> String {
        self.store
            .get(LAST_SCREEN_KEY)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SCREEN.to_string())
    }

    pub fn set_last_screen(&self, screen: &str) -> Result<(), PreferenceError> {
        self.store.set(LAST_SCREEN_KEY, screen)
    }
}

/// Flip membership, returning whether `number` is now in the set.
pub(crate) fn toggle(set: &mut BTreeSet<StationNumber>, number: StationNumber) -> bool {
    if set.remove(&number) {
        false
    } else {
        set.insert(number);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryStore;

    fn n(x: u32) -> StationNumber {
        StationNumber::new(x)
    }

    #[test]
    fn defaults_when_empty() {
        let prefs = Preferences::new(MemoryStore::new());

        assert_eq!(prefs.sort_field(), SortField::Number);
        assert_eq!(prefs.sort_order(), SortOrder::Ascending);
        assert!(prefs.favorite_stations().is_empty());
        assert!(prefs.large_tile_stations().is_empty());
        assert_eq!(prefs.last_screen(), "HOME");
    }

    #[test]
    fn corrupt_enums_fall_back() {
        let store = MemoryStore::with_entries([
            ("sort_field", "BY_VIBES"),
            ("sort_order", "sideways"),
        ]);
        let prefs = Preferences::new(store);

        assert_eq!(prefs.sort_field(), SortField::Number);
        assert_eq!(prefs.sort_order(), SortOrder::Ascending);
    }

    #[test]
    fn sort_roundtrip() {
        let prefs = Preferences::new(MemoryStore::new());
        prefs.set_sort_field(SortField::ElectricalBikes).unwrap();
        prefs.set_sort_order(SortOrder::Descending).unwrap();

        assert_eq!(prefs.sort_field(), SortField::ElectricalBikes);
        assert_eq!(prefs.sort_order(), SortOrder::Descending);
        assert_eq!(prefs.store().get("sort_field").as_deref(), Some("ELECTRICAL_BIKES"));
    }

    #[test]
    fn favorites_roundtrip() {
        let prefs = Preferences::new(MemoryStore::new());
        let mut favorites = prefs.favorite_stations();

        assert!(toggle(&mut favorites, n(20)));
        assert!(toggle(&mut favorites, n(3)));
        prefs.set_favorite_stations(&favorites).unwrap();
        assert_eq!(prefs.store().get("favorite_stations").as_deref(), Some("3,20"));
        assert!(prefs.is_favorite(n(20)));

        assert!(!toggle(&mut favorites, n(20)));
        prefs.set_favorite_stations(&favorites).unwrap();
        assert!(!prefs.is_favorite(n(20)));
        assert!(prefs.is_favorite(n(3)));
    }

    #[test]
    fn tile_size_independent_of_favorites() {
        let prefs = Preferences::new(MemoryStore::new());
        prefs.set_favorite_stations(&[n(5)].into()).unwrap();

        prefs.set_tile_size(n(7), true).unwrap();
        assert!(prefs.is_large_tile(n(7)));
        assert!(!prefs.is_large_tile(n(5)));
        assert!(!prefs.is_favorite(n(7)));

        prefs.set_tile_size(n(7), false).unwrap();
        assert!(prefs.large_tile_stations().is_empty());
        assert!(prefs.is_favorite(n(5)));
    }

    #[test]
    fn last_screen_roundtrip() {
        let prefs = Preferences::new(MemoryStore::new());
        prefs.set_last_screen("FAVORITES").unwrap();
        assert_eq!(prefs.last_screen(), "FAVORITES");

        prefs.set_last_screen("").unwrap();
        assert_eq!(prefs.last_screen(), "HOME");
    }
}
