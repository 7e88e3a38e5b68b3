//! Persisted user preferences.
//!
//! Sort criteria, favorite stations, large-tile stations and the last
//! viewed screen. The raw storage is a [`KeyValueStore`]; [`Preferences`]
//! layers typed accessors with fall-back-to-default reads on top.

mod codec;
mod error;
mod file;
mod prefs;
mod store;

pub use codec::{decode_set, encode_set};
pub use error::PreferenceError;
pub use file::FileStore;
pub use prefs::{DEFAULT_SCREEN, Preferences};
pub use store::{KeyValueStore, MemoryStore};

pub(crate) use prefs::toggle;
