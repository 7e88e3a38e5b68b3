//! Bike-share station state manager.
//!
//! Fetches live station availability from the JCDecaux self-service bike
//! API and keeps sorted, filtered and favorites-only views of it up to date,
//! with the user's sort and favorite preferences persisted between runs.

pub mod domain;
pub mod jcdecaux;
pub mod preferences;
pub mod resource;
pub mod state;
