//! Preference store error types.

/// Errors that can occur when persisting preferences.
///
/// Reads never fail: missing or corrupt values fall back to defaults.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    /// Reading or writing the backing file failed
    #[error("preference I/O error: {message}")]
    Io { message: String },

    /// Failed to serialize preferences
    #[error("failed to serialize preferences: {message}")]
    Serialize { message: String },
}
