//! Application state management

use crate::predictor::Predictor;

/// State shared across handlers: the predictor built once at startup.
///
/// The predictor is read-only after initialization, so handlers share it
/// without locking.
pub struct AppState {
    pub predictor: Predictor,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(predictor: Predictor, started_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            predictor,
            started_at,
        }
    }
}
