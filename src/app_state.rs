use std::sync::Arc;

use crate::sequencer::SequencerHandle;
use crate::services::persistence::PersistenceService;

/// Limits applied to intake requests.
#[derive(Debug, Clone, Copy)]
pub struct IntakeLimits {
    pub max_files: usize,
    pub max_body_bytes: usize,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_body_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub persistence: Arc<dyn PersistenceService>,
    pub sequencer: SequencerHandle,
    pub limits: IntakeLimits,
}

impl AppState {
    pub fn new(
        persistence: Arc<dyn PersistenceService>,
        sequencer: SequencerHandle,
        limits: IntakeLimits,
    ) -> Self {
        Self {
            persistence,
            sequencer,
            limits,
        }
    }
}
