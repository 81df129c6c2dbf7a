//! Application state shared across handlers

use std::sync::Arc;

use tether_core::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { db }),
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.inner.db
    }
}
