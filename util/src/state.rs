//! Application state container shared across Axum route handlers and services.
//!
//! This struct holds shared resources such as the database connection and the
//! recognition adapter. It is cheap to clone and passed into route handlers via
//! Axum's `State<T>` extractor.

use crate::recognition::{RecognitionAdapter, adapter_from_config};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Central application state shared across the server.
///
/// This includes:
/// - A cloned, thread-safe database connection for use with SeaORM.
/// - The recognition adapter consulted by the face capture channel.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    recognizer: Arc<dyn RecognitionAdapter>,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection and recognition adapter.
    pub fn new(db: DatabaseConnection, recognizer: Arc<dyn RecognitionAdapter>) -> Self {
        Self { db, recognizer }
    }

    /// Creates a new `AppState` whose adapter is built from the current configuration.
    pub fn from_config(db: DatabaseConnection) -> Self {
        Self::new(db, adapter_from_config())
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns the recognition adapter.
    pub fn recognizer(&self) -> &dyn RecognitionAdapter {
        self.recognizer.as_ref()
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}
