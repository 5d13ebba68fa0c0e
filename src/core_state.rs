//! Shared application state for the HTTP layer.

use std::path::{Path, PathBuf};

use crate::db;
use crate::pipeline::rag::generation::AnswerGenerator;

/// State shared by every request.
///
/// Requests open their own SQLite connection; the generator and its HTTP
/// clients are built once at startup and reused.
pub struct CoreState {
    db_path: PathBuf,
    generator: AnswerGenerator,
}

impl CoreState {
    pub fn new(db_path: PathBuf, generator: AnswerGenerator) -> Self {
        Self { db_path, generator }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    pub fn fallback_configured(&self) -> bool {
        self.generator.has_fallback()
    }

    /// Open a database connection for one request.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rag::generation::mock::MockProvider;

    #[test]
    fn open_db_creates_schema_at_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oncoguide.db");
        let generator = AnswerGenerator::new(Box::new(MockProvider::replying("p", "ok.")), None);
        let state = CoreState::new(path.clone(), generator);

        let conn = state.open_db().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
        assert!(path.exists());
        assert!(!state.fallback_configured());
    }
}
