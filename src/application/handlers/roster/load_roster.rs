//! RosterLoader - startup ingestion of the class roster.
//!
//! Parses and validates the roster file, then writes every
//! `username -> class` enrollment to the identity store in one batch.
//! Re-running with the same file rewrites identical values.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::foundation::{ClassName, Username};
use crate::domain::roster::{Roster, RosterError};
use crate::ports::{IdentityStore, StoreError};

/// Errors that abort roster loading. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RosterLoadError {
    #[error("Failed to read roster file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("Failed to store enrollments: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a successful load.
#[derive(Debug, Clone)]
pub struct RosterLoadResult {
    pub roster: Arc<Roster>,
    pub classes: usize,
    pub students: usize,
}

pub struct RosterLoader {
    store: Arc<dyn IdentityStore>,
}

impl RosterLoader {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Loads the roster file at `path` and ingests it.
    #[tracing::instrument(skip(self, path), fields(roster_path = %path.as_ref().display()))]
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<RosterLoadResult, RosterLoadError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RosterLoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.ingest(Roster::from_json(&raw)?).await
    }

    /// Records the class of every student in `roster`.
    pub async fn ingest(&self, roster: Roster) -> Result<RosterLoadResult, RosterLoadError> {
        let enrollments: Vec<(Username, ClassName)> = roster
            .students()
            .map(|s| (s.username().clone(), s.class().clone()))
            .collect();

        self.store.set_student_classes(&enrollments).await?;

        let result = RosterLoadResult {
            classes: roster.class_count(),
            students: roster.student_count(),
            roster: Arc::new(roster),
        };
        tracing::info!(
            classes = result.classes,
            students = result.students,
            "Roster loaded"
        );
        Ok(result)
    }
}
