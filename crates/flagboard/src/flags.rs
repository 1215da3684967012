//! The flagged-project store.
//!
//! Holds the set of project IDs a user has flagged. The set lives only as long
//! as the process: it starts empty and is discarded on shutdown.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Opaque identifier of a project, as assigned by the project directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The ordered collection of flagged project IDs.
///
/// Serializes as `{"projectIds": [...]}`, which is both the response body of
/// the flag endpoints and what clients decode. Insertion order is preserved
/// and an ID appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagSet {
    project_ids: Vec<ProjectId>,
}

impl FlagSet {
    /// Create an empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a project is flagged.
    #[must_use]
    pub fn contains(&self, id: &ProjectId) -> bool {
        self.project_ids.contains(id)
    }

    /// Flag a project. Returns `false` if it was already flagged.
    pub fn insert(&mut self, id: ProjectId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.project_ids.push(id);
        true
    }

    /// Unflag a project. Returns `false` if it was not flagged.
    pub fn remove(&mut self, id: &ProjectId) -> bool {
        match self.project_ids.iter().position(|p| p == id) {
            Some(index) => {
                self.project_ids.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of flagged projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.project_ids.len()
    }

    /// Check if nothing is flagged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.project_ids.is_empty()
    }

    /// Iterate over flagged IDs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectId> {
        self.project_ids.iter()
    }

    /// The flagged IDs as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ProjectId] {
        &self.project_ids
    }
}

impl FromIterator<ProjectId> for FlagSet {
    fn from_iter<I: IntoIterator<Item = ProjectId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Request body of a flag toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFlagRequest {
    /// The project to flag or unflag.
    pub project_id: ProjectId,
    /// Desired state.
    pub flagged: bool,
}

/// In-memory flag store shared by all request handlers.
///
/// Every read-modify-write happens under one lock, so concurrent toggles
/// cannot drop or duplicate entries.
#[derive(Debug, Default)]
pub struct FlagStore {
    flags: Mutex<FlagSet>,
}

impl FlagStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current flag set.
    #[must_use]
    pub fn get_flags(&self) -> FlagSet {
        self.lock().clone()
    }

    /// Flag or unflag a project and return the resulting set.
    ///
    /// Flagging an already flagged project and unflagging a project that is
    /// not flagged both leave the set unchanged.
    pub fn set_flag(&self, project_id: ProjectId, flagged: bool) -> FlagSet {
        let mut flags = self.lock();
        let changed = if flagged {
            flags.insert(project_id.clone())
        } else {
            flags.remove(&project_id)
        };
        debug!(
            project_id = %project_id,
            flagged,
            changed,
            total = flags.len(),
            "flag updated"
        );
        flags.clone()
    }

    /// Drop every flag, returning how many were discarded.
    pub fn reset(&self) -> usize {
        let mut flags = self.lock();
        let discarded = flags.len();
        *flags = FlagSet::new();
        discarded
    }

    // A panic while holding the lock cannot leave the set half-written, so a
    // poisoned guard is still safe to use.
    fn lock(&self) -> MutexGuard<'_, FlagSet> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
