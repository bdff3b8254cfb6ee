//! Identity resolution against the user directory.
//!
//! The directory is owned by the device vendor's software and may be locked
//! or mid-write at any moment, so every resolution works on a throwaway
//! snapshot: [`DirectorySource::open_snapshot`] produces one, the resolver
//! queries it, and dropping it removes the copy.

pub mod sqlite;

pub use sqlite::SqliteDirectory;

use crate::errors::AppResult;
use crate::models::UserDetail;
use std::collections::{HashMap, HashSet};

/// Read-only view of the directory for the lifetime of one resolution.
pub trait DirectorySnapshot {
    /// One round trip for all `ids`. Ids without a match are simply absent.
    fn lookup_batch(&self, ids: &[String]) -> AppResult<HashMap<String, UserDetail>>;

    /// Targeted lookup used as fallback for ids the batch missed.
    fn lookup_one(&self, id: &str) -> AppResult<Option<UserDetail>>;
}

/// Factory for directory snapshots.
pub trait DirectorySource: Send + Sync {
    fn open_snapshot(&self) -> AppResult<Box<dyn DirectorySnapshot>>;
}

/// Directory keys are numeric strings; anything else never matches.
pub fn is_eligible_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

/// Batched lookup with per-id fallback.
pub struct IdentityResolver<'a> {
    source: &'a dyn DirectorySource,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(source: &'a dyn DirectorySource) -> Self {
        Self { source }
    }

    /// Resolve `user_ids`, returning at most one entry per id.
    ///
    /// Never fails: a directory that cannot be read yields an empty map.
    pub fn resolve(&self, user_ids: &HashSet<String>) -> HashMap<String, UserDetail> {
        let mut eligible: Vec<String> = user_ids
            .iter()
            .filter(|id| is_eligible_id(id))
            .cloned()
            .collect();
        eligible.sort();

        let skipped = user_ids.len() - eligible.len();
        if skipped > 0 {
            tracing::warn!(skipped, "ignoring non-numeric user ids");
        }
        if eligible.is_empty() {
            return HashMap::new();
        }

        let snapshot = match self.source.open_snapshot() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "cannot open directory snapshot");
                return HashMap::new();
            }
        };

        let mut found = match snapshot.lookup_batch(&eligible) {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(error = %e, requested = eligible.len(), "batched directory lookup failed");
                return HashMap::new();
            }
        };
        found.retain(|id, _| user_ids.contains(id));

        tracing::info!(
            found = found.len(),
            requested = eligible.len(),
            "batched directory lookup"
        );

        let missing: Vec<&String> = eligible.iter().filter(|id| !found.contains_key(*id)).collect();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "falling back to one-by-one lookup");
        }

        for id in missing {
            match snapshot.lookup_one(id) {
                Ok(Some(detail)) => {
                    tracing::info!(user_id = %id, "fallback lookup found user");
                    found.insert(id.clone(), detail);
                }
                Ok(None) => {
                    tracing::warn!(user_id = %id, "user not found in directory");
                }
                Err(e) => {
                    tracing::error!(user_id = %id, error = %e, "fallback lookup failed");
                }
            }
        }

        found
    }
}
