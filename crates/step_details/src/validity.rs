//! Existence check for the file a step points at.
//!
//! [`FileValidity`] is the request/response bookkeeping only; the lookup itself
//! runs wherever the host likes (the story runs it on a background executor)
//! and is fed back through [`FileValidity::resolve`].

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::filename::path_validator;

#[derive(Debug, thiserror::Error)]
pub enum ExistenceError {
    #[error("unknown project {0}")]
    UnknownProject(String),
    #[error("unknown pipeline {pipeline_uuid} in project {project_uuid}")]
    UnknownPipeline {
        project_uuid: String,
        pipeline_uuid: String,
    },
    #[error("failed to look up {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Composite key of a lookup. Empty fields count as missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FileLookupKey {
    pub project_uuid: String,
    pub pipeline_uuid: String,
    pub path: String,
}

impl FileLookupKey {
    pub fn new(
        project_uuid: impl Into<String>,
        pipeline_uuid: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            project_uuid: project_uuid.into(),
            pipeline_uuid: pipeline_uuid.into(),
            path: path.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.project_uuid.is_empty() && !self.pipeline_uuid.is_empty() && !self.path.is_empty()
    }
}

pub trait FileExistence {
    fn exists(&self, key: &FileLookupKey) -> Result<bool, ExistenceError>;
}

/// Looks files up on disk.
///
/// Step paths are relative to the directory holding the pipeline file, so every
/// pipeline has to be registered with its path inside the project first.
#[derive(Clone, Debug)]
pub struct FsExistence {
    projects_root: PathBuf,
    pipelines: HashMap<(String, String), PathBuf>,
}

impl FsExistence {
    pub fn new(projects_root: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
            pipelines: HashMap::new(),
        }
    }

    /// Register `pipeline_path` (e.g. `flows/etl.orchest`), relative to the
    /// project directory.
    pub fn pipeline(
        mut self,
        project_uuid: impl Into<String>,
        pipeline_uuid: impl Into<String>,
        pipeline_path: impl Into<PathBuf>,
    ) -> Self {
        self.pipelines.insert(
            (project_uuid.into(), pipeline_uuid.into()),
            pipeline_path.into(),
        );
        self
    }

    /// Directory the step paths of a pipeline are resolved against.
    pub fn pipeline_dir(
        &self,
        project_uuid: &str,
        pipeline_uuid: &str,
    ) -> Result<PathBuf, ExistenceError> {
        let project_dir = self.projects_root.join(project_uuid);
        if !project_dir.is_dir() {
            return Err(ExistenceError::UnknownProject(project_uuid.to_string()));
        }

        let pipeline_path = self
            .pipelines
            .get(&(project_uuid.to_string(), pipeline_uuid.to_string()))
            .ok_or_else(|| ExistenceError::UnknownPipeline {
                project_uuid: project_uuid.to_string(),
                pipeline_uuid: pipeline_uuid.to_string(),
            })?;

        let parent = pipeline_path.parent().unwrap_or(Path::new(""));
        Ok(project_dir.join(parent))
    }
}

impl FileExistence for FsExistence {
    fn exists(&self, key: &FileLookupKey) -> Result<bool, ExistenceError> {
        let pipeline_dir = self.pipeline_dir(&key.project_uuid, &key.pipeline_uuid)?;
        let path = pipeline_dir.join(key.path.trim_start_matches('/'));
        match std::fs::metadata(&path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ExistenceError::Io { path, source }),
        }
    }
}

/// A lookup the host has to run and report back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingLookup {
    pub generation: u64,
    pub key: FileLookupKey,
}

#[derive(Debug, Default)]
pub struct FileValidity {
    key: Option<FileLookupKey>,
    generation: u64,
    result: bool,
    pending: bool,
}

impl FileValidity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known answer. Kept while a newer lookup is pending.
    pub fn result(&self) -> bool {
        self.result
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Point the check at `key`. A lookup is issued only when the key changed.
    ///
    /// Incomplete keys and paths that fail [`path_validator`] resolve to
    /// `false` straight away.
    pub fn request(&mut self, key: FileLookupKey) -> Option<PendingLookup> {
        if self.key.as_ref() == Some(&key) {
            return None;
        }
        self.key = Some(key);
        self.issue()
    }

    /// Re-issue the lookup for the current key.
    pub fn refresh(&mut self) -> Option<PendingLookup> {
        if self.key.is_none() {
            return None;
        }
        self.issue()
    }

    fn issue(&mut self) -> Option<PendingLookup> {
        self.generation += 1;
        let key = self.key.clone()?;

        if !key.is_complete() || !path_validator(&key.path) {
            self.result = false;
            self.pending = false;
            return None;
        }

        self.pending = true;
        tracing::trace!(generation = self.generation, path = %key.path, "file lookup issued");
        Some(PendingLookup {
            generation: self.generation,
            key,
        })
    }

    /// Record the outcome of a lookup. Returns `false` for stale lookups.
    pub fn resolve(&mut self, generation: u64, outcome: Result<bool, ExistenceError>) -> bool {
        if generation != self.generation {
            tracing::trace!(generation, current = self.generation, "dropping stale file lookup");
            return false;
        }

        self.pending = false;
        self.result = match outcome {
            Ok(exists) => exists,
            Err(err) => {
                tracing::warn!(%err, "file lookup failed");
                false
            }
        };
        true
    }

    /// Request and resolve in one go, for hosts without an executor.
    pub fn check_now(&mut self, key: FileLookupKey, checker: &impl FileExistence) -> bool {
        if let Some(lookup) = self.request(key) {
            let outcome = checker.exists(&lookup.key);
            self.resolve(lookup.generation, outcome);
        }
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(bool);

    impl FileExistence for Always {
        fn exists(&self, _key: &FileLookupKey) -> Result<bool, ExistenceError> {
            Ok(self.0)
        }
    }

    fn key(path: &str) -> FileLookupKey {
        FileLookupKey::new("project", "pipeline", path)
    }

    #[test]
    fn same_key_is_not_reissued() {
        let mut validity = FileValidity::new();
        assert!(validity.request(key("a.py")).is_some());
        assert!(validity.is_pending());
        assert!(validity.request(key("a.py")).is_none());
    }

    #[test]
    fn incomplete_or_invalid_keys_resolve_immediately() {
        let mut validity = FileValidity::new();
        assert!(validity.request(FileLookupKey::new("", "pipeline", "a.py")).is_none());
        assert!(!validity.is_pending());
        assert!(!validity.result());

        assert!(validity.request(key("notes.txt")).is_none());
        assert!(!validity.is_pending());
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut validity = FileValidity::new();
        let first = validity.request(key("a.py")).unwrap();
        let second = validity.request(key("b.py")).unwrap();

        assert!(!validity.resolve(first.generation, Ok(true)));
        assert!(validity.is_pending());
        assert!(!validity.result());

        assert!(validity.resolve(second.generation, Ok(true)));
        assert!(!validity.is_pending());
        assert!(validity.result());
    }

    #[test]
    fn failed_lookup_reads_as_missing() {
        let mut validity = FileValidity::new();
        let lookup = validity.request(key("a.py")).unwrap();
        validity.resolve(
            lookup.generation,
            Err(ExistenceError::UnknownProject("project".into())),
        );
        assert!(!validity.result());
        assert!(!validity.is_pending());
    }

    #[test]
    fn refresh_reissues_current_key() {
        let mut validity = FileValidity::new();
        assert!(validity.refresh().is_none());
        assert!(validity.check_now(key("a.py"), &Always(true)));

        let lookup = validity.refresh().unwrap();
        assert_eq!(lookup.key, key("a.py"));
        // The previous answer stays visible while the refresh is pending.
        assert!(validity.result());
        validity.resolve(lookup.generation, Ok(false));
        assert!(!validity.result());
    }
}
