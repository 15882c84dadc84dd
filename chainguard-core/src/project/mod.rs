//! Project manager: the bounded in-memory cache of `ProjectState`,
//! debounced atomic persistence, and the enforcement snapshot the hook
//! binary reads (§4.1).

mod snapshot;

pub use snapshot::EnforcementSnapshot;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use chainguard_git::{derive_project_identity, ProjectIdentity};

use crate::cache::BoundedCache;
use crate::error::{ChainguardError, Result};
use crate::model::ProjectState;

struct CachedProject {
    state: Arc<Mutex<ProjectState>>,
    dirty: bool,
    pending_save: Option<JoinHandle<()>>,
}

/// Per-path lock map guarding concurrent writes to the same file, lazily
/// populated and pruned on project eviction (§4.1).
type PathLocks = Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>;

/// Owns the project cache and disk layout under `$CHAINGUARD_HOME/projects`.
pub struct ProjectManager {
    home: PathBuf,
    debounce_window: Duration,
    cache: Mutex<BoundedCache<String, CachedProject>>,
    path_locks: PathLocks,
}

impl ProjectManager {
    pub fn new(home: PathBuf, capacity: usize, debounce_window: Duration) -> Self {
        Self {
            home,
            debounce_window,
            cache: Mutex::new(BoundedCache::new(capacity)),
            path_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn project_dir(&self, project_id: &str) -> PathBuf {
        self.home.join("projects").join(project_id)
    }

    fn state_path(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("state.json")
    }

    fn snapshot_path(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("enforcement-state.json")
    }

    /// Resolves a working directory to a project identity (§4.1), the same
    /// derivation `chainguard-hook` performs independently.
    pub fn resolve_identity(&self, working_dir: &Path) -> ProjectIdentity {
        derive_project_identity(working_dir)
    }

    /// Loads (or cold-starts) the project for `working_dir` and hands back
    /// a clone of its shared, lockable state handle.
    pub async fn load(&self, working_dir: &Path) -> Result<Arc<Mutex<ProjectState>>> {
        let identity = self.resolve_identity(working_dir);
        let project_id = identity.project_id.clone();

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(&project_id) {
            return Ok(cached.state.clone());
        }

        let state = self.read_state(&project_id, working_dir).await;
        let state = Arc::new(Mutex::new(state));
        let evicted = cache.put(
            project_id.clone(),
            CachedProject { state: state.clone(), dirty: false, pending_save: None },
        );
        drop(cache);

        if let Some((evicted_id, evicted_project)) = evicted {
            self.flush_one(&evicted_id, &evicted_project).await;
            self.path_locks.lock().await.retain(|p, _| {
                !p.starts_with(self.project_dir(&evicted_id))
            });
        }

        Ok(state)
    }

    async fn read_state(&self, project_id: &str, working_dir: &Path) -> ProjectState {
        let path = self.state_path(project_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => state,
                Err(err) => {
                    warn!(project_id, %err, "state.json unreadable, cold-starting project");
                    self.fresh_state(project_id, working_dir)
                }
            },
            Err(_) => self.fresh_state(project_id, working_dir),
        }
    }

    fn fresh_state(&self, project_id: &str, working_dir: &Path) -> ProjectState {
        ProjectState::new(
            project_id.to_string(),
            working_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| project_id.to_string()),
            working_dir.to_string_lossy().into_owned(),
            Utc::now(),
        )
    }

    /// Marks a project dirty and (re)arms the debounced save timer,
    /// aborting any previously scheduled write for the same project.
    pub async fn mark_dirty(&self, project_id: &str) {
        let mut cache = self.cache.lock().await;
        let Some(cached) = cache.get_mut(&project_id.to_string()) else {
            return;
        };
        cached.dirty = true;
        if let Some(handle) = cached.pending_save.take() {
            handle.abort();
        }

        let state = cached.state.clone();
        let project_id = project_id.to_string();
        let path = self.state_path(&project_id);
        let snapshot_path = self.snapshot_path(&project_id);
        let debounce = self.debounce_window;

        let path_locks = self.path_locks.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let guard = state.lock().await;
            if let Err(err) = write_state_locked(&path_locks, &path, &guard).await {
                warn!(project_id, %err, "debounced save failed");
                return;
            }
            if let Err(err) = write_snapshot_locked(&path_locks, &snapshot_path, &project_id, &guard).await {
                warn!(project_id, %err, "enforcement snapshot write failed");
            }
        });
        cached.pending_save = Some(handle);
    }

    /// Bypasses the debounce window; used by `set_scope`, `finish`, and
    /// orderly shutdown (§4.1).
    pub async fn save_immediate(&self, project_id: &str) -> Result<()> {
        let mut cache = self.cache.lock().await;
        let Some(cached) = cache.get_mut(&project_id.to_string()) else {
            return Ok(());
        };
        if let Some(handle) = cached.pending_save.take() {
            handle.abort();
        }
        let state = cached.state.clone();
        cached.dirty = false;
        drop(cache);

        let guard = state.lock().await;
        write_state_locked(&self.path_locks, &self.state_path(project_id), &guard).await?;
        write_snapshot_locked(&self.path_locks, &self.snapshot_path(project_id), project_id, &guard).await?;
        debug!(project_id, "immediate save complete");
        Ok(())
    }

    async fn flush_one(&self, project_id: &str, cached: &CachedProject) {
        if let Some(handle) = &cached.pending_save {
            handle.abort();
        }
        let guard = cached.state.lock().await;
        if let Err(err) = write_state_locked(&self.path_locks, &self.state_path(project_id), &guard).await {
            warn!(project_id, %err, "flush on eviction failed");
            return;
        }
        if let Err(err) = write_snapshot_locked(&self.path_locks, &self.snapshot_path(project_id), project_id, &guard).await {
            warn!(project_id, %err, "snapshot on eviction failed");
        }
    }

    /// Flushes every cached project's pending write; called on shutdown.
    pub async fn flush_all(&self) {
        let mut cache = self.cache.lock().await;
        let ids: Vec<String> = cache.keys().cloned().collect();
        for id in ids {
            if let Some(cached) = cache.get_mut(&id) {
                if let Some(handle) = cached.pending_save.take() {
                    handle.abort();
                }
                let guard = cached.state.lock().await;
                if let Err(err) = write_state_locked(&self.path_locks, &self.state_path(&id), &guard).await {
                    warn!(project_id = %id, %err, "flush_all save failed");
                    continue;
                }
                if let Err(err) = write_snapshot_locked(&self.path_locks, &self.snapshot_path(&id), &id, &guard).await {
                    warn!(project_id = %id, %err, "flush_all snapshot failed");
                }
            }
        }
    }

    /// Project IDs currently held in the in-memory cache, for the
    /// `projects` tool.
    pub async fn cached_project_ids(&self) -> Vec<String> {
        let cache = self.cache.lock().await;
        cache.keys().cloned().collect()
    }

    /// Acquires the global lock for `path`, serializing concurrent writers
    /// to the same file (§4.1).
    pub async fn lock_path(&self, path: &Path) -> Arc<Mutex<()>> {
        lock_path_in(&self.path_locks, path).await
    }
}

async fn lock_path_in(path_locks: &PathLocks, path: &Path) -> Arc<Mutex<()>> {
    let mut locks = path_locks.lock().await;
    locks.entry(path.to_path_buf()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
}

fn write_state(path: &Path, state: &ProjectState) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(state).map_err(|e| ChainguardError::InvalidInput(e.to_string()))?;
    chainguard_common::atomic_write(path, &bytes).map_err(ChainguardError::IoFail)
}

fn write_snapshot(path: &Path, project_id: &str, state: &ProjectState) -> Result<()> {
    let snapshot = EnforcementSnapshot::from_state(project_id, state);
    let bytes = serde_json::to_vec_pretty(&snapshot).map_err(|e| ChainguardError::InvalidInput(e.to_string()))?;
    chainguard_common::atomic_write(path, &bytes).map_err(ChainguardError::IoFail)
}

/// Serializes writers to `path` through the shared per-path lock map before
/// calling [`write_state`] (§4.1, §5).
async fn write_state_locked(path_locks: &PathLocks, path: &Path, state: &ProjectState) -> Result<()> {
    let lock = lock_path_in(path_locks, path).await;
    let _guard = lock.lock().await;
    write_state(path, state)
}

/// Same as [`write_state_locked`] for the enforcement snapshot file.
async fn write_snapshot_locked(
    path_locks: &PathLocks,
    path: &Path,
    project_id: &str,
    state: &ProjectState,
) -> Result<()> {
    let lock = lock_path_in(path_locks, path).await;
    let _guard = lock.lock().await;
    write_snapshot(path, project_id, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_cold_starts_a_fresh_project_and_save_immediate_persists_it() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ProjectManager::new(dir.path().to_path_buf(), 20, Duration::from_millis(500));

        let project_dir = dir.path().join("workdir");
        std::fs::create_dir_all(&project_dir).unwrap();

        let state = manager.load(&project_dir).await.unwrap();
        let project_id = state.lock().await.project_id.clone();
        assert_eq!(state.lock().await.phase, crate::model::Phase::Unknown);

        manager.save_immediate(&project_id).await.unwrap();
        assert!(manager.state_path(&project_id).exists());
        assert!(manager.snapshot_path(&project_id).exists());
    }

    #[tokio::test]
    async fn debounced_save_coalesces_rapid_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ProjectManager::new(dir.path().to_path_buf(), 20, Duration::from_millis(20));
        let project_dir = dir.path().join("workdir");
        std::fs::create_dir_all(&project_dir).unwrap();

        let state = manager.load(&project_dir).await.unwrap();
        let project_id = state.lock().await.project_id.clone();

        for _ in 0..5 {
            manager.mark_dirty(&project_id).await;
        }

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(manager.state_path(&project_id).exists());
    }
}
