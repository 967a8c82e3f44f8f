/// Workspace management for run-scoped artifacts
///
/// Every invocation stages its source, compiled unit, launcher and data files
/// inside its own uuid-named directory. Nothing is shared between runs, and the
/// directory is removed when the `Workspace` is dropped.
use crate::config::types::{Result, SortboxError};
use crate::observability::audit;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Workspace manager for isolated run artifacts
#[derive(Debug)]
pub struct Workspace {
    /// Unique run ID
    run_id: Uuid,
    /// Run-specific workspace directory
    run_dir: PathBuf,
    /// Skip removal on drop
    keep: bool,
}

impl Workspace {
    /// Create new workspace for a run
    pub fn new(base_dir: &Path) -> Result<Self> {
        let run_id = Uuid::new_v4();
        let run_dir = base_dir.join(run_id.to_string());

        fs::create_dir_all(&run_dir).map_err(|e| {
            SortboxError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create workspace directory {}: {}", run_dir.display(), e),
            ))
        })?;

        Ok(Self {
            run_id,
            run_dir,
            keep: false,
        })
    }

    /// Get run ID
    pub fn run_id(&self) -> String {
        self.run_id.to_string()
    }

    /// Identifier-safe token (hex, no dashes) used to tag artifact identities.
    pub fn token(&self) -> String {
        self.run_id.simple().to_string()
    }

    /// Get run directory
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Path of `name` inside the run directory (nothing is created).
    pub fn path(&self, name: &str) -> PathBuf {
        self.run_dir.join(name)
    }

    /// Keep the directory on disk after drop.
    pub fn keep(&mut self, keep: bool) {
        self.keep = keep;
    }

    /// Write a file into the run directory
    pub fn write_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.run_dir.join(name);

        fs::write(&path, content).map_err(|e| {
            SortboxError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write workspace file {}: {}", path.display(), e),
            ))
        })?;

        Ok(path)
    }

    /// Cleanup workspace (idempotent)
    pub fn cleanup(&self) -> Result<()> {
        if !self.run_dir.exists() {
            return Ok(());
        }

        fs::remove_dir_all(&self.run_dir).map_err(|e| {
            SortboxError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to remove workspace directory {}: {}",
                    self.run_dir.display(),
                    e
                ),
            ))
        })
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.keep {
            log::info!("Keeping workspace {}", self.run_dir.display());
            audit::workspace_cleanup(&self.run_id(), true, None);
            return;
        }
        match self.cleanup() {
            Ok(()) => audit::workspace_cleanup(&self.run_id(), false, None),
            Err(e) => {
                log::warn!("{}", e);
                audit::workspace_cleanup(&self.run_id(), false, Some(&e));
            }
        }
    }
}

/// Workspace manager for managing multiple workspaces
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    base_dir: PathBuf,
}

impl WorkspaceManager {
    /// Create new workspace manager
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir).map_err(|e| {
            SortboxError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create workspace base directory {}: {}",
                    base_dir.display(),
                    e
                ),
            ))
        })?;

        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create new workspace for a run
    pub fn create_workspace(&self) -> Result<Workspace> {
        Workspace::new(&self.base_dir)
    }

    /// Remove workspaces older than `max_age` left behind by crashed or kept runs.
    pub fn cleanup_old_workspaces(&self, max_age: std::time::Duration) -> Result<usize> {
        let mut cleaned = 0;
        let now = std::time::SystemTime::now();

        if !self.base_dir.exists() {
            return Ok(0);
        }

        for entry in fs::read_dir(&self.base_dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() || Uuid::parse_str(&entry.file_name().to_string_lossy()).is_err() {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("Failed to get modified time for {}: {}", path.display(), e);
                    continue;
                }
            };

            let age = match now.duration_since(modified) {
                Ok(d) => d,
                Err(_) => continue, // Future timestamp, skip
            };

            if age >= max_age {
                log::info!("Cleaning up old workspace: {}", path.display());
                match fs::remove_dir_all(&path) {
                    Ok(()) => cleaned += 1,
                    Err(e) => log::warn!("Failed to remove old workspace {}: {}", path.display(), e),
                }
            }
        }

        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_workspace_creation_and_drop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(temp_dir.path().to_path_buf()).unwrap();

        let workspace = manager.create_workspace().unwrap();
        let run_dir = workspace.run_dir().to_path_buf();
        assert!(run_dir.exists());
        assert!(run_dir.starts_with(temp_dir.path()));

        drop(workspace);
        assert!(!run_dir.exists());
    }

    #[test]
    fn test_workspaces_are_unique() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(temp_dir.path().to_path_buf()).unwrap();

        let a = manager.create_workspace().unwrap();
        let b = manager.create_workspace().unwrap();
        assert_ne!(a.run_dir(), b.run_dir());
        assert_ne!(a.token(), b.token());
        assert_eq!(a.token().len(), 32);
        assert!(a.token().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_workspace_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path()).unwrap();

        let source = workspace.write_file("submission.rs", b"pub fn sort(arr: &mut [i32]) {}").unwrap();
        assert!(source.exists());
        assert_eq!(source, workspace.path("submission.rs"));
        assert_eq!(workspace.path("launcher"), workspace.run_dir().join("launcher"));

        workspace.cleanup().unwrap();
        assert!(!source.exists());
        // Idempotent
        workspace.cleanup().unwrap();
    }

    #[test]
    fn test_keep_survives_drop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::new(temp_dir.path()).unwrap();
        workspace.keep(true);
        let run_dir = workspace.run_dir().to_path_buf();
        drop(workspace);
        assert!(run_dir.exists());
    }

    #[test]
    fn test_cleanup_old_workspaces() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(temp_dir.path().to_path_buf()).unwrap();

        let mut workspace = manager.create_workspace().unwrap();
        workspace.keep(true);
        let run_dir = workspace.run_dir().to_path_buf();
        drop(workspace);

        // Foreign directories are never touched
        let foreign = temp_dir.path().join("not-a-run");
        fs::create_dir_all(&foreign).unwrap();

        let cleaned = manager.cleanup_old_workspaces(Duration::from_secs(0)).unwrap();
        assert_eq!(cleaned, 1);
        assert!(!run_dir.exists());
        assert!(foreign.exists());
    }
}
