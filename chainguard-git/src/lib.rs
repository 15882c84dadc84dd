//! Deterministic project identity.
//!
//! `chainguard-server` and `chainguard-hook` are separate processes that
//! must independently derive the same 16-hex-character project fingerprint
//! from the same inputs (§4.1 of the spec). This crate is the single
//! implementation both binaries link against so that contract cannot drift.

use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};

/// Marker files/directories a project root is recognized by when walking
/// upward from a changed file (used by the hook to locate the project).
pub const ROOT_MARKERS: &[&str] = &[".git", "composer.json", "package.json", ".chainguard", "CLAUDE.md"];

/// Which input produced the fingerprint, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectIdSource {
    GitRemote,
    GitToplevel,
    WorkingDir,
}

#[derive(Debug, Clone)]
pub struct ProjectIdentity {
    /// First 16 hex characters of SHA-256 over the chosen input string.
    pub project_id: String,
    pub source: ProjectIdSource,
    pub input: String,
}

/// Derives the project identity for `working_dir` following the order:
/// (a) `git remote get-url origin`, (b) `git rev-parse --show-toplevel`,
/// (c) the absolute working directory itself. First non-empty wins.
pub fn derive_project_identity(working_dir: &Path) -> ProjectIdentity {
    if let Some(remote) = git_remote_origin_url(working_dir) {
        return ProjectIdentity {
            project_id: fingerprint(&remote),
            source: ProjectIdSource::GitRemote,
            input: remote,
        };
    }

    if let Some(toplevel) = git_toplevel(working_dir) {
        let input = toplevel.to_string_lossy().into_owned();
        return ProjectIdentity {
            project_id: fingerprint(&input),
            source: ProjectIdSource::GitToplevel,
            input,
        };
    }

    let input = absolute(working_dir).to_string_lossy().into_owned();
    ProjectIdentity {
        project_id: fingerprint(&input),
        source: ProjectIdSource::WorkingDir,
        input,
    }
}

/// First 16 hex characters of SHA-256(input).
pub fn fingerprint(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let hex = format!("{digest:x}");
    hex[..16].to_string()
}

fn git_remote_origin_url(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["-C", &dir.to_string_lossy(), "remote", "get-url", "origin"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let url = String::from_utf8(output.stdout).ok()?;
    let url = url.trim();
    if url.is_empty() { None } else { Some(url.to_string()) }
}

fn git_toplevel(dir: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["-C", &dir.to_string_lossy(), "rev-parse", "--show-toplevel"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8(output.stdout).ok()?;
    let path = path.trim();
    if path.is_empty() { None } else { Some(PathBuf::from(path)) }
}

fn absolute(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    }
}

/// Walks upward from `start` (a file or directory) looking for
/// [`ROOT_MARKERS`], returning the first ancestor directory that contains
/// one. Falls back to `start`'s parent (or `start` itself) when nothing is
/// found, so callers always get a usable directory.
pub fn find_project_root(start: &Path) -> PathBuf {
    let mut dir = if start.is_dir() {
        Some(start.to_path_buf())
    } else {
        start.parent().map(Path::to_path_buf)
    };

    while let Some(candidate) = dir {
        if ROOT_MARKERS.iter().any(|marker| candidate.join(marker).exists()) {
            return candidate;
        }
        dir = candidate.parent().map(Path::to_path_buf);
    }

    start
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| start.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn fingerprint_is_deterministic_and_16_hex_chars() {
        let a = fingerprint("https://example.com/repo.git");
        let b = fingerprint("https://example.com/repo.git");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_inputs_yield_different_ids() {
        assert_ne!(fingerprint("a"), fingerprint("b"));
    }

    #[test]
    fn falls_back_to_working_dir_outside_git() {
        let dir = tempfile::tempdir().expect("tempdir");
        let identity = derive_project_identity(dir.path());
        assert_eq!(identity.source, ProjectIdSource::WorkingDir);
        assert_eq!(identity.project_id.len(), 16);
    }

    #[test]
    fn find_project_root_detects_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("src").join("lib");
        fs::create_dir_all(&nested).expect("mkdir");
        fs::write(dir.path().join("package.json"), "{}").expect("write marker");

        let file = nested.join("mod.rs");
        fs::write(&file, "").expect("write file");

        let root = find_project_root(&file);
        assert_eq!(root, dir.path());
    }

    #[test]
    fn find_project_root_falls_back_without_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.rs");
        fs::write(&file, "").expect("write");
        let root = find_project_root(&file);
        assert_eq!(root, dir.path());
    }
}
