//! Small ambient helpers shared across the chainguard workspace.
//!
//! Every crate that persists state to disk goes through [`atomic_write`] so
//! that a crash mid-write never leaves a torn `state.json` or
//! `enforcement-state.json` behind.

use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

/// Writes `contents` to `path` via write-temp-then-rename so readers never
/// observe a partially written file.
///
/// The temp file is created in the same directory as `path` so the final
/// rename is atomic on the same filesystem.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    io::Write::write_all(&mut tmp, contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// A bounded, insertion-ordered set that drops the oldest entry once it
/// exceeds `cap`. Used for `out_of_scope_files`, `changed_files`, and the
/// error index.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BoundedSet<T> {
    items: Vec<T>,
    cap: usize,
}

impl<T: PartialEq> BoundedSet<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap.min(64)),
            cap,
        }
    }

    /// Pushes `item`, evicting the oldest entry on overflow (FIFO). No-op if
    /// `item` is already present.
    pub fn push(&mut self, item: T) {
        if self.items.contains(&item) {
            return;
        }
        self.items.push(item);
        while self.items.len() > self.cap {
            self.items.remove(0);
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A fixed-size ring buffer, used for `recent_actions` (cap 5).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Ring<T> {
    items: std::collections::VecDeque<T>,
    cap: usize,
}

impl<T> Ring<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            items: std::collections::VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.cap {
            self.items.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_set_evicts_oldest() {
        let mut set = BoundedSet::new(3);
        set.push("a");
        set.push("b");
        set.push("c");
        set.push("d");
        assert_eq!(set.as_slice(), &["b", "c", "d"]);
    }

    #[test]
    fn bounded_set_dedupes() {
        let mut set = BoundedSet::new(3);
        set.push("a");
        set.push("a");
        assert_eq!(set.as_slice(), &["a"]);
    }

    #[test]
    fn ring_keeps_last_n() {
        let mut ring = Ring::new(2);
        ring.push(1);
        ring.push(2);
        ring.push(3);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn atomic_write_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");
        atomic_write(&path, b"{\"a\":1}").expect("write");
        let read = std::fs::read_to_string(&path).expect("read");
        assert_eq!(read, "{\"a\":1}");
    }
}
