//! The abstract file tree the scanner walks.
//!
//! Paths are slash-joined and relative to the tree root, with a leading
//! `/`. The scanner never touches the filesystem directly; everything
//! goes through this trait, which keeps the engine testable against an
//! in-memory tree and portable to non-disk backends.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// One directory entry, name only. The walker joins paths itself.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub modified_ms: u64,
}

pub trait FileTree {
    /// Whether the tree may be read at all. A denial aborts the scan
    /// before anything is listed.
    fn verify_permission(&self) -> bool;

    fn list(&self, path: &str) -> io::Result<Vec<TreeEntry>>;

    fn read_text(&self, path: &str) -> io::Result<String>;

    fn stat(&self, path: &str) -> io::Result<FileStat>;

    /// Replaces a file's contents. Only the relocation repair path writes.
    fn write_text(&self, path: &str, contents: &str) -> io::Result<()>;
}

/// A real directory on disk.
pub struct DiskTree {
    root: PathBuf,
}

impl DiskTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskTree { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        full
    }
}

impl FileTree for DiskTree {
    fn verify_permission(&self) -> bool {
        fs::read_dir(&self.root).is_ok()
    }

    fn list(&self, path: &str) -> io::Result<Vec<TreeEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            let kind = if entry.file_type()?.is_dir() {
                EntryKind::Folder
            } else {
                EntryKind::File
            };
            entries.push(TreeEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        // Directory order is filesystem-dependent; sort for stable ids.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_text(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn stat(&self, path: &str) -> io::Result<FileStat> {
        let meta = fs::metadata(self.resolve(path))?;
        let modified_ms = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(FileStat {
            size: meta.len(),
            modified_ms,
        })
    }

    fn write_text(&self, path: &str, contents: &str) -> io::Result<()> {
        fs::write(self.resolve(path), contents)
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: String,
    modified_ms: u64,
}

/// An in-memory tree. Folders are implied by the paths of the files they
/// contain.
#[derive(Debug, Default)]
pub struct MemoryTree {
    files: RefCell<BTreeMap<String, MemoryFile>>,
    permission_denied: bool,
}

impl MemoryTree {
    pub fn new() -> Self {
        MemoryTree::default()
    }

    /// Adds a file under a leading-slash path, e.g. `/SONGS/Intro.xml`.
    pub fn insert(&mut self, path: &str, contents: &str) {
        self.insert_with_modified(path, contents, 0);
    }

    pub fn insert_with_modified(&mut self, path: &str, contents: &str, modified_ms: u64) {
        self.files.borrow_mut().insert(
            path.to_string(),
            MemoryFile {
                contents: contents.to_string(),
                modified_ms,
            },
        );
    }

    pub fn deny_permission(&mut self) {
        self.permission_denied = true;
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).map(|f| f.contents.clone())
    }
}

impl FileTree for MemoryTree {
    fn verify_permission(&self) -> bool {
        !self.permission_denied
    }

    fn list(&self, path: &str) -> io::Result<Vec<TreeEntry>> {
        let prefix = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };

        let mut entries: Vec<TreeEntry> = Vec::new();
        for full in self.files.borrow().keys() {
            let Some(rest) = full.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                // Deeper entries surface as their first path segment.
                Some((folder, _)) => {
                    if !entries
                        .iter()
                        .any(|e| e.kind == EntryKind::Folder && e.name == folder)
                    {
                        entries.push(TreeEntry {
                            name: folder.to_string(),
                            kind: EntryKind::Folder,
                        });
                    }
                }
                None => entries.push(TreeEntry {
                    name: rest.to_string(),
                    kind: EntryKind::File,
                }),
            }
        }
        Ok(entries)
    }

    fn read_text(&self, path: &str) -> io::Result<String> {
        self.files
            .borrow()
            .get(path)
            .map(|f| f.contents.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn stat(&self, path: &str) -> io::Result<FileStat> {
        self.files
            .borrow()
            .get(path)
            .map(|f| FileStat {
                size: f.contents.len() as u64,
                modified_ms: f.modified_ms,
            })
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn write_text(&self, path: &str, contents: &str) -> io::Result<()> {
        match self.files.borrow_mut().get_mut(path) {
            Some(file) => {
                file.contents = contents.to_string();
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, path.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_memory_tree_lists_direct_children_and_folders() {
        let mut tree = MemoryTree::new();
        tree.insert("/SONGS/Intro.xml", "<song/>");
        tree.insert("/SONGS/Outro.xml", "<song/>");
        tree.insert("/SAMPLES/DRUMS/Kick.wav", "RIFF");
        tree.insert("/README.txt", "hi");

        let root = tree.list("/").unwrap();
        let names: Vec<&str> = root.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["README.txt", "SAMPLES", "SONGS"]);
        assert_eq!(root[1].kind, EntryKind::Folder);

        let songs = tree.list("/SONGS").unwrap();
        assert_eq!(songs.len(), 2);
        assert!(songs.iter().all(|e| e.kind == EntryKind::File));
    }

    #[test]
    fn test_memory_tree_stat_and_write_back() {
        let mut tree = MemoryTree::new();
        tree.insert_with_modified("/a.xml", "<sound/>", 42);

        let stat = tree.stat("/a.xml").unwrap();
        assert_eq!(stat.size, 8);
        assert_eq!(stat.modified_ms, 42);

        tree.write_text("/a.xml", "<kit/>").unwrap();
        assert_eq!(tree.contents("/a.xml").unwrap(), "<kit/>");
        assert!(tree.write_text("/missing.xml", "x").is_err());
    }

    #[test]
    fn test_disk_tree_resolves_leading_slash_paths() {
        let tree = DiskTree::new("/tmp/sdcard");
        assert_eq!(
            tree.resolve("/SONGS/Intro.xml"),
            Path::new("/tmp/sdcard/SONGS/Intro.xml")
        );
        assert_eq!(tree.resolve("/"), Path::new("/tmp/sdcard"));
    }
}
