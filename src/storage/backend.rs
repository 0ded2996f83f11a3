use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use super::Store;

/// Volatile store, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

pub(crate) fn project_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("io.github", "tara", "Tara").map(|p| p.config_dir().to_path_buf())
}

/// The platform config directory, created on demand.
pub(crate) fn ensure_config_dir() -> io::Result<PathBuf> {
    if let Some(dir) = project_config_dir() {
        fs::create_dir_all(&dir)?;
        Ok(dir)
    } else {
        // Fallback to current directory
        Ok(std::env::current_dir()?)
    }
}

/// All keys in a single JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "storage.json";

    /// Open `storage.json` in the platform config directory.
    pub fn open_default() -> io::Result<Self> {
        let mut p = ensure_config_dir()?;
        p.push(Self::FILE_NAME);
        Ok(Self::open(p))
    }

    /// Open `storage.json` inside `dir`, creating the directory if needed.
    pub fn open_in(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self::open(dir.join(Self::FILE_NAME)))
    }

    /// Open the store at `path`. A missing or unreadable file opens empty.
    pub fn open(path: PathBuf) -> Self {
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                if path.is_file() {
                    log::warn!("ignoring unreadable store {}: {}", path.display(), e);
                }
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> io::Result<()> {
        let data = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let mut f = File::create(&self.path)?;
        f.write_all(data.as_bytes())?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> io::Result<BTreeMap<String, String>> {
    let mut s = String::new();
    File::open(path)?.read_to_string(&mut s)?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

impl Store for FileStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn delete(&mut self, key: &str) -> io::Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
