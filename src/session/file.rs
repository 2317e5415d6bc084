//! Session persistence for the CLI.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{MemorySessionStore, Session, SessionStore};

/// A session store that mirrors every change to a JSON file.
pub struct FileSessionStore {
    memory: MemorySessionStore,
    path: PathBuf,
}

impl FileSessionStore {
    /// Open the store, loading the session from `path` if the file exists.
    ///
    /// A file that does not parse is treated as logged out, so a damaged
    /// file never blocks a new login. Only I/O failures are errors.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let memory = match read_session(&path)? {
            Some(session) => {
                tracing::debug!(path = %path.display(), "Loaded session from file");
                MemorySessionStore::with_session(session)
            }
            None => MemorySessionStore::new(),
        };
        Ok(Self { memory, path })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write to a sibling temp file and rename it over the session file, so
    /// a crash mid-write leaves the previous file intact.
    fn save(&self, session: &Session) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = temp_path(&self.path);
        let result = write_json(&tmp, session).and_then(|()| fs::rename(&tmp, &self.path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.save(session) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist session");
        }
    }

    fn remove_file(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove session file");
            }
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_json(path: &Path, session: &Session) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, session)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn read_session(path: &Path) -> std::io::Result<Option<Session>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(session) => Ok(Some(session)),
        Err(e) if e.is_io() => Err(e.into()),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Session file unreadable, starting logged out"
            );
            Ok(None)
        }
    }
}

impl SessionStore for FileSessionStore {
    fn current(&self) -> Option<Session> {
        self.memory.current()
    }

    fn replace(&self, session: Session) {
        self.persist(&session);
        self.memory.replace(session);
    }

    fn clear(&self) {
        self.memory.clear();
        self.remove_file();
    }

    fn replace_if_current(&self, expected: &str, session: Session) -> bool {
        if !self.memory.replace_if_current(expected, session.clone()) {
            return false;
        }
        self.persist(&session);
        true
    }

    fn clear_if_current(&self, expected: &str) -> bool {
        if !self.memory.clear_if_current(expected) {
            return false;
        }
        self.remove_file();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("backoffice-session-{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).unwrap_or_default();
        }
    }

    #[test]
    fn test_persistence() {
        let path = temp_dir_path();

        let store = FileSessionStore::open(&path).unwrap();
        assert!(store.current().is_none());
        store.replace(Session::new("A", "R"));
        assert!(path.exists());
        assert!(!temp_path(&path).exists());

        // Load new instance
        let loaded = FileSessionStore::open(&path).unwrap();
        assert_eq!(loaded.current(), Some(Session::new("A", "R")));

        loaded.clear();
        assert!(!path.exists());
        assert!(FileSessionStore::open(&path).unwrap().current().is_none());

        // Clearing twice is harmless
        loaded.clear();

        cleanup(&path);
    }

    #[test]
    fn test_corrupt_file_loads_logged_out() {
        let path = temp_dir_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"token":"A","refr"#).unwrap();

        let store = FileSessionStore::open(&path).unwrap();
        assert!(store.current().is_none());

        // A fresh login overwrites the damaged file.
        store.replace(Session::new("B", "R2"));
        let reloaded = FileSessionStore::open(&path).unwrap();
        assert_eq!(reloaded.current(), Some(Session::new("B", "R2")));

        cleanup(&path);
    }

    #[test]
    fn test_conditional_replace_persists_only_on_match() {
        let path = temp_dir_path();
        let store = FileSessionStore::open(&path).unwrap();
        store.replace(Session::new("A", "R"));

        assert!(!store.replace_if_current("X", Session::new("B", "R2")));
        assert_eq!(
            FileSessionStore::open(&path).unwrap().current(),
            Some(Session::new("A", "R"))
        );

        assert!(store.replace_if_current("A", Session::new("B", "R2")));
        assert_eq!(
            FileSessionStore::open(&path).unwrap().current(),
            Some(Session::new("B", "R2"))
        );

        assert!(store.clear_if_current("B"));
        assert!(!path.exists());

        cleanup(&path);
    }
}
