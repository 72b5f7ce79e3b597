//! The last resolution tier: directories and archives added at run time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::archive::{ClassArchive, CLASS_FILE_EXTENSION};
use crate::class::ClassBytes;
use crate::errors::LoaderError;

/// One search-path entry.
#[derive(Debug)]
pub enum SearchEntry {
    Directory(PathBuf),
    /// Read on first lookup; `None` until then.
    Archive {
        path: PathBuf,
        contents: Option<ClassArchive>,
    },
}

impl SearchEntry {
    /// Directories become [`SearchEntry::Directory`]; anything else is
    /// treated as an archive.
    pub fn from_path(path: PathBuf) -> Self {
        if path.is_dir() {
            SearchEntry::Directory(path)
        } else {
            SearchEntry::Archive {
                path,
                contents: None,
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SearchEntry::Directory(path) | SearchEntry::Archive { path, .. } => path,
        }
    }

    fn lookup(&mut self, name: &str) -> Result<Option<ClassBytes>, LoaderError> {
        match self {
            SearchEntry::Directory(dir) => {
                let mut file = dir.clone();
                file.extend(name.split('.'));
                file.set_extension(CLASS_FILE_EXTENSION);
                match fs::read(&file) {
                    Ok(bytes) => Ok(Some(ClassBytes::new(name, bytes))),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                    Err(source) => Err(LoaderError::Io { path: file, source }),
                }
            }
            SearchEntry::Archive { path, contents } => {
                if contents.is_none() {
                    *contents = Some(ClassArchive::read(path)?);
                }
                Ok(contents
                    .as_ref()
                    .and_then(|archive| archive.find(name))
                    .cloned())
            }
        }
    }
}

/// Ordered list of entries searched after installed and host classes.
#[derive(Debug, Default)]
pub struct SearchPath {
    entries: Vec<SearchEntry>,
}

impl SearchPath {
    pub fn new() -> Self {
        SearchPath::default()
    }

    pub fn push(&mut self, path: PathBuf) {
        tracing::debug!(path = %path.display(), "search path entry added");
        self.entries.push(SearchEntry::from_path(path));
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry holding `name`, in insertion order.
    ///
    /// Unreadable entries are skipped with a warning so one broken archive
    /// does not hide classes in later entries.
    pub fn find(&mut self, name: &str) -> Option<(ClassBytes, PathBuf)> {
        for entry in &mut self.entries {
            match entry.lookup(name) {
                Ok(Some(bytes)) => return Some((bytes, entry.path().to_owned())),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping search path entry"),
            }
        }
        None
    }
}

/// Files in `dir` whose extension matches `extension`, ignoring case.
///
/// Results keep directory-listing order.
pub fn scan_archives(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, LoaderError> {
    let io_err = |source: io::Error| LoaderError::Io {
        path: dir.to_owned(),
        source,
    };
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            found.push(path);
        }
    }
    Ok(found)
}
