//! `.kar` class archives.
//!
//! An archive is a bincode-encoded list of [`ClassBytes`]. Loose classes live
//! in directories instead, one `.kclass` file per class at the path formed
//! by its dotted name (`a.b.C` -> `<dir>/a/b/C.kclass`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::class::ClassBytes;
use crate::errors::LoaderError;

/// File extension of class archives.
pub const ARCHIVE_EXTENSION: &str = "kar";

/// File extension of loose class files.
pub const CLASS_FILE_EXTENSION: &str = "kclass";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassArchive {
    pub classes: Vec<ClassBytes>,
}

impl ClassArchive {
    pub fn new(classes: Vec<ClassBytes>) -> Self {
        ClassArchive { classes }
    }

    pub fn find(&self, name: &str) -> Option<&ClassBytes> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn read(path: &Path) -> Result<Self, LoaderError> {
        let bytes = fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_owned(),
            source,
        })?;
        bincode::deserialize(&bytes).map_err(|source| LoaderError::Archive {
            path: path.to_owned(),
            source,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), LoaderError> {
        let bytes = bincode::serialize(self).map_err(|source| LoaderError::Archive {
            path: path.to_owned(),
            source,
        })?;
        fs::write(path, bytes).map_err(|source| LoaderError::Io {
            path: path.to_owned(),
            source,
        })
    }
}
