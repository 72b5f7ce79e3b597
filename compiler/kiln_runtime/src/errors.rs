//! Error types for class loading.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to resolve, define or read a class.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("{0} not found")]
    ClassNotFound(String),

    #[error("cannot define class {name}: {source}")]
    Define {
        name: String,
        #[source]
        source: DefineError,
    },

    #[error("cannot link class {name}: {source}")]
    Link {
        name: String,
        #[source]
        source: LinkError,
    },

    #[error("unreadable class archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("search path entry is empty")]
    EmptySearchPath,
}

/// A [`ClassDefiner`](crate::ClassDefiner) rejected a bytecode unit.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DefineError {
    pub message: String,
}

impl DefineError {
    pub fn new(message: impl Into<String>) -> Self {
        DefineError {
            message: message.into(),
        }
    }
}

/// Resolving a class's member signatures failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LinkError {
    pub message: String,
}

impl LinkError {
    pub fn new(message: impl Into<String>) -> Self {
        LinkError {
            message: message.into(),
        }
    }
}

/// A batch install stopped at a class that would not load.
///
/// Classes before the failing one stay loaded; `loaded[i]` tells which.
#[derive(Debug, Error)]
#[error("load: {message} (loaded: {})", self.loaded_list())]
pub struct ClassInstallError {
    pub message: String,
    pub loaded: Vec<bool>,
    names: Vec<String>,
}

impl ClassInstallError {
    pub(crate) fn new(message: String, names: Vec<String>, loaded: Vec<bool>) -> Self {
        ClassInstallError {
            message,
            loaded,
            names,
        }
    }

    /// Names of the batch members that did load.
    pub fn loaded_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.loaded)
            .filter(|(_, loaded)| **loaded)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn loaded_list(&self) -> String {
        let names = self.loaded_names();
        if names.is_empty() {
            "none".to_owned()
        } else {
            names.join(", ")
        }
    }
}
