//! Classes as seen by the loader.
//!
//! A [`Class`] pairs a name and origin with a compiler-specific body. The
//! loader never looks inside a body; compilers recover their own type with
//! [`Class::downcast_body`].

use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::errors::{DefineError, LinkError};

/// One compiled class: qualified name plus opaque bytecode.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBytes {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ClassBytes {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ClassBytes {
            name: name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for ClassBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassBytes({}, {} bytes)", self.name, self.bytes.len())
    }
}

/// Behaviour of a live class, supplied by whoever defined it.
pub trait ClassBody: fmt::Debug + Send + Sync + 'static {
    /// Signatures of the members this class declares.
    ///
    /// Computing them forces every referenced type to resolve, so errors
    /// that would otherwise surface on first use show up here.
    fn declared_members(&self) -> Result<Vec<String>, LinkError>;

    fn as_any(&self) -> &dyn Any;
}

/// Turns bytecode produced by a compiler into a class body.
pub trait ClassDefiner: Send + Sync {
    fn define(&self, name: &str, bytes: &[u8]) -> Result<Arc<dyn ClassBody>, DefineError>;
}

/// Where a [`Class`] was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassOrigin {
    /// Installed from a compiled snippet; `generation` orders redefinitions.
    Installed { generation: u64 },
    /// Provided by the embedding process.
    Host,
    /// Read from a search-path directory or archive.
    SearchPath { entry: PathBuf },
}

/// A live class.
#[derive(Debug)]
pub struct Class {
    name: String,
    origin: ClassOrigin,
    body: Arc<dyn ClassBody>,
    members: OnceLock<Vec<String>>,
}

impl Class {
    pub fn new(name: impl Into<String>, origin: ClassOrigin, body: Arc<dyn ClassBody>) -> Self {
        Class {
            name: name.into(),
            origin,
            body,
            members: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &ClassOrigin {
        &self.origin
    }

    pub fn body(&self) -> &dyn ClassBody {
        &*self.body
    }

    /// Borrow the body as the concrete type its definer produced.
    pub fn downcast_body<T: 'static>(&self) -> Option<&T> {
        self.body.as_any().downcast_ref::<T>()
    }

    /// Resolve member signatures, once.
    pub fn prepare(&self) -> Result<&[String], LinkError> {
        if let Some(members) = self.members.get() {
            return Ok(members);
        }
        let members = self.body.declared_members()?;
        Ok(self.members.get_or_init(|| members))
    }

    pub fn is_prepared(&self) -> bool {
        self.members.get().is_some()
    }
}

/// One installed version of a class name.
///
/// Versions are append-only; the newest is the one resolution sees. The
/// live class is defined lazily on first lookup and then reused.
#[derive(Debug)]
pub struct InstalledClass {
    pub(crate) bytecode: Vec<u8>,
    pub(crate) generation: u64,
    pub(crate) resolved: OnceLock<Arc<Class>>,
}

impl InstalledClass {
    pub(crate) fn new(bytecode: Vec<u8>, generation: u64) -> Self {
        InstalledClass {
            bytecode,
            generation,
            resolved: OnceLock::new(),
        }
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The live class, if this version has been looked up.
    pub fn resolved(&self) -> Option<&Arc<Class>> {
        self.resolved.get()
    }
}
