//! Kiln Runtime - the live class space behind the REPL.
//!
//! Freshly compiled snippets arrive as bytecode units. This crate installs
//! them into the running process and resolves class names for the code that
//! executes afterwards.
//!
//! # Architecture
//!
//! ```text
//!            ClassLoader::find_class(name)
//!                        │
//!   ┌────────────────────┼──────────────────────┐
//!   ▼                    ▼                      ▼
//! installed bytecode   HostRegistry          SearchPath
//! (tier 1, cached)     (tier 2, as is)       (tier 3, dirs + .kar archives)
//! ```
//!
//! - [`ClassLoader`]: the install bridge and three-tier resolver
//! - [`ClassDefiner`]: turns a compiler's bytecode into a live [`Class`]
//! - [`HostRegistry`]: classes the embedding process already provides
//! - [`throwable`]: exception descriptors, live exceptions and the
//!   constructor shapes used to rebuild one from the other
//! - [`ClassArchive`]: the on-disk bundle format for search-path archives

mod archive;
mod class;
mod errors;
mod host;
mod loader;
mod search_path;
pub mod throwable;

pub use archive::{ClassArchive, ARCHIVE_EXTENSION, CLASS_FILE_EXTENSION};
pub use class::{Class, ClassBody, ClassBytes, ClassDefiner, ClassOrigin, InstalledClass};
pub use errors::{ClassInstallError, DefineError, LinkError, LoaderError};
pub use host::{HostClass, HostRegistry, SharedHostRegistry};
pub use loader::{ClassLoader, ResolutionTier};
pub use search_path::{scan_archives, SearchEntry, SearchPath};
pub use throwable::{
    ConstructError, ConstructorArgs, ConstructorFn, ConstructorShape, Exception,
    ExceptionDescriptor, ExceptionType, StackFrame, Throwable, GENERIC_EXCEPTION_NAME,
};
