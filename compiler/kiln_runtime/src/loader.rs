//! The class install bridge.
//!
//! # Resolution Order
//!
//! [`ClassLoader::find_class`] tries each [`ResolutionTier`] in turn:
//! 1. Installed bytecode (newest version of the name, defined once, cached)
//! 2. Host classes from the [`HostRegistry`](crate::HostRegistry), returned as is
//! 3. The [`SearchPath`], in entry order
//!
//! Installed versions are append-only. Redefining a name adds a generation;
//! the old one stays reachable through [`ClassLoader::versions`] but is never
//! returned by resolution again.

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::class::{Class, ClassBytes, ClassDefiner, ClassOrigin, InstalledClass};
use crate::errors::{ClassInstallError, LoaderError};
use crate::host::SharedHostRegistry;
use crate::search_path::SearchPath;

/// Where [`ClassLoader::find_class`] looks, in priority order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionTier {
    Installed,
    Host,
    SearchPath,
}

impl ResolutionTier {
    pub const ORDER: [ResolutionTier; 3] = [
        ResolutionTier::Installed,
        ResolutionTier::Host,
        ResolutionTier::SearchPath,
    ];
}

/// Per-session class space.
pub struct ClassLoader {
    definer: Arc<dyn ClassDefiner>,
    host: SharedHostRegistry,
    installed: FxHashMap<String, Vec<InstalledClass>>,
    search_path: SearchPath,
    from_search_path: FxHashMap<String, Arc<Class>>,
    next_generation: u64,
    defined: usize,
}

impl ClassLoader {
    pub fn new(definer: Arc<dyn ClassDefiner>, host: SharedHostRegistry) -> Self {
        ClassLoader {
            definer,
            host,
            installed: FxHashMap::default(),
            search_path: SearchPath::new(),
            from_search_path: FxHashMap::default(),
            next_generation: 1,
            defined: 0,
        }
    }

    pub fn host(&self) -> &SharedHostRegistry {
        &self.host
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Record bytecode for every class in `classes` without loading any.
    ///
    /// Bytes identical to a name's newest version are not stored again.
    pub fn declare(&mut self, classes: &[ClassBytes]) {
        for class in classes {
            let versions = self.installed.entry(class.name.clone()).or_default();
            if versions
                .last()
                .is_some_and(|latest| latest.bytecode == class.bytes)
            {
                trace!(class = %class.name, "bytecode unchanged, keeping version");
                continue;
            }
            let generation = self.next_generation;
            self.next_generation += 1;
            debug!(class = %class.name, generation, "declared class version");
            versions.push(InstalledClass::new(class.bytes.clone(), generation));
        }
    }

    /// Declare a batch, then load and prepare each member in order.
    ///
    /// Stops at the first class that fails. A class counts as loaded once it
    /// is defined, even if preparing it then fails; the error reports which
    /// batch members got that far.
    pub fn install(&mut self, classes: &[ClassBytes]) -> Result<Vec<Arc<Class>>, ClassInstallError> {
        self.declare(classes);

        let names: Vec<String> = classes.iter().map(|c| c.name.clone()).collect();
        let mut loaded = vec![false; classes.len()];
        let mut live = Vec::with_capacity(classes.len());
        for (index, class) in classes.iter().enumerate() {
            let result = self.find_installed(&class.name).and_then(|live_class| {
                loaded[index] = true;
                live_class.prepare().map_err(|source| LoaderError::Link {
                    name: class.name.clone(),
                    source,
                })?;
                Ok(live_class)
            });
            match result {
                Ok(live_class) => live.push(live_class),
                Err(e) => {
                    warn!(class = %class.name, error = %e, "class install failed");
                    return Err(ClassInstallError::new(e.to_string(), names, loaded));
                }
            }
        }
        debug!(count = live.len(), "installed classes");
        Ok(live)
    }

    /// Resolve `name` through every tier.
    pub fn find_class(&mut self, name: &str) -> Result<Arc<Class>, LoaderError> {
        for tier in ResolutionTier::ORDER {
            if let Some(class) = self.resolve_in(tier, name)? {
                trace!(class = name, ?tier, "resolved");
                return Ok(class);
            }
        }
        Err(LoaderError::ClassNotFound(name.to_owned()))
    }

    /// Resolve `name` among installed classes only.
    pub fn find_installed(&mut self, name: &str) -> Result<Arc<Class>, LoaderError> {
        self.load_installed(name)?
            .ok_or_else(|| LoaderError::ClassNotFound(name.to_owned()))
    }

    /// Append every entry of a platform path list to the search path.
    pub fn extend_search_path(&mut self, paths: &str) -> Result<(), LoaderError> {
        if paths.trim().is_empty() {
            return Err(LoaderError::EmptySearchPath);
        }
        for path in std::env::split_paths(paths) {
            if path.as_os_str().is_empty() {
                continue;
            }
            self.search_path.push(path);
        }
        Ok(())
    }

    pub fn add_search_entry(&mut self, path: PathBuf) {
        self.search_path.push(path);
    }

    /// Every installed version of `name`, oldest first.
    pub fn versions(&self, name: &str) -> &[InstalledClass] {
        self.installed.get(name).map_or(&[], Vec::as_slice)
    }

    /// How many times installed bytecode has been turned into a live class.
    pub fn defined_count(&self) -> usize {
        self.defined
    }

    fn resolve_in(
        &mut self,
        tier: ResolutionTier,
        name: &str,
    ) -> Result<Option<Arc<Class>>, LoaderError> {
        match tier {
            ResolutionTier::Installed => self.load_installed(name),
            ResolutionTier::Host => Ok(self.host.find(name)),
            ResolutionTier::SearchPath => self.load_from_search_path(name),
        }
    }

    fn load_installed(&mut self, name: &str) -> Result<Option<Arc<Class>>, LoaderError> {
        let Some(version) = self.installed.get(name).and_then(|v| v.last()) else {
            return Ok(None);
        };
        if let Some(class) = version.resolved.get() {
            return Ok(Some(Arc::clone(class)));
        }

        let body = self
            .definer
            .define(name, &version.bytecode)
            .map_err(|source| LoaderError::Define {
                name: name.to_owned(),
                source,
            })?;
        let origin = ClassOrigin::Installed {
            generation: version.generation,
        };
        let class = Arc::clone(
            version
                .resolved
                .get_or_init(|| Arc::new(Class::new(name, origin, body))),
        );
        self.defined += 1;
        Ok(Some(class))
    }

    fn load_from_search_path(&mut self, name: &str) -> Result<Option<Arc<Class>>, LoaderError> {
        if let Some(class) = self.from_search_path.get(name) {
            return Ok(Some(Arc::clone(class)));
        }
        let Some((bytes, entry)) = self.search_path.find(name) else {
            return Ok(None);
        };
        let body = self
            .definer
            .define(name, &bytes.bytes)
            .map_err(|source| LoaderError::Define {
                name: name.to_owned(),
                source,
            })?;
        let class = Arc::new(Class::new(name, ClassOrigin::SearchPath { entry }, body));
        self.from_search_path
            .insert(name.to_owned(), Arc::clone(&class));
        Ok(Some(class))
    }
}

impl std::fmt::Debug for ClassLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassLoader")
            .field("installed", &self.installed.len())
            .field("search_path", &self.search_path.len())
            .field("defined", &self.defined)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
