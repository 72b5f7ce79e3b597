//! Classes the embedding process provides.
//!
//! The registry is shared by every evaluator in the process, so it lives
//! behind a lock and is handed around as [`SharedHostRegistry`].

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::class::{Class, ClassBody, ClassOrigin};
use crate::errors::LinkError;
use crate::throwable::ExceptionType;

pub type SharedHostRegistry = Arc<HostRegistry>;

/// Body of a plain host class: a fixed member list.
#[derive(Clone, Debug, Default)]
pub struct HostClass {
    members: Vec<String>,
}

impl HostClass {
    pub fn new(members: Vec<String>) -> Self {
        HostClass { members }
    }
}

impl ClassBody for HostClass {
    fn declared_members(&self) -> Result<Vec<String>, LinkError> {
        Ok(self.members.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Name-keyed table of host classes.
#[derive(Debug, Default)]
pub struct HostRegistry {
    classes: RwLock<FxHashMap<String, Arc<Class>>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        HostRegistry::default()
    }

    pub fn shared() -> SharedHostRegistry {
        Arc::new(HostRegistry::new())
    }

    /// Register `body` under `name`, replacing any earlier class.
    pub fn register(&self, name: &str, body: Arc<dyn ClassBody>) -> Arc<Class> {
        let class = Arc::new(Class::new(name, ClassOrigin::Host, body));
        self.classes
            .write()
            .insert(name.to_owned(), Arc::clone(&class));
        class
    }

    pub fn register_exception(&self, ty: ExceptionType) -> Arc<Class> {
        let name = ty.name().to_owned();
        self.register(&name, Arc::new(ty))
    }

    pub fn find(&self, name: &str) -> Option<Arc<Class>> {
        self.classes.read().get(name).cloned()
    }

    /// Look up `name` as a throwable type.
    ///
    /// Returns `None` when the name is unknown or names a non-exception class.
    pub fn exception_type(&self, name: &str) -> Option<Arc<Class>> {
        self.find(name)
            .filter(|class| class.downcast_body::<ExceptionType>().is_some())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}
