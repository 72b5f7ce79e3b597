#![allow(clippy::unwrap_used)]

use std::any::Any;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::archive::ClassArchive;
use crate::class::ClassBody;
use crate::errors::{DefineError, LinkError};
use crate::host::{HostClass, HostRegistry};

/// First byte picks the behaviour: 0 refuses to define, 1 fails to link,
/// anything else is a healthy class.
struct ByteDefiner;

#[derive(Debug)]
struct ByteBody(Vec<u8>);

impl ClassBody for ByteBody {
    fn declared_members(&self) -> Result<Vec<String>, LinkError> {
        if self.0.first() == Some(&1) {
            return Err(LinkError::new("unresolved type"));
        }
        Ok(vec![format!("len{}", self.0.len())])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ClassDefiner for ByteDefiner {
    fn define(&self, _name: &str, bytes: &[u8]) -> Result<Arc<dyn ClassBody>, DefineError> {
        if bytes.first() == Some(&0) {
            return Err(DefineError::new("malformed"));
        }
        Ok(Arc::new(ByteBody(bytes.to_vec())))
    }
}

fn loader() -> ClassLoader {
    ClassLoader::new(Arc::new(ByteDefiner), HostRegistry::shared())
}

fn bytes_of(class: &Class) -> Vec<u8> {
    class.downcast_body::<ByteBody>().unwrap().0.clone()
}

#[test]
fn test_install_loads_and_prepares() {
    let mut loader = loader();
    let live = loader
        .install(&[ClassBytes::new("Foo", vec![5]), ClassBytes::new("$1", vec![6])])
        .unwrap();
    assert_eq!(live.len(), 2);
    assert!(live.iter().all(|c| c.is_prepared()));
    assert_eq!(loader.defined_count(), 2);
}

#[test]
fn test_installed_class_is_cached() {
    let mut loader = loader();
    loader.install(&[ClassBytes::new("Foo", vec![5])]).unwrap();

    let a = loader.find_class("Foo").unwrap();
    let b = loader.find_class("Foo").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(loader.defined_count(), 1);
}

#[test]
fn test_redefinition_appends_version() {
    let mut loader = loader();
    loader.install(&[ClassBytes::new("Foo", vec![5])]).unwrap();
    let old = loader.find_class("Foo").unwrap();
    loader.install(&[ClassBytes::new("Foo", vec![5, 5])]).unwrap();
    let new = loader.find_class("Foo").unwrap();

    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(bytes_of(&new), vec![5, 5]);

    let versions = loader.versions("Foo");
    assert_eq!(versions.len(), 2);
    assert!(versions[0].generation() < versions[1].generation());
    assert!(versions[0].resolved().is_some_and(|c| Arc::ptr_eq(c, &old)));
}

#[test]
fn test_identical_bytes_keep_version() {
    let mut loader = loader();
    loader.install(&[ClassBytes::new("Foo", vec![5])]).unwrap();
    let first = loader.find_class("Foo").unwrap();
    loader.install(&[ClassBytes::new("Foo", vec![5])]).unwrap();

    assert_eq!(loader.versions("Foo").len(), 1);
    assert!(Arc::ptr_eq(&first, &loader.find_class("Foo").unwrap()));
}

#[test]
fn test_install_failure_reports_loaded_prefix() {
    let mut loader = loader();
    let err = loader
        .install(&[
            ClassBytes::new("A", vec![5]),
            ClassBytes::new("B", vec![1]),
            ClassBytes::new("C", vec![5]),
        ])
        .unwrap_err();

    // B defined fine and then failed to link
    assert_eq!(err.loaded, vec![true, true, false]);
    assert_eq!(err.loaded_names(), vec!["A", "B"]);
    assert!(err.to_string().starts_with("load: "));
    assert!(err.to_string().contains("unresolved type"));
    assert!(err.to_string().ends_with("(loaded: A, B)"), "{err}");
}

#[test]
fn test_define_failure_is_reported() {
    let mut loader = loader();
    let err = loader.install(&[ClassBytes::new("Bad", vec![0])]).unwrap_err();
    assert_eq!(err.loaded, vec![false]);
    assert!(err.message.contains("malformed"));
    assert!(err.to_string().ends_with("(loaded: none)"), "{err}");
}

#[test]
fn test_installed_shadows_host() {
    let mut loader = loader();
    loader
        .host()
        .register("Shared", Arc::new(HostClass::default()));
    assert_eq!(loader.find_class("Shared").unwrap().origin(), &ClassOrigin::Host);

    loader.install(&[ClassBytes::new("Shared", vec![9])]).unwrap();
    assert!(matches!(
        loader.find_class("Shared").unwrap().origin(),
        ClassOrigin::Installed { .. }
    ));
}

#[test]
fn test_find_installed_ignores_other_tiers() {
    let mut loader = loader();
    loader
        .host()
        .register("HostOnly", Arc::new(HostClass::default()));
    assert!(matches!(
        loader.find_installed("HostOnly"),
        Err(LoaderError::ClassNotFound(_))
    ));
}

#[test]
fn test_search_path_is_last_tier() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.kar");
    ClassArchive::new(vec![ClassBytes::new("util.Box", vec![4, 2])])
        .write(&jar)
        .unwrap();

    let mut loader = loader();
    assert!(loader.find_class("util.Box").is_err());
    loader.extend_search_path(jar.to_str().unwrap()).unwrap();

    let class = loader.find_class("util.Box").unwrap();
    assert_eq!(class.origin(), &ClassOrigin::SearchPath { entry: jar });
    assert!(Arc::ptr_eq(&class, &loader.find_class("util.Box").unwrap()));
}

#[test]
fn test_extend_search_path_splits_platform_list() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let joined = std::env::join_paths([a.path(), b.path()]).unwrap();

    let mut loader = loader();
    loader
        .extend_search_path(joined.to_str().unwrap())
        .unwrap();
    assert_eq!(loader.search_path().len(), 2);
}

#[test]
fn test_extend_search_path_rejects_empty() {
    let mut loader = loader();
    assert!(matches!(
        loader.extend_search_path("  "),
        Err(LoaderError::EmptySearchPath)
    ));
}

#[test]
fn test_unknown_class() {
    let mut loader = loader();
    let err = loader.find_class("Nowhere").unwrap_err();
    assert_eq!(err.to_string(), "Nowhere not found");
}
