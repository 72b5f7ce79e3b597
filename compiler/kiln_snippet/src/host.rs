//! The host classes snippet code can see without any declaration.

use std::sync::Arc;

use kiln_runtime::{ExceptionType, HostClass, HostRegistry, SharedHostRegistry};

use crate::checker::OBJECT_CLASS;

pub const ARITHMETIC_EXCEPTION: &str = "lang.ArithmeticException";
pub const NULL_POINTER_EXCEPTION: &str = "lang.NullPointerException";
pub const STACK_OVERFLOW_ERROR: &str = "lang.StackOverflowError";

/// Throwable types available to every session.
pub const STANDARD_EXCEPTIONS: &[&str] = &[
    "lang.Exception",
    "lang.RuntimeException",
    "lang.IllegalStateException",
    "lang.IllegalArgumentException",
    ARITHMETIC_EXCEPTION,
    "lang.UnsupportedOperationException",
    NULL_POINTER_EXCEPTION,
    STACK_OVERFLOW_ERROR,
];

/// Register `lang.Object` and the standard exception types.
pub fn register_standard_classes(registry: &HostRegistry) {
    registry.register(
        OBJECT_CLASS,
        Arc::new(HostClass::new(vec![
            "<init>()".to_owned(),
            "toString()".to_owned(),
        ])),
    );
    for name in STANDARD_EXCEPTIONS {
        registry.register_exception(ExceptionType::standard(*name));
    }
}

/// A fresh shared registry holding the standard classes.
pub fn standard_host_registry() -> SharedHostRegistry {
    let registry = HostRegistry::shared();
    register_standard_classes(&registry);
    registry
}
