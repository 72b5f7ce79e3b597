use std::sync::Arc;

use kiln_runtime::{ConstructError, ConstructorArgs, HostClass, StackFrame};
use pretty_assertions::assert_eq;

use super::*;

fn trace() -> Vec<StackFrame> {
    vec![StackFrame::new("#3", "do_it$", Some("#3".into()), Some(1))]
}

fn failing(class: &str, shape: ConstructorShape) -> Result<Exception, ConstructError> {
    Err(ConstructError::Failed {
        class: class.to_owned(),
        shape,
        message: "refused".into(),
    })
}

#[test]
fn test_known_type_is_rebuilt_with_trace() {
    let host = HostRegistry::new();
    host.register_exception(ExceptionType::standard("lang.IllegalStateException"));
    let descriptor = ExceptionDescriptor::new("lang.IllegalStateException", Some("boom".into()))
        .with_stack_trace(trace());

    let Throwable::Native(e) = reconstitute(&descriptor, &host) else {
        panic!("expected a native exception");
    };
    assert_eq!(e.class_name(), "lang.IllegalStateException");
    assert_eq!(e.message(), Some("boom"));
    assert_eq!(e.stack_trace(), trace().as_slice());
}

#[test]
fn test_unknown_type_falls_back_to_descriptor() {
    let host = HostRegistry::new();
    let descriptor = ExceptionDescriptor::new("user.MyError", Some("x".into()));
    assert_eq!(
        reconstitute(&descriptor, &host),
        Throwable::Descriptor(descriptor.clone())
    );
}

#[test]
fn test_non_exception_class_falls_back() {
    let host = HostRegistry::new();
    host.register("lang.Object", Arc::new(HostClass::default()));
    let descriptor = ExceptionDescriptor::new("lang.Object", None);
    assert!(matches!(
        reconstitute(&descriptor, &host),
        Throwable::Descriptor(_)
    ));
}

#[test]
fn test_probe_order_skips_missing_and_failing_shapes() {
    let host = HostRegistry::new();
    // (message, cause) throws, (message) is absent, (cause) works
    let ty = ExceptionType::new("lang.Odd")
        .with_constructor(
            ConstructorShape::MessageCause,
            Arc::new(|class: &str, _: ConstructorArgs| {
                failing(class, ConstructorShape::MessageCause)
            }),
        )
        .with_constructor(
            ConstructorShape::Cause,
            Arc::new(
                |class: &str, args: ConstructorArgs| -> Result<Exception, ConstructError> {
                    Ok(Exception::new(class, Some("via cause".into()), args.cause))
                },
            ),
        );
    host.register_exception(ty);

    let descriptor = ExceptionDescriptor::new("lang.Odd", Some("ignored".into()));
    let Throwable::Native(e) = reconstitute(&descriptor, &host) else {
        panic!("expected a native exception");
    };
    assert_eq!(e.message(), Some("via cause"));
}

#[test]
fn test_all_shapes_failing_falls_back() {
    let host = HostRegistry::new();
    host.register_exception(ExceptionType::new("lang.Sealed"));
    let descriptor = ExceptionDescriptor::new("lang.Sealed", Some("m".into()));
    assert!(matches!(
        reconstitute(&descriptor, &host),
        Throwable::Descriptor(_)
    ));
}

#[test]
fn test_cause_is_rebuilt_recursively() {
    let host = HostRegistry::new();
    host.register_exception(ExceptionType::standard("lang.RuntimeException"));
    host.register_exception(ExceptionType::standard("lang.ArithmeticException"));
    let descriptor = ExceptionDescriptor::new("lang.RuntimeException", Some("outer".into()))
        .with_cause(ExceptionDescriptor::new(
            "lang.ArithmeticException",
            Some("/ by zero".into()),
        ));

    let Throwable::Native(e) = reconstitute(&descriptor, &host) else {
        panic!("expected a native exception");
    };
    let cause = e.cause().map(Throwable::display_name);
    assert_eq!(cause, Some("lang.ArithmeticException"));
}
