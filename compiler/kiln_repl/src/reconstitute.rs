//! Rebuilding live exceptions from descriptors.

use kiln_runtime::{
    ConstructorShape, Exception, ExceptionDescriptor, ExceptionType, HostRegistry, Throwable,
};
use tracing::trace;

/// Rebuild `descriptor` as an exception of its original class.
///
/// The class must be a host exception type. Constructors are tried in
/// [`ConstructorShape::PROBE_ORDER`]; the first that exists and succeeds wins
/// and gets the descriptor's stack trace. Otherwise the descriptor itself is
/// returned. Never fails.
pub fn reconstitute(descriptor: &ExceptionDescriptor, host: &HostRegistry) -> Throwable {
    match rebuild(descriptor, host) {
        Some(exception) => Throwable::Native(exception),
        None => Throwable::Descriptor(descriptor.clone()),
    }
}

fn rebuild(descriptor: &ExceptionDescriptor, host: &HostRegistry) -> Option<Exception> {
    let Some(class) = host.exception_type(&descriptor.class_name) else {
        trace!(class = %descriptor.class_name, "no host exception type");
        return None;
    };
    let ty = class.downcast_body::<ExceptionType>()?;
    let cause = descriptor
        .cause
        .as_deref()
        .map(|cause| reconstitute(cause, host));

    for shape in ConstructorShape::PROBE_ORDER {
        match ty.instantiate(shape, descriptor.message.clone(), cause.clone()) {
            Ok(mut exception) => {
                exception.set_stack_trace(descriptor.stack_trace.clone());
                return Some(exception);
            }
            Err(e) => trace!(error = %e, "constructor probe failed"),
        }
    }
    None
}

#[cfg(test)]
mod tests;
