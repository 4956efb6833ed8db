use log::trace;
use owo_colors::OwoColorize;
use tabula_core::Shape;

use super::{Descent, Factory};
use crate::registry::Constructor;
use crate::{BuildError, FieldName, HeapValue, PointerInfo};

impl Factory<'_> {
    /// Decides how to build `shape`, first match wins:
    ///
    /// 1. a registered default constructor
    /// 2. a registered absent value
    /// 3. a smart pointer around a default pointee
    /// 4. field by field
    pub(crate) fn classify_and_build(
        &self,
        shape: &'static Shape,
        descent: &mut Descent,
    ) -> Result<HeapValue, BuildError> {
        if let Some(constructor) = self.registry.default_constructor(shape) {
            trace!("{} has a default constructor", shape.blue());
            return run(shape, &constructor);
        }

        if let Some(absent) = self.registry.absent_constructor(shape) {
            trace!("{} has an absent value", shape.blue());
            return run(shape, &absent);
        }

        if let Some(pointer) = self.introspector.pointer_of(shape) {
            trace!("{} is a pointer to {}", shape.blue(), pointer.pointee.cyan());
            return self.build_pointer(shape, pointer, descent);
        }

        trace!("Building {} field by field", shape.blue());
        self.build_struct(shape, descent)
    }

    fn build_pointer(
        &self,
        shape: &'static Shape,
        pointer: PointerInfo,
        descent: &mut Descent,
    ) -> Result<HeapValue, BuildError> {
        self.descend(shape, descent, |descent| {
            let pointee = self
                .classify_and_build(pointer.pointee, descent)
                .map_err(|inner| BuildError::FieldBuildFailure {
                    parent: shape,
                    position: 0,
                    field: FieldName::Pointee,
                    inner: inner.into(),
                })?;
            // SAFETY: the introspector vouches that `new_into` builds a `shape` from a
            // `pointer.pointee`, which is what `classify_and_build` returned
            unsafe { pointee.into_pointer(shape, pointer.new_into) }
        })
    }
}

/// Runs a registered constructor and checks that it produced a `shape`.
fn run(shape: &'static Shape, constructor: &Constructor) -> Result<HeapValue, BuildError> {
    let value = constructor.construct(shape)?;
    if value.shape() != shape {
        return Err(BuildError::TypeMismatch {
            expected: shape,
            actual: value.shape(),
        });
    }
    Ok(value)
}
