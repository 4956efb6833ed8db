use log::trace;
use owo_colors::OwoColorize;
use tabula_core::Shape;

use super::{Descent, Factory};
use crate::scratch::ScratchRegion;
use crate::{BuildError, HeapValue, NotIntrospectableReason, Violation};

impl Factory<'_> {
    /// Builds `shape` by building each of its fields into a zeroed scratch region.
    ///
    /// Fails before allocating anything if the layout is unavailable or does not match
    /// the type. On a field failure the region is released, dropping the fields already
    /// written; nothing partial escapes.
    pub(crate) fn build_struct(
        &self,
        shape: &'static Shape,
        descent: &mut Descent,
    ) -> Result<HeapValue, BuildError> {
        let info = self
            .introspector
            .layout_of(shape)
            .map_err(|e| BuildError::UnbuildableType {
                shape,
                reason: e.reason,
            })?;

        if info.size != shape.layout.size() || info.align != shape.layout.align() {
            return Err(BuildError::LayoutViolation {
                shape,
                field: None,
                offset: 0,
                violation: Violation::LayoutMismatch {
                    size: info.size,
                    align: info.align,
                },
            });
        }

        self.descend(shape, descent, |descent| {
            let mut scratch = ScratchRegion::acquire(shape)?;

            for (position, field) in info.fields.iter().enumerate() {
                self.resolve_field(field, &mut scratch, descent)
                    .map_err(|inner| BuildError::FieldBuildFailure {
                        parent: shape,
                        position,
                        field: field.name,
                        inner: inner.into(),
                    })?;
            }
            debug_assert_eq!(scratch.written(), info.fields.len());

            // SAFETY: every field the introspector reported was written, and the
            // introspector vouches that this makes a valid `shape`
            let value = unsafe { scratch.freeze() };

            if let Some(invariants) = shape.vtable.invariants {
                // SAFETY: `value` is a fully initialized `shape`
                if !unsafe { invariants(value.as_const()) } {
                    trace!("{} built from fields fails its invariants", shape.red());
                    return Err(BuildError::UnbuildableType {
                        shape,
                        reason: NotIntrospectableReason::InvariantsViolated,
                    });
                }
            }

            trace!("Built {} from {} field(s)", shape.green(), info.fields.len());
            Ok(value)
        })
    }
}
