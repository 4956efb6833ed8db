//! Field layouts: where the factory learns what an aggregate is made of.

use alloc::vec::Vec;
use core::alloc::Layout;

use log::trace;
use owo_colors::OwoColorize;
use tabula_core::{
    ArrayType, Def, NewIntoFn, SequenceType, Shape, StructKind, StructType, Type, UserType,
};

/// The name of a field inside an aggregate.
///
/// Names are informational only: fields are always addressed by offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FieldName {
    /// A declared identifier: `x` for a named field, `0` for a tuple field.
    Named(&'static str),
    /// An element of an array.
    Index(usize),
    /// The value behind a smart pointer.
    Pointee,
}

impl core::fmt::Display for FieldName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FieldName::Named(name) => f.write_str(name),
            FieldName::Index(index) => write!(f, "{index}"),
            FieldName::Pointee => f.write_str("*"),
        }
    }
}

/// One field of an aggregate, as reported by an [`Introspect`] provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Name of the field
    pub name: FieldName,
    /// Type of the field
    pub shape: &'static Shape,
    /// Byte offset of the field from the start of the aggregate
    pub offset: usize,
}

impl FieldInfo {
    /// One past the last byte this field occupies.
    #[inline]
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.shape.layout.size())
    }
}

/// Size, alignment and fields of a type. Derived on demand, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    /// Size in bytes
    pub size: usize,
    /// Alignment in bytes
    pub align: usize,
    /// Fields in the order they must be built
    pub fields: Vec<FieldInfo>,
}

impl LayoutInfo {
    /// Returns the layout as a [`Layout`], if size and alignment form a valid one.
    pub fn layout(&self) -> Option<Layout> {
        Layout::from_size_align(self.size, self.align).ok()
    }
}

/// Why a provider declined to report a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotIntrospectableReason {
    /// The type hides its representation (enums, heap-owning containers, handles).
    Opaque,
    /// The type declares invariants that zeroed fields could break.
    Invariants,
    /// The field-by-field value was built but fails the type's invariants.
    InvariantsViolated,
    /// The provider refused, for its own reasons.
    Declined(&'static str),
}

impl core::fmt::Display for NotIntrospectableReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NotIntrospectableReason::Opaque => {
                f.write_str("its layout is opaque and no constructor is registered")
            }
            NotIntrospectableReason::Invariants => {
                f.write_str("it declares invariants and no constructor is registered")
            }
            NotIntrospectableReason::InvariantsViolated => {
                f.write_str("the value built from its fields violates its invariants")
            }
            NotIntrospectableReason::Declined(why) => write!(f, "{why}"),
        }
    }
}

/// A provider could not describe the layout of `shape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotIntrospectable {
    /// The type in question
    pub shape: &'static Shape,
    /// Why
    pub reason: NotIntrospectableReason,
}

impl core::fmt::Display for NotIntrospectable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} is not introspectable: {}", self.shape.red(), self.reason)
    }
}

impl core::error::Error for NotIntrospectable {}

/// How to build a smart pointer: build the pointee, then move it in with `new_into`.
#[derive(Debug, Clone, Copy)]
pub struct PointerInfo {
    /// Type of the value behind the pointer
    pub pointee: &'static Shape,
    /// Moves an initialized pointee into freshly constructed pointer storage
    pub new_into: NewIntoFn,
}

/// Reports the field layout of types.
///
/// The factory writes every reported field at its reported offset and then treats the
/// memory as a value of the aggregate type.
///
/// # Safety
///
/// For every shape an implementation returns `Ok` for, the reported size and alignment
/// must match the shape's layout, and writing a valid value of each field's shape at
/// its offset (with all other bytes zero) must produce a valid value of the aggregate.
/// `pointer_of` must only return a `new_into` that constructs a valid `shape` from a
/// valid `pointee`. Answers must be the same every time for the same shape.
pub unsafe trait Introspect: Send + Sync {
    /// Reports the layout of `shape`, or why it has none the factory may use.
    fn layout_of(&self, shape: &'static Shape) -> Result<LayoutInfo, NotIntrospectable>;

    /// Reports how to construct `shape` around a pointee, if it is a smart pointer.
    fn pointer_of(&self, shape: &'static Shape) -> Option<PointerInfo> {
        let _ = shape;
        None
    }
}

/// The default provider: reads layouts straight out of [`Shape`] descriptors.
///
/// - primitives have no fields; their all-zero bit pattern is their default
/// - structs, tuple structs, unit structs and tuples report their declared fields
/// - arrays `[T; N]` report `N` elements
/// - opaque types and types with invariants are declined
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeIntrospector;

// SAFETY: every layout comes from a `Describe` impl, whose safety contract already
// requires offsets and field shapes to be the real ones.
unsafe impl Introspect for ShapeIntrospector {
    fn layout_of(&self, shape: &'static Shape) -> Result<LayoutInfo, NotIntrospectable> {
        let decline = |reason| Err(NotIntrospectable { shape, reason });

        if shape.vtable.invariants.is_some() {
            return decline(NotIntrospectableReason::Invariants);
        }

        let fields = match shape.ty {
            Type::Primitive(_) => Vec::new(),
            Type::Sequence(SequenceType::Array(ArrayType { t, n })) => {
                let stride = t.layout.size();
                (0..n)
                    .map(|index| FieldInfo {
                        name: FieldName::Index(index),
                        shape: t,
                        offset: index * stride,
                    })
                    .collect()
            }
            Type::User(UserType::Struct(StructType { fields, kind, .. })) => {
                trace!("Reading {} fields of {:?} {}", fields.len(), kind, shape.blue());
                debug_assert!(kind != StructKind::Unit || fields.is_empty());
                fields
                    .iter()
                    .map(|field| FieldInfo {
                        name: FieldName::Named(field.name),
                        shape: field.shape(),
                        offset: field.offset,
                    })
                    .collect()
            }
            Type::User(UserType::Opaque) => return decline(NotIntrospectableReason::Opaque),
            _ => return decline(NotIntrospectableReason::Declined("unsupported kind of type")),
        };

        Ok(LayoutInfo {
            size: shape.layout.size(),
            align: shape.layout.align(),
            fields,
        })
    }

    fn pointer_of(&self, shape: &'static Shape) -> Option<PointerInfo> {
        let Def::SmartPointer(def) = shape.def else {
            return None;
        };
        Some(PointerInfo {
            pointee: def.pointee(),
            new_into: def.vtable.new_into_fn?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{Describe, describe};
    use tabula_testhelpers::test;

    describe! {
        struct Point {
            x: i32,
            y: i32,
        }
    }

    #[test]
    fn struct_fields_in_declared_order() {
        let info = ShapeIntrospector.layout_of(Point::SHAPE)?;
        insta::assert_debug_snapshot!(info.fields.iter().map(|f| (f.name, f.offset)).collect::<Vec<_>>(), @r###"
        [
            (
                Named(
                    "x",
                ),
                0,
            ),
            (
                Named(
                    "y",
                ),
                4,
            ),
        ]
        "###);
        assert_eq!(info.size, 8);
        assert_eq!(info.align, 4);
    }

    #[test]
    fn arrays_report_one_field_per_element() {
        let info = ShapeIntrospector.layout_of(<[u16; 3]>::SHAPE)?;
        let offsets: Vec<_> = info.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, [0, 2, 4]);
        assert!(info.fields.iter().all(|f| f.shape == u16::SHAPE));
        assert_eq!(info.fields[2].name, FieldName::Index(2));
    }

    #[test]
    fn primitives_have_no_fields() {
        let info = ShapeIntrospector.layout_of(u64::SHAPE)?;
        assert!(info.fields.is_empty());
        assert_eq!(info.layout(), Some(Layout::new::<u64>()));
    }

    #[test]
    fn opaque_types_are_declined() {
        let err = ShapeIntrospector
            .layout_of(<Option<u8>>::SHAPE)
            .unwrap_err();
        assert_eq!(err.reason, NotIntrospectableReason::Opaque);
        assert_eq!(err.shape, <Option<u8>>::SHAPE);
    }

    #[test]
    fn smart_pointers_expose_construction() {
        let info = ShapeIntrospector
            .pointer_of(<alloc::boxed::Box<Point>>::SHAPE)
            .unwrap();
        assert_eq!(info.pointee, Point::SHAPE);
        assert!(ShapeIntrospector.pointer_of(Point::SHAPE).is_none());
    }
}
