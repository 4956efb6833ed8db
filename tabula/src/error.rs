use alloc::boxed::Box;
use alloc::string::String;
use core::alloc::Layout;
use core::fmt::Write as _;

use owo_colors::OwoColorize;
use tabula_core::Shape;

use crate::{FieldName, NotIntrospectableReason};

/// Errors that can occur while building a default instance.
///
/// Any failure aborts the whole request: no partially built value is ever returned.
#[derive(Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum BuildError {
    /// No registered capability applies and no field layout is available for the type.
    UnbuildableType {
        /// The type that could not be built.
        shape: &'static Shape,
        /// Why its layout could not be used.
        reason: NotIntrospectableReason,
    },

    /// Allocating storage for a value failed.
    OutOfMemory {
        /// The type being built.
        shape: &'static Shape,
        /// The layout that could not be allocated.
        layout: Layout,
    },

    /// Building one of the fields of an aggregate failed.
    FieldBuildFailure {
        /// The aggregate being built.
        parent: &'static Shape,
        /// Zero-based position of the field, in the order the layout reported it.
        position: usize,
        /// Name of the field.
        field: FieldName,
        /// What went wrong while building the field.
        inner: Box<BuildError>,
    },

    /// A value had a different type than the one requested.
    TypeMismatch {
        /// The type that was requested.
        expected: &'static Shape,
        /// The type that was produced.
        actual: &'static Shape,
    },

    /// The reported layout cannot be written safely.
    LayoutViolation {
        /// The aggregate being built.
        shape: &'static Shape,
        /// The offending field, if the violation concerns one field.
        field: Option<FieldName>,
        /// Offset of the offending field.
        offset: usize,
        /// What exactly is wrong.
        violation: Violation,
    },

    /// The type contains itself through its fields.
    CyclicType {
        /// The type that was re-entered.
        shape: &'static Shape,
        /// How many aggregates were in flight when the cycle was found.
        depth: usize,
    },

    /// Nesting went deeper than the configured limit.
    DepthLimitExceeded {
        /// The type that would have exceeded the limit.
        shape: &'static Shape,
        /// The configured limit.
        limit: usize,
    },
}

/// How a reported layout violates the memory of the value being built.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum Violation {
    /// The field ends past the end of the aggregate.
    OutOfBounds {
        /// One past the last byte the field would occupy.
        end: usize,
        /// Size of the aggregate.
        size: usize,
    },

    /// The field's address is not a multiple of its alignment.
    Misaligned {
        /// Alignment the field's type requires.
        align: usize,
    },

    /// The field shares bytes with a field written before it.
    Overlap {
        /// The field written earlier.
        with: FieldName,
    },

    /// The size or alignment reported for the aggregate differs from its real layout.
    LayoutMismatch {
        /// Reported size.
        size: usize,
        /// Reported alignment.
        align: usize,
    },
}

impl BuildError {
    /// Walks nested [`BuildError::FieldBuildFailure`]s down to the error that started it all.
    pub fn root_cause(&self) -> &BuildError {
        let mut current = self;
        while let BuildError::FieldBuildFailure { inner, .. } = current {
            current = inner;
        }
        current
    }

    /// Renders the path to the failing field, e.g. `Outer.inner.x` or `Grid.cells[3]`.
    ///
    /// Returns `None` unless this is a [`BuildError::FieldBuildFailure`].
    pub fn field_path(&self) -> Option<String> {
        let BuildError::FieldBuildFailure { parent, .. } = self else {
            return None;
        };

        let mut path = String::new();
        let _ = write!(path, "{}", parent.type_identifier);

        let mut current = self;
        while let BuildError::FieldBuildFailure { field, inner, .. } = current {
            let _ = match field {
                FieldName::Index(index) => write!(path, "[{index}]"),
                _ => write!(path, ".{field}"),
            };
            current = inner;
        }
        Some(path)
    }
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BuildError::UnbuildableType { shape, reason } => {
                write!(f, "Cannot build a default {}: {}", shape.red(), reason)
            }
            BuildError::OutOfMemory { shape, layout } => write!(
                f,
                "Out of memory while allocating {} bytes (align {}) for {}",
                layout.size(),
                layout.align(),
                shape.blue()
            ),
            BuildError::FieldBuildFailure { .. } => {
                let path = self.field_path().unwrap_or_default();
                write!(f, "Cannot build field {}: {}", path.yellow(), self.root_cause())
            }
            BuildError::TypeMismatch { expected, actual } => write!(
                f,
                "Wrong shape: expected {}, but got {}",
                expected.green(),
                actual.red()
            ),
            BuildError::LayoutViolation {
                shape,
                field,
                offset,
                violation,
            } => {
                write!(f, "Invalid layout for {}", shape.blue())?;
                if let Some(field) = field {
                    write!(f, " at field {} (offset {offset})", field.yellow())?;
                }
                write!(f, ": {violation}")
            }
            BuildError::CyclicType { shape, depth } => write!(
                f,
                "{} contains itself ({} levels deep); it has no finite default",
                shape.red(),
                depth
            ),
            BuildError::DepthLimitExceeded { shape, limit } => write!(
                f,
                "Building {} would nest deeper than the limit of {}",
                shape.red(),
                limit
            ),
        }
    }
}

impl core::error::Error for BuildError {}

impl core::fmt::Display for Violation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Violation::OutOfBounds { end, size } => {
                write!(f, "field ends at byte {end}, past the size of {size}")
            }
            Violation::Misaligned { align } => {
                write!(f, "field is not aligned to {align}")
            }
            Violation::Overlap { with } => write!(f, "field overlaps field {with}"),
            Violation::LayoutMismatch { size, align } => write!(
                f,
                "reported size {size} and alignment {align} differ from the type's own"
            ),
        }
    }
}

/// Errors raised while filling a [`Registry`](crate::Registry).
#[derive(Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum RegistryError {
    /// `register_absent` was called for a type with no absent value.
    NoAbsentValue {
        /// The type that was registered.
        shape: &'static Shape,
    },
}

impl core::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RegistryError::NoAbsentValue { shape } => write!(
                f,
                "{} has no absent value; use register_absent_with to supply one",
                shape.red()
            ),
        }
    }
}

impl core::error::Error for RegistryError {}
