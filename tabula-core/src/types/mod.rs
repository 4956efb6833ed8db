//! structs and vtable definitions used by tabula

use core::alloc::Layout;

mod value;
pub use value::*;

mod def;
pub use def::*;

mod ty;
pub use ty::*;

use crate::{ConstTypeId, Describe};

/// Schema for reflection of a type: the type descriptor.
///
/// Shapes are compared by [`Shape::id`] only.
#[derive(Clone, Copy)]
#[non_exhaustive]
pub struct Shape {
    /// Unique type identifier, provided by the compiler.
    pub id: ConstTypeId,

    /// Size and alignment: enough to allocate a value of this type
    /// (but not initialize it.)
    pub layout: Layout,

    /// Function pointers to perform various operations: print the full type
    /// name (with generic type parameters), drop a value in place, build a
    /// default value, check invariants.
    pub vtable: &'static ValueVTable,

    /// Underlying type: primitive, sequence, user.
    pub ty: Type,

    /// Functional definition of the value: is it an option, a smart pointer, a list?
    pub def: Def,

    /// Identifier for a type: the type's name without generic parameters. To get the type's full
    /// name with generic parameters, use the `Display` implementation.
    pub type_identifier: &'static str,
}

impl Shape {
    /// Returns a builder for a shape for some type `T`.
    pub const fn builder_for_sized<T: Describe>() -> ShapeBuilder {
        ShapeBuilder::new(T::VTABLE)
            .layout(Layout::new::<T>())
            .id(ConstTypeId::of::<T>())
    }

    /// Check if this shape is of the given type
    pub fn is_type<Other: Describe>(&self) -> bool {
        self == Other::SHAPE
    }

    /// Returns true if a value of this shape occupies no memory
    #[inline]
    pub fn is_zst(&self) -> bool {
        self.layout.size() == 0
    }

    /// Returns the struct definition if this shape is a struct, tuple struct, unit
    /// struct or tuple
    pub fn struct_type(&self) -> Option<&StructType> {
        match &self.ty {
            Type::User(UserType::Struct(st)) => Some(st),
            _ => None,
        }
    }
}

/// Builder for [`Shape`]
pub struct ShapeBuilder {
    id: Option<ConstTypeId>,
    layout: Option<Layout>,
    vtable: &'static ValueVTable,
    def: Def,
    ty: Option<Type>,
    type_identifier: Option<&'static str>,
}

impl ShapeBuilder {
    /// Creates a new `ShapeBuilder` with all fields set to `None`.
    #[allow(clippy::new_without_default)]
    pub const fn new(vtable: &'static ValueVTable) -> Self {
        Self {
            id: None,
            layout: None,
            vtable,
            def: Def::Undefined,
            ty: None,
            type_identifier: None,
        }
    }

    /// Sets the id field of the `ShapeBuilder`.
    #[inline]
    pub const fn id(mut self, id: ConstTypeId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the `layout` field of the `ShapeBuilder`.
    #[inline]
    pub const fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Sets the `def` field of the `ShapeBuilder`.
    #[inline]
    pub const fn def(mut self, def: Def) -> Self {
        self.def = def;
        self
    }

    /// Sets the `ty` field of the `ShapeBuilder`.
    #[inline]
    pub const fn ty(mut self, ty: Type) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Sets the `type_identifier` field of the `ShapeBuilder`.
    #[inline]
    pub const fn type_identifier(mut self, type_identifier: &'static str) -> Self {
        self.type_identifier = Some(type_identifier);
        self
    }

    /// Builds a `Shape` from the `ShapeBuilder`.
    ///
    /// # Panics
    ///
    /// This method will panic if any of the required fields (`id`, `layout`, `type_identifier`, or `ty`) are `None`.
    #[inline]
    pub const fn build(self) -> Shape {
        Shape {
            id: self.id.unwrap(),
            layout: self.layout.unwrap(),
            vtable: self.vtable,
            type_identifier: self.type_identifier.unwrap(),
            def: self.def,
            ty: self.ty.unwrap(),
        }
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Shape {}

impl core::hash::Hash for Shape {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// Helper struct to format the name for display
impl core::fmt::Display for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        (self.vtable.type_name)(f)
    }
}

impl core::fmt::Debug for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut debug_struct = f.debug_struct("Shape");

        // Always show the type name
        debug_struct.field("type", &format_args!("{}", self));

        // Show def if it's not Undefined
        if !matches!(self.def, Def::Undefined) {
            debug_struct.field("def", &format_args!("{:?}", self.def));
        }

        debug_struct.finish()
    }
}
