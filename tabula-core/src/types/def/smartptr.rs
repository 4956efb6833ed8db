use crate::{PtrMut, PtrUninit};

use super::Shape;

/// Describes a smart pointer: a heap-owning handle to a single pointee.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct SmartPointerDef {
    /// vtable for interacting with the smart pointer
    pub vtable: &'static SmartPointerVTable,

    /// shape of the pointee
    pub pointee: fn() -> &'static Shape,
}

impl SmartPointerDef {
    /// Creates a new `SmartPointerDefBuilder` with all fields set to `None`.
    pub const fn builder() -> SmartPointerDefBuilder {
        SmartPointerDefBuilder::new()
    }

    /// Returns the shape of the pointee
    pub fn pointee(&self) -> &'static Shape {
        (self.pointee)()
    }
}

/// Builder for creating a `SmartPointerDef`.
pub struct SmartPointerDefBuilder {
    vtable: Option<&'static SmartPointerVTable>,
    pointee: Option<fn() -> &'static Shape>,
}

impl SmartPointerDefBuilder {
    /// Creates a new `SmartPointerDefBuilder` with all fields set to `None`.
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self {
            vtable: None,
            pointee: None,
        }
    }

    /// Sets the vtable for the smart pointer.
    pub const fn vtable(mut self, vtable: &'static SmartPointerVTable) -> Self {
        self.vtable = Some(vtable);
        self
    }

    /// Sets the shape of the pointee.
    pub const fn pointee(mut self, pointee: fn() -> &'static Shape) -> Self {
        self.pointee = Some(pointee);
        self
    }

    /// Builds a `SmartPointerDef` from the provided configuration.
    ///
    /// # Panics
    ///
    /// Panics if the vtable or pointee is missing.
    pub const fn build(self) -> SmartPointerDef {
        SmartPointerDef {
            vtable: self.vtable.unwrap(),
            pointee: self.pointee.unwrap(),
        }
    }
}

/// Moves a pointee into a freshly constructed smart pointer.
///
/// # Safety
///
/// `this` must be aligned and valid for writes of the smart pointer's size. `ptr` must
/// point to an initialized value of the pointee type; the value is moved out, so the
/// caller must not drop it afterwards.
pub type NewIntoFn = for<'ptr> unsafe fn(this: PtrUninit<'ptr>, ptr: PtrMut<'ptr>) -> PtrMut<'ptr>;

/// Functions for interacting with a smart pointer
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct SmartPointerVTable {
    /// See [`NewIntoFn`]
    pub new_into_fn: Option<NewIntoFn>,
}

impl SmartPointerVTable {
    /// Creates a new `SmartPointerVTableBuilder` with all fields set to `None`.
    pub const fn builder() -> SmartPointerVTableBuilder {
        SmartPointerVTableBuilder::new()
    }
}

/// Builder for creating a `SmartPointerVTable`.
pub struct SmartPointerVTableBuilder {
    new_into_fn: Option<NewIntoFn>,
}

impl SmartPointerVTableBuilder {
    /// Creates a new `SmartPointerVTableBuilder` with all fields set to `None`.
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self { new_into_fn: None }
    }

    /// Sets the `new_into_fn` field
    pub const fn new_into_fn(mut self, new_into_fn: NewIntoFn) -> Self {
        self.new_into_fn = Some(new_into_fn);
        self
    }

    /// Builds a `SmartPointerVTable` from the provided configuration.
    pub const fn build(self) -> SmartPointerVTable {
        SmartPointerVTable {
            new_into_fn: self.new_into_fn,
        }
    }
}
