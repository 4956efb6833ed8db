use crate::{PtrMut, PtrUninit};

use super::Shape;

/// Describes an `Option<T>`: including a vtable to produce its absent value.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct OptionDef {
    /// vtable for interacting with the option
    pub vtable: &'static OptionVTable,

    /// shape of the inner type of the option
    pub t: fn() -> &'static Shape,
}

impl OptionDef {
    /// Returns a builder for OptionDef
    pub const fn builder() -> OptionDefBuilder {
        OptionDefBuilder::new()
    }

    /// Returns the inner type shape of the option
    pub fn t(&self) -> &'static Shape {
        (self.t)()
    }
}

/// Builder for OptionDef
pub struct OptionDefBuilder {
    vtable: Option<&'static OptionVTable>,
    t: Option<fn() -> &'static Shape>,
}

impl OptionDefBuilder {
    /// Creates a new OptionDefBuilder
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self {
            vtable: None,
            t: None,
        }
    }

    /// Sets the vtable for the OptionDef
    pub const fn vtable(mut self, vtable: &'static OptionVTable) -> Self {
        self.vtable = Some(vtable);
        self
    }

    /// Sets the inner type shape for the OptionDef
    pub const fn t(mut self, t: fn() -> &'static Shape) -> Self {
        self.t = Some(t);
        self
    }

    /// Builds the OptionDef
    pub const fn build(self) -> OptionDef {
        OptionDef {
            vtable: self.vtable.unwrap(),
            t: self.t.unwrap(),
        }
    }
}

/// Initialize an option as `None` in place
///
/// # Safety
///
/// The `option` parameter must point to uninitialized memory of sufficient size and
/// alignment for the option.
pub type OptionInitNoneFn = for<'mem> unsafe fn(option: PtrUninit<'mem>) -> PtrMut<'mem>;

/// Virtual table for `Option<T>`
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct OptionVTable {
    /// cf. [`OptionInitNoneFn`]
    pub init_none_fn: OptionInitNoneFn,
}

impl OptionVTable {
    /// Returns a builder for OptionVTable
    pub const fn builder() -> OptionVTableBuilder {
        OptionVTableBuilder::new()
    }
}

/// Builds an [`OptionVTable`]
pub struct OptionVTableBuilder {
    init_none_fn: Option<OptionInitNoneFn>,
}

impl OptionVTableBuilder {
    /// Creates a new [`OptionVTableBuilder`] with all fields set to `None`.
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self { init_none_fn: None }
    }

    /// Sets the init_none_fn field
    pub const fn init_none(mut self, f: OptionInitNoneFn) -> Self {
        self.init_none_fn = Some(f);
        self
    }

    /// Builds the [`OptionVTable`] from the current state of the builder.
    pub const fn build(self) -> OptionVTable {
        OptionVTable {
            init_none_fn: self.init_none_fn.unwrap(),
        }
    }
}
