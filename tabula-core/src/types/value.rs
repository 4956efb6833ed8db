use crate::ptr::{PtrConst, PtrMut, PtrUninit};
use core::{marker::PhantomData, mem};

//======== Type Information ========

/// A function that formats the name of a type.
///
/// This helps avoid allocations.
pub type TypeNameFn = fn(f: &mut core::fmt::Formatter) -> core::fmt::Result;

//======== Invariants ========

/// Function to validate the invariants of a value. If it returns false, the value is considered invalid.
///
/// # Safety
///
/// The `value` parameter must point to aligned, initialized memory of the correct type.
pub type InvariantsFn = for<'mem> unsafe fn(value: PtrConst<'mem>) -> bool;
/// Function to validate the invariants of a value. If it returns false, the value is considered invalid.
pub type InvariantsFnTyped<T> = fn(value: &T) -> bool;

//======== Memory Management ========

/// Function to drop a value
///
/// # Safety
///
/// The `value` parameter must point to aligned, initialized memory of the correct type.
/// After calling this function, the memory pointed to by `value` should not be accessed again
/// until it is properly reinitialized.
pub type DropInPlaceFn = for<'mem> unsafe fn(value: PtrMut<'mem>) -> PtrUninit<'mem>;

/// Function to set a value to its default in-place
///
/// # Safety
///
/// The `target` parameter has the correct layout and alignment, but points to
/// uninitialized memory. The function returns the same pointer wrapped in an [`PtrMut`].
pub type DefaultInPlaceFn = for<'mem> unsafe fn(target: PtrUninit<'mem>) -> PtrMut<'mem>;

/// Writes `T::default()` into `target`.
///
/// Coerces to [`DefaultInPlaceFn`]; used by descriptors and by registries that record
/// `Default` implementations.
///
/// # Safety
///
/// `target` must be aligned for `T` and valid for writes of `size_of::<T>()` bytes.
pub unsafe fn default_in_place<T: Default>(target: PtrUninit<'_>) -> PtrMut<'_> {
    unsafe { target.put(T::default()) }
}

unsafe fn drop_in_place_typed<T>(value: PtrMut<'_>) -> PtrUninit<'_> {
    unsafe { value.drop_in_place::<T>() }
}

//======== VTable ========

/// Virtual table for every shape: everything the factory needs to manage a value
/// without knowing its static type.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct ValueVTable {
    /// cf. [`TypeNameFn`]
    pub type_name: TypeNameFn,

    /// cf. [`DropInPlaceFn`]; if None, drops without side-effects
    pub drop_in_place: Option<DropInPlaceFn>,

    /// cf. [`DefaultInPlaceFn`]; set when the type implements `Default` and its
    /// descriptor chose to expose it
    pub default_in_place: Option<DefaultInPlaceFn>,

    /// cf. [`InvariantsFn`]; a type with invariants cannot be synthesized field by field
    pub invariants: Option<InvariantsFn>,
}

impl ValueVTable {
    /// Creates a new [`ValueVTableBuilder`]
    pub const fn builder<T>() -> ValueVTableBuilder<T> {
        ValueVTableBuilder::new()
    }

    /// Returns true if values of this type have drop glue
    #[inline]
    pub fn needs_drop(&self) -> bool {
        self.drop_in_place.is_some()
    }
}

/// Builds a [`ValueVTable`]
pub struct ValueVTableBuilder<T> {
    type_name: Option<TypeNameFn>,
    drop_in_place: Option<DropInPlaceFn>,
    default_in_place: Option<DefaultInPlaceFn>,
    invariants: Option<InvariantsFn>,
    _pd: PhantomData<T>,
}

impl<T> ValueVTableBuilder<T> {
    /// Creates a new [`ValueVTableBuilder`] with all fields set to `None`, except
    /// `drop_in_place`, which is derived from [`mem::needs_drop`].
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self {
            type_name: None,
            drop_in_place: if mem::needs_drop::<T>() {
                Some(drop_in_place_typed::<T>)
            } else {
                None
            },
            default_in_place: None,
            invariants: None,
            _pd: PhantomData,
        }
    }

    /// Sets the type name function for this builder.
    pub const fn type_name(mut self, type_name: TypeNameFn) -> Self {
        self.type_name = Some(type_name);
        self
    }

    /// Sets the default_in_place function for this builder.
    pub const fn default_in_place(mut self, default_in_place: DefaultInPlaceFn) -> Self {
        self.default_in_place = Some(default_in_place);
        self
    }

    /// Sets the invariants function for this builder.
    pub const fn invariants(mut self, invariants: InvariantsFnTyped<T>) -> Self {
        self.invariants = Some(unsafe {
            mem::transmute::<InvariantsFnTyped<T>, InvariantsFn>(invariants)
        });
        self
    }

    /// Builds the [`ValueVTable`]
    ///
    /// # Panics
    ///
    /// Panics if no type name function was set.
    pub const fn build(self) -> ValueVTable {
        ValueVTable {
            type_name: self.type_name.unwrap(),
            drop_in_place: self.drop_in_place,
            default_in_place: self.default_in_place,
            invariants: self.invariants,
        }
    }
}
