use core::any::TypeId;

/// A [`TypeId`] that can be stored in a `const`.
///
/// `TypeId::of` is not callable in const contexts, but taking it as a function
/// pointer is, so we keep the function around and call it on comparison.
#[derive(Clone, Copy)]
pub struct ConstTypeId {
    type_id_fn: fn() -> TypeId,
}

impl ConstTypeId {
    /// Returns the id of type `T`
    pub const fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id_fn: TypeId::of::<T>,
        }
    }

    /// Returns the underlying [`TypeId`]
    #[inline]
    pub fn get(self) -> TypeId {
        (self.type_id_fn)()
    }
}

impl core::fmt::Debug for ConstTypeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.get(), f)
    }
}

impl PartialEq for ConstTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for ConstTypeId {}

impl PartialOrd for ConstTypeId {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConstTypeId {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.get().cmp(&other.get())
    }
}

impl core::hash::Hash for ConstTypeId {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}
