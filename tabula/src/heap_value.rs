use alloc::alloc::{alloc, dealloc};
use alloc::boxed::Box;
use core::alloc::Layout;

use log::trace;
use owo_colors::OwoColorize;
use tabula_core::{DefaultInPlaceFn, Describe, NewIntoFn, PtrConst, PtrMut, PtrUninit, Shape};

use crate::BuildError;

/// An owned, heap-allocated value whose type is only known through its [`Shape`].
///
/// Dropping it runs the shape's drop glue and frees the storage.
pub struct HeapValue {
    guard: Option<Guard>,
    shape: &'static Shape,
}

/// Owns the storage of a value, but not the value itself: dropping it frees memory
/// without running any drop glue.
pub(crate) struct Guard {
    ptr: *mut u8,
    layout: Layout,
}

impl Guard {
    /// Allocates uninitialized storage for `layout`. Zero-sized layouts get a dangling,
    /// well-aligned pointer and never touch the allocator.
    pub(crate) fn allocate(shape: &'static Shape, layout: Layout) -> Result<Self, BuildError> {
        let ptr = if layout.size() == 0 {
            core::ptr::without_provenance_mut(layout.align())
        } else {
            // SAFETY: size is non-zero
            unsafe { alloc(layout) }
        };
        if ptr.is_null() {
            return Err(BuildError::OutOfMemory { shape, layout });
        }
        Ok(Self { ptr, layout })
    }

    /// # Safety
    ///
    /// `ptr` must come from the global allocator with `layout`, or be dangling and
    /// aligned if `layout` is zero-sized.
    pub(crate) unsafe fn from_raw_parts(ptr: *mut u8, layout: Layout) -> Self {
        Self { ptr, layout }
    }

    pub(crate) fn as_uninit(&self) -> PtrUninit<'_> {
        PtrUninit::new(self.ptr)
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: `ptr` was allocated with `layout`
            unsafe { dealloc(self.ptr, self.layout) }
        }
    }
}

impl HeapValue {
    /// Moves `value` to the heap.
    pub fn new<T: Describe>(value: T) -> Self {
        let ptr = Box::into_raw(Box::new(value)) as *mut u8;
        Self {
            // SAFETY: `Box` allocates with the global allocator and `Layout::new::<T>()`,
            // and uses a dangling aligned pointer for zero-sized types
            guard: Some(unsafe { Guard::from_raw_parts(ptr, Layout::new::<T>()) }),
            shape: T::SHAPE,
        }
    }

    /// Allocates storage for `shape` and initializes it with `init`.
    ///
    /// # Safety
    ///
    /// `init` must write a valid value of `shape` into the storage it is given.
    pub unsafe fn alloc_with(
        shape: &'static Shape,
        init: DefaultInPlaceFn,
    ) -> Result<Self, BuildError> {
        let guard = Guard::allocate(shape, shape.layout)?;
        // if `init` unwinds, `guard` frees the storage
        unsafe { init(guard.as_uninit()) };
        Ok(Self {
            guard: Some(guard),
            shape,
        })
    }

    /// # Safety
    ///
    /// `guard` must hold a fully initialized value of `shape`.
    pub(crate) unsafe fn from_guard(guard: Guard, shape: &'static Shape) -> Self {
        Self {
            guard: Some(guard),
            shape,
        }
    }

    /// The type of the value.
    #[inline]
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    fn expect_shape<T: Describe>(&self) -> Result<(), BuildError> {
        if self.shape != T::SHAPE {
            return Err(BuildError::TypeMismatch {
                expected: T::SHAPE,
                actual: self.shape,
            });
        }
        Ok(())
    }

    /// Turns this into a concrete `T`, if that is its type.
    pub fn materialize<T: Describe>(mut self) -> Result<T, BuildError> {
        self.expect_shape::<T>()?;
        let Some(guard) = self.guard.take() else {
            unreachable!("a HeapValue always owns its storage until consumed")
        };
        // SAFETY: the shape matches, and the storage is freed (not dropped) right after
        Ok(unsafe { PtrConst::new(guard.ptr as *const T).read::<T>() })
    }

    /// Turns this into a `Box<T>`, reusing the allocation, if `T` is its type.
    pub fn into_box<T: Describe>(mut self) -> Result<Box<T>, BuildError> {
        self.expect_shape::<T>()?;
        let Some(guard) = self.guard.take() else {
            unreachable!("a HeapValue always owns its storage until consumed")
        };
        let ptr = guard.ptr as *mut T;
        core::mem::forget(guard);
        // SAFETY: allocated by the global allocator with `T::SHAPE.layout`, which is
        // `Layout::new::<T>()`
        Ok(unsafe { Box::from_raw(ptr) })
    }

    /// Borrows the value as a `T`, if that is its type.
    pub fn get<T: Describe>(&self) -> Result<&T, BuildError> {
        self.expect_shape::<T>()?;
        let Some(guard) = &self.guard else {
            unreachable!("a HeapValue always owns its storage until consumed")
        };
        // SAFETY: the shape matches
        Ok(unsafe { PtrConst::new(guard.ptr as *const T).get::<T>() })
    }

    pub(crate) fn as_const(&self) -> PtrConst<'_> {
        let Some(guard) = &self.guard else {
            unreachable!("a HeapValue always owns its storage until consumed")
        };
        PtrConst::new(guard.ptr as *const u8)
    }

    /// Moves the value bytewise to `dst` and frees its storage without dropping it.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for writes of `self.shape().layout.size()` bytes, aligned for
    /// the shape, and must not overlap this value's storage.
    pub(crate) unsafe fn move_into<'dst>(mut self, dst: PtrUninit<'dst>) -> PtrMut<'dst> {
        let Some(guard) = self.guard.take() else {
            unreachable!("a HeapValue always owns its storage until consumed")
        };
        trace!(
            "Moving {} ({} bytes) into place",
            self.shape.blue(),
            self.shape.layout.size()
        );
        // SAFETY: upheld by the caller; `guard` frees the source without running drop glue
        unsafe { dst.copy_from(PtrConst::new(guard.ptr), self.shape) }
    }

    /// Wraps this value into a smart pointer of `pointer` type.
    ///
    /// # Safety
    ///
    /// `new_into` must construct a valid `pointer` value from a value of this shape.
    pub(crate) unsafe fn into_pointer(
        mut self,
        pointer: &'static Shape,
        new_into: NewIntoFn,
    ) -> Result<HeapValue, BuildError> {
        let storage = Guard::allocate(pointer, pointer.layout)?;
        let Some(pointee) = self.guard.take() else {
            unreachable!("a HeapValue always owns its storage until consumed")
        };
        // SAFETY: `new_into` moves the pointee out; `pointee` then only frees its storage
        unsafe {
            new_into(storage.as_uninit(), PtrMut::new(pointee.ptr));
            Ok(HeapValue::from_guard(storage, pointer))
        }
    }
}

impl Drop for HeapValue {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            if let Some(drop_fn) = self.shape.vtable.drop_in_place {
                // SAFETY: the value is initialized and of `self.shape`
                unsafe { drop_fn(PtrMut::new(guard.ptr)) };
            }
        }
    }
}

impl core::fmt::Debug for HeapValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeapValue")
            .field("shape", &format_args!("{}", self.shape))
            .finish_non_exhaustive()
    }
}

impl core::fmt::Display for HeapValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "<heap value of {}>", self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Introspect, ShapeIntrospector};
    use alloc::string::String;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use tabula_core::describe;
    use tabula_testhelpers::test;

    #[test]
    fn materialize_round_trips() {
        let hv = HeapValue::new(String::from("hello"));
        assert_eq!(hv.shape(), String::SHAPE);
        assert_eq!(hv.get::<String>()?, "hello");
        assert_eq!(hv.materialize::<String>()?, "hello");
    }

    #[test]
    fn wrong_type_is_a_mismatch() {
        let hv = HeapValue::new(7u32);
        let err = hv.get::<i32>().unwrap_err();
        assert_eq!(
            err,
            BuildError::TypeMismatch {
                expected: i32::SHAPE,
                actual: u32::SHAPE,
            }
        );
        let err = hv.materialize::<u64>().unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { .. }));
    }

    #[test]
    fn into_box_keeps_the_value() {
        let hv = HeapValue::new([1u8, 2, 3]);
        let boxed = hv.into_box::<[u8; 3]>()?;
        assert_eq!(*boxed, [1, 2, 3]);
    }

    #[test]
    fn alloc_with_runs_the_initializer() {
        let hv = unsafe { HeapValue::alloc_with(u16::SHAPE, tabula_core::default_in_place::<u16>)? };
        assert_eq!(*hv.get::<u16>()?, 0);
    }

    #[test]
    fn zero_sized_values() {
        describe! {
            #[derive(Debug, PartialEq)]
            struct Marker;
        }
        let hv = HeapValue::new(Marker);
        assert!(hv.shape().is_zst());
        assert_eq!(hv.materialize::<Marker>()?, Marker);
    }

    #[test]
    fn dropping_runs_drop_glue_once() {
        let counter = Arc::new(AtomicUsize::new(0));

        describe! {
            #[allow(dead_code)]
            struct Noisy {
                count: Counter,
            }
        }
        struct Counter(Arc<AtomicUsize>);
        tabula_core::describe_opaque!(Counter);
        impl Drop for Counter {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let hv = HeapValue::new(Noisy {
            count: Counter(counter.clone()),
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0, "No drops yet");
        drop(hv);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "One drop after dropping HeapValue");

        let hv = HeapValue::new(Noisy {
            count: Counter(counter.clone()),
        });
        let noisy = hv.materialize::<Noisy>()?;
        assert_eq!(counter.load(Ordering::SeqCst), 1, "materialize does not drop");
        drop(noisy);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn pointer_wrapping_moves_the_pointee() {
        let pointee = HeapValue::new(String::from("inside"));
        let Some(info) = ShapeIntrospector.pointer_of(<Box<String>>::SHAPE) else {
            panic!("Box<String> should be constructible");
        };
        let hv = unsafe { pointee.into_pointer(<Box<String>>::SHAPE, info.new_into)? };
        let boxed = hv.materialize::<Box<String>>()?;
        assert_eq!(*boxed, "inside");
    }
}
