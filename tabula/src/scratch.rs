use alloc::alloc::alloc_zeroed;
use alloc::vec::Vec;
use core::alloc::Layout;

use log::trace;
use owo_colors::OwoColorize;
use tabula_core::{PtrUninit, Shape};

use crate::heap_value::Guard;
use crate::{BuildError, FieldInfo, FieldName, HeapValue, Violation};

/// Zero-filled storage for one aggregate under construction.
///
/// Fields are moved in one at a time; nothing can be read back out. The region ends
/// exactly once: [`ScratchRegion::freeze`] hands the storage over to a [`HeapValue`],
/// and dropping it instead drops every field written so far and frees the storage.
pub(crate) struct ScratchRegion {
    storage: Guard,
    shape: &'static Shape,
    /// in write order
    written: Vec<Written>,
    /// byte ranges of the sized fields written so far, sorted by start and disjoint
    occupied: Vec<Span>,
}

struct Span {
    start: usize,
    end: usize,
    name: FieldName,
}

struct Written {
    shape: &'static Shape,
    offset: usize,
}

impl ScratchRegion {
    /// Allocates zeroed storage for a value of `shape`.
    pub(crate) fn acquire(shape: &'static Shape) -> Result<Self, BuildError> {
        let layout = shape.layout;
        let storage = if layout.size() == 0 {
            Guard::allocate(shape, layout)?
        } else {
            // SAFETY: size is non-zero
            let ptr = unsafe { alloc_zeroed(layout) };
            if ptr.is_null() {
                return Err(BuildError::OutOfMemory { shape, layout });
            }
            // SAFETY: freshly allocated with `layout`
            unsafe { Guard::from_raw_parts(ptr, layout) }
        };
        trace!(
            "Acquired scratch region for {} ({} bytes, align {})",
            shape.blue(),
            layout.size(),
            layout.align()
        );
        Ok(Self {
            storage,
            shape,
            written: Vec::new(),
            occupied: Vec::new(),
        })
    }

    fn layout(&self) -> Layout {
        self.shape.layout
    }

    fn violation(&self, field: &FieldInfo, violation: Violation) -> BuildError {
        BuildError::LayoutViolation {
            shape: self.shape,
            field: Some(field.name),
            offset: field.offset,
            violation,
        }
    }

    /// Moves `value` into the region at `field.offset`.
    ///
    /// Copies exactly the size of the field's type. Fails without writing anything if
    /// the field would leave the region, sit at a misaligned address, or share bytes
    /// with a field written earlier.
    pub(crate) fn write_field(
        &mut self,
        field: &FieldInfo,
        value: HeapValue,
    ) -> Result<(), BuildError> {
        if value.shape() != field.shape {
            return Err(BuildError::TypeMismatch {
                expected: field.shape,
                actual: value.shape(),
            });
        }

        let size = self.layout().size();
        let end = match field.end() {
            Some(end) if end <= size => end,
            end => {
                return Err(self.violation(
                    field,
                    Violation::OutOfBounds {
                        end: end.unwrap_or(usize::MAX),
                        size,
                    },
                ));
            }
        };

        let align = field.shape.layout.align();
        let address = self.storage.as_uninit().as_byte_ptr().addr() + field.offset;
        if address % align != 0 {
            return Err(self.violation(field, Violation::Misaligned { align }));
        }

        // zero-sized fields occupy no bytes and never overlap
        let slot = if field.offset < end {
            match self.free_slot(field.offset, end) {
                Ok(slot) => Some(slot),
                Err(with) => return Err(self.violation(field, Violation::Overlap { with })),
            }
        } else {
            None
        };

        trace!(
            "Writing field {} of {} at offset {}",
            field.name.yellow(),
            self.shape.blue(),
            field.offset
        );
        // SAFETY: `offset..end` is inside the region, aligned for the field, and not
        // part of any field written before; `value` is a separate allocation
        unsafe {
            let dst: PtrUninit<'_> = self.storage.as_uninit().field_uninit_at(field.offset);
            value.move_into(dst);
        }
        self.written.push(Written {
            shape: field.shape,
            offset: field.offset,
        });
        if let Some(slot) = slot {
            self.occupied.insert(
                slot,
                Span {
                    start: field.offset,
                    end,
                    name: field.name,
                },
            );
        }
        Ok(())
    }

    /// Finds where `start..end` goes in `occupied`, or the field it would overlap.
    ///
    /// Spans are disjoint and sorted, so only the two neighbours can overlap. Fields
    /// written in offset order land at the end.
    fn free_slot(&self, start: usize, end: usize) -> Result<usize, FieldName> {
        let slot = self.occupied.partition_point(|span| span.start < start);
        if let Some(before) = slot.checked_sub(1).map(|i| &self.occupied[i]) {
            if before.end > start {
                return Err(before.name);
            }
        }
        if let Some(after) = self.occupied.get(slot) {
            if after.start < end {
                return Err(after.name);
            }
        }
        Ok(slot)
    }

    /// Number of fields written so far.
    pub(crate) fn written(&self) -> usize {
        self.written.len()
    }

    /// Hands the storage over to a [`HeapValue`] of the region's shape.
    ///
    /// # Safety
    ///
    /// The fields written must make up a valid value of the region's shape, with every
    /// byte not covered by a field being zero.
    pub(crate) unsafe fn freeze(mut self) -> HeapValue {
        trace!(
            "Freezing {} after {} field(s)",
            self.shape.blue(),
            self.written.len()
        );
        drop(core::mem::take(&mut self.written));
        let shape = self.shape;
        let this = core::mem::ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the storage is moved out exactly once
        unsafe {
            let storage = core::ptr::read(&this.storage);
            HeapValue::from_guard(storage, shape)
        }
    }
}

impl Drop for ScratchRegion {
    fn drop(&mut self) {
        trace!(
            "Releasing scratch region for {} ({} field(s) to drop)",
            self.shape.red(),
            self.written.len()
        );
        for written in self.written.iter().rev() {
            if let Some(drop_fn) = written.shape.vtable.drop_in_place {
                // SAFETY: this field was fully written by `write_field`
                unsafe { drop_fn(self.storage.as_uninit().field_init_at(written.offset)) };
            }
        }
        // `storage` frees the memory when it drops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use tabula_core::{Describe, describe};
    use tabula_testhelpers::test;

    describe! {
        #[derive(Debug, PartialEq)]
        struct Pair {
            a: u32,
            b: String,
        }
    }

    fn field(name: &'static str, shape: &'static Shape, offset: usize) -> FieldInfo {
        FieldInfo {
            name: FieldName::Named(name),
            shape,
            offset,
        }
    }

    fn pair_fields() -> (FieldInfo, FieldInfo) {
        let st = Pair::SHAPE.struct_type().unwrap();
        (
            field("a", u32::SHAPE, st.fields[0].offset),
            field("b", String::SHAPE, st.fields[1].offset),
        )
    }

    #[test]
    fn write_then_freeze() {
        let (a, b) = pair_fields();
        let mut scratch = ScratchRegion::acquire(Pair::SHAPE)?;
        scratch.write_field(&a, HeapValue::new(7u32))?;
        scratch.write_field(&b, HeapValue::new(String::from("seven")))?;
        assert_eq!(scratch.written(), 2);

        let value = unsafe { scratch.freeze() }.materialize::<Pair>()?;
        assert_eq!(
            value,
            Pair {
                a: 7,
                b: String::from("seven")
            }
        );
    }

    #[test]
    fn out_of_bounds_write_is_rejected() {
        let mut scratch = ScratchRegion::acquire(Pair::SHAPE)?;
        let size = Pair::SHAPE.layout.size();
        let err = scratch
            .write_field(&field("a", u32::SHAPE, size - 2), HeapValue::new(1u32))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::LayoutViolation {
                violation: Violation::OutOfBounds { .. },
                ..
            }
        ));
        assert_eq!(scratch.written(), 0);
    }

    #[test]
    fn misaligned_write_is_rejected() {
        let mut scratch = ScratchRegion::acquire(<[u32; 4]>::SHAPE)?;
        let err = scratch
            .write_field(&field("x", u32::SHAPE, 2), HeapValue::new(1u32))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::LayoutViolation {
                violation: Violation::Misaligned { align: 4 },
                ..
            }
        ));
    }

    #[test]
    fn overlapping_write_is_rejected() {
        let mut scratch = ScratchRegion::acquire(<[u64; 2]>::SHAPE)?;
        scratch.write_field(&field("first", u64::SHAPE, 0), HeapValue::new(1u64))?;
        let err = scratch
            .write_field(&field("second", u32::SHAPE, 4), HeapValue::new(1u32))
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::LayoutViolation {
                shape: <[u64; 2]>::SHAPE,
                field: Some(FieldName::Named("second")),
                offset: 4,
                violation: Violation::Overlap {
                    with: FieldName::Named("first")
                },
            }
        );
    }

    #[test]
    fn writes_in_any_order_are_checked_against_both_neighbours() {
        let mut scratch = ScratchRegion::acquire(<[u32; 4]>::SHAPE)?;
        scratch.write_field(&field("d", u32::SHAPE, 12), HeapValue::new(4u32))?;
        scratch.write_field(&field("b", u32::SHAPE, 4), HeapValue::new(2u32))?;
        scratch.write_field(&field("a", u32::SHAPE, 0), HeapValue::new(1u32))?;

        // fits between `b` and `d` but collides with the one written after it
        let err = scratch
            .write_field(&field("wide", u64::SHAPE, 8), HeapValue::new(0u64))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::LayoutViolation {
                violation: Violation::Overlap {
                    with: FieldName::Named("d")
                },
                ..
            }
        ));

        scratch.write_field(&field("c", u32::SHAPE, 8), HeapValue::new(3u32))?;
        let value = unsafe { scratch.freeze() }.materialize::<[u32; 4]>()?;
        assert_eq!(value, [1, 2, 3, 4]);
    }

    #[test]
    fn many_fields_in_one_region() {
        const N: usize = 4096;
        let mut scratch = ScratchRegion::acquire(<[u16; N]>::SHAPE)?;
        for index in 0..N {
            let element = FieldInfo {
                name: FieldName::Index(index),
                shape: u16::SHAPE,
                offset: index * 2,
            };
            scratch.write_field(&element, HeapValue::new(index as u16))?;
        }
        let err = scratch
            .write_field(&field("again", u16::SHAPE, 2 * (N / 2)), HeapValue::new(0u16))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::LayoutViolation {
                violation: Violation::Overlap {
                    with: FieldName::Index(2048)
                },
                ..
            }
        ));

        let value = unsafe { scratch.freeze() }.into_box::<[u16; N]>()?;
        assert!(value.iter().enumerate().all(|(i, v)| *v as usize == i));
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let (a, _) = pair_fields();
        let mut scratch = ScratchRegion::acquire(Pair::SHAPE)?;
        let err = scratch.write_field(&a, HeapValue::new(1i32)).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { .. }));
    }

    #[test]
    fn release_drops_written_fields() {
        let drops = Arc::new(AtomicUsize::new(0));

        struct Tracked(Arc<AtomicUsize>);
        tabula_core::describe_opaque!(Tracked);
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut scratch = ScratchRegion::acquire(<(Tracked, Tracked)>::SHAPE)?;
        let st = <(Tracked, Tracked)>::SHAPE.struct_type().unwrap();
        scratch.write_field(
            &field("0", Tracked::SHAPE, st.fields[0].offset),
            HeapValue::new(Tracked(drops.clone())),
        )?;
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(scratch);
        assert_eq!(drops.load(Ordering::SeqCst), 1, "only the written field is dropped");
    }

    #[test]
    fn zero_sized_regions() {
        let scratch = ScratchRegion::acquire(<()>::SHAPE)?;
        let value = unsafe { scratch.freeze() };
        value.materialize::<()>()?;
    }
}
