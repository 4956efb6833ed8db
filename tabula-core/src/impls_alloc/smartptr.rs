use alloc::{boxed::Box, rc::Rc, sync::Arc};

use crate::*;

macro_rules! impl_describe_for_smart_pointer {
    ($ptr:ident) => {
        unsafe impl<T: Describe> Describe for $ptr<T> {
            const VTABLE: &'static ValueVTable = &const {
                ValueVTable::builder::<Self>()
                    .type_name(|f| write!(f, concat!(stringify!($ptr), "<{}>"), T::SHAPE))
                    .build()
            };

            const SHAPE: &'static Shape = &const {
                unsafe fn new_into<'ptr, T>(this: PtrUninit<'ptr>, ptr: PtrMut<'ptr>) -> PtrMut<'ptr> {
                    unsafe { this.put($ptr::new(ptr.read::<T>())) }
                }

                Shape::builder_for_sized::<Self>()
                    .type_identifier(stringify!($ptr))
                    .ty(Type::User(UserType::Opaque))
                    .def(Def::SmartPointer(
                        SmartPointerDef::builder()
                            .pointee(|| T::SHAPE)
                            .vtable(&const {
                                SmartPointerVTable::builder()
                                    .new_into_fn(new_into::<T>)
                                    .build()
                            })
                            .build(),
                    ))
                    .build()
            };
        }
    };
}

impl_describe_for_smart_pointer!(Box);
impl_describe_for_smart_pointer!(Rc);
impl_describe_for_smart_pointer!(Arc);

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use core::mem::MaybeUninit;

    #[test]
    fn box_new_into_moves_the_pointee() {
        let Def::SmartPointer(def) = <Box<u32>>::SHAPE.def else {
            panic!("expected a smart pointer def");
        };
        assert_eq!(def.pointee(), u32::SHAPE);

        let mut pointee = 42u32;
        let mut slot = MaybeUninit::<Box<u32>>::uninit();
        let new_into = def.vtable.new_into_fn.unwrap();
        let boxed = unsafe {
            new_into(PtrUninit::new(slot.as_mut_ptr()), PtrMut::new(&mut pointee));
            slot.assume_init()
        };
        assert_eq!(*boxed, 42);
    }

    #[test]
    fn shared_pointers_point_at_their_pointee() {
        let Def::SmartPointer(def) = <Arc<u8>>::SHAPE.def else {
            panic!("expected a smart pointer def");
        };
        assert_eq!(def.pointee(), u8::SHAPE);
        assert!(def.vtable.new_into_fn.is_some());
        assert_eq!(format!("{}", <Rc<i8>>::SHAPE), "Rc<i8>");
    }
}
