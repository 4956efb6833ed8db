use alloc::vec::Vec;

use crate::*;

unsafe impl<T: Describe> Describe for Vec<T> {
    const VTABLE: &'static ValueVTable = &const {
        ValueVTable::builder::<Self>()
            .type_name(|f| write!(f, "Vec<{}>", T::SHAPE))
            .default_in_place(default_in_place::<Vec<T>>)
            .build()
    };

    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Vec")
            .ty(Type::User(UserType::Opaque))
            .build()
    };
}
