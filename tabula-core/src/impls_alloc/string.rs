use alloc::string::String;

use crate::*;

unsafe impl Describe for String {
    const VTABLE: &'static ValueVTable = &const {
        ValueVTable::builder::<Self>()
            .type_name(|f| f.write_str("String"))
            .default_in_place(default_in_place::<String>)
            .build()
    };

    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("String")
            // a zeroed String is a null pointer; never synthesize one
            .ty(Type::User(UserType::Opaque))
            .build()
    };
}
