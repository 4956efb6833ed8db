use crate::*;

macro_rules! impl_describe_for_primitive {
    ($($type:ty => $ty:expr),+ $(,)?) => {
        $(
            unsafe impl Describe for $type {
                const VTABLE: &'static ValueVTable = &const {
                    ValueVTable::builder::<$type>()
                        .type_name(|f| f.write_str(stringify!($type)))
                        .default_in_place(default_in_place::<$type>)
                        .build()
                };

                const SHAPE: &'static Shape = &const {
                    Shape::builder_for_sized::<Self>()
                        .type_identifier(stringify!($type))
                        .ty(Type::Primitive($ty))
                        .build()
                };
            }
        )+
    };
}

const SIGNED: PrimitiveType = PrimitiveType::Numeric(NumericType::Integer { signed: true });
const UNSIGNED: PrimitiveType = PrimitiveType::Numeric(NumericType::Integer { signed: false });
const FLOAT: PrimitiveType = PrimitiveType::Numeric(NumericType::Float);

impl_describe_for_primitive! {
    u8 => UNSIGNED,
    u16 => UNSIGNED,
    u32 => UNSIGNED,
    u64 => UNSIGNED,
    u128 => UNSIGNED,
    usize => UNSIGNED,
    i8 => SIGNED,
    i16 => SIGNED,
    i32 => SIGNED,
    i64 => SIGNED,
    i128 => SIGNED,
    isize => SIGNED,
    f32 => FLOAT,
    f64 => FLOAT,
    bool => PrimitiveType::Boolean,
    char => PrimitiveType::Textual(TextualType::Char),
}

unsafe impl Describe for () {
    const VTABLE: &'static ValueVTable = &const {
        ValueVTable::builder::<()>()
            .type_name(|f| f.write_str("()"))
            .default_in_place(default_in_place::<()>)
            .build()
    };

    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("()")
            .ty(Type::User(UserType::Struct(
                StructType::builder().tuple().build(),
            )))
            .build()
    };
}

unsafe impl<T: ?Sized + 'static> Describe for core::marker::PhantomData<T> {
    const VTABLE: &'static ValueVTable = &const {
        ValueVTable::builder::<Self>()
            .type_name(|f| f.write_str("PhantomData"))
            .default_in_place(default_in_place::<Self>)
            .build()
    };

    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("PhantomData")
            .ty(Type::User(UserType::Struct(
                StructType::builder().unit().build(),
            )))
            .build()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_shapes_are_distinct() {
        assert_ne!(u32::SHAPE, i32::SHAPE);
        assert_eq!(u32::SHAPE, u32::SHAPE);
        assert!(u64::SHAPE.is_type::<u64>());
    }

    #[test]
    fn primitive_layouts_match_the_compiler() {
        assert_eq!(u128::SHAPE.layout, core::alloc::Layout::new::<u128>());
        assert_eq!(char::SHAPE.layout.size(), 4);
        assert!(<()>::SHAPE.is_zst());
    }

    #[test]
    fn primitives_have_no_drop_glue() {
        assert!(!f64::SHAPE.vtable.needs_drop());
        assert!(!bool::SHAPE.vtable.needs_drop());
    }

    #[test]
    fn phantom_data_is_a_unit_struct() {
        let st = <core::marker::PhantomData<str>>::SHAPE.struct_type().unwrap();
        assert_eq!(st.kind, StructKind::Unit);
        assert!(st.fields.is_empty());
    }
}
