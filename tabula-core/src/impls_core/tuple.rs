use core::fmt;

use crate::*;

fn write_type_name_list(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    delimiter: &str,
    close: &str,
    shapes: &[&'static Shape],
) -> fmt::Result {
    f.write_str(open)?;
    for (index, shape) in shapes.iter().enumerate() {
        if index > 0 {
            f.write_str(delimiter)?;
        }
        write!(f, "{shape}")?;
    }
    f.write_str(close)
}

macro_rules! impl_describe_for_tuple {
    ($($elems:ident.$idx:tt),+) => {
        unsafe impl<$($elems: Describe),+> Describe for ($($elems,)+) {
            const VTABLE: &'static ValueVTable = &const {
                ValueVTable::builder::<Self>()
                    .type_name(|f| {
                        write_type_name_list(f, "(", ", ", ")", &[$($elems::SHAPE),+])
                    })
                    .build()
            };

            const SHAPE: &'static Shape = &const {
                Shape::builder_for_sized::<Self>()
                    .type_identifier("(⋯)")
                    .ty(Type::User(UserType::Struct(
                        StructType::builder()
                            .tuple()
                            .fields(&const {[
                                $(
                                    Field::builder()
                                        .name(stringify!($idx))
                                        .shape(|| $elems::SHAPE)
                                        .offset(core::mem::offset_of!(Self, $idx))
                                        .build()
                                ),+
                            ]})
                            .build(),
                    )))
                    .build()
            };
        }
    };
}

impl_describe_for_tuple!(T0.0);
impl_describe_for_tuple!(T0.0, T1.1);
impl_describe_for_tuple!(T0.0, T1.1, T2.2);
impl_describe_for_tuple!(T0.0, T1.1, T2.2, T3.3);

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn tuple_fields_are_indexed() {
        let st = <(u8, u32, u16)>::SHAPE.struct_type().unwrap();
        assert_eq!(st.kind, StructKind::Tuple);
        let names: [&str; 3] = [st.fields[0].name, st.fields[1].name, st.fields[2].name];
        assert_eq!(names, ["0", "1", "2"]);
        assert_eq!(st.fields[1].shape(), u32::SHAPE);
        assert_eq!(st.fields[1].offset, core::mem::offset_of!((u8, u32, u16), 1));
    }

    #[test]
    fn tuple_type_name_lists_elements() {
        assert_eq!(format!("{}", <(i32, bool)>::SHAPE), "(i32, bool)");
    }
}
