use crate::*;

unsafe impl<T: Describe, const L: usize> Describe for [T; L] {
    const VTABLE: &'static ValueVTable = &const {
        ValueVTable::builder::<Self>()
            .type_name(|f| write!(f, "[{}; {L}]", T::SHAPE))
            .build()
    };

    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("[_; _]")
            .ty(Type::Sequence(SequenceType::Array(ArrayType {
                t: T::SHAPE,
                n: L,
            })))
            .build()
    };
}
