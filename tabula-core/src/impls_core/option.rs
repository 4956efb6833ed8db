use crate::*;

unsafe fn init_none<T>(option: PtrUninit<'_>) -> PtrMut<'_> {
    unsafe { option.put(None::<T>) }
}

unsafe impl<T: Describe> Describe for Option<T> {
    const VTABLE: &'static ValueVTable = &const {
        ValueVTable::builder::<Self>()
            .type_name(|f| write!(f, "Option<{}>", T::SHAPE))
            .default_in_place(default_in_place::<Self>)
            .build()
    };

    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Option")
            .ty(Type::User(UserType::Opaque))
            .def(Def::Option(
                OptionDef::builder()
                    .t(|| T::SHAPE)
                    .vtable(&const { OptionVTable::builder().init_none(init_none::<T>).build() })
                    .build(),
            ))
            .build()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn option_exposes_its_absent_value() {
        let Def::Option(od) = <Option<u32>>::SHAPE.def else {
            panic!("expected an option def");
        };
        assert_eq!(od.t(), u32::SHAPE);

        let mut slot = core::mem::MaybeUninit::<Option<u32>>::uninit();
        let value = unsafe {
            (od.vtable.init_none_fn)(PtrUninit::new(slot.as_mut_ptr())).read::<Option<u32>>()
        };
        assert_eq!(value, None);
    }

    #[test]
    fn option_type_name_includes_parameter() {
        assert_eq!(format!("{}", <Option<Option<u8>>>::SHAPE), "Option<Option<u8>>");
    }
}
