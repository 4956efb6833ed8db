/// Declares a struct and implements [`Describe`](crate::Describe) for it.
///
/// Named, tuple and unit structs are supported; generic structs are not (write the
/// impl by hand, the way the built-in tuple descriptors do). Every field offset comes
/// from [`core::mem::offset_of!`], so the reported layout is always the real one.
///
/// Options go in an inner attribute before the item:
///
/// - `default`: expose the type's `Default` impl through the vtable
/// - `opaque`: hide the fields; the type is then only buildable through a registered
///   constructor
/// - `invariants = path`: declare a validity predicate `fn(&Self) -> bool`; a type with
///   invariants is never synthesized field by field
///
/// ```
/// use tabula_core::{Describe, StructKind, describe};
///
/// describe! {
///     #![describe(default)]
///     #[derive(Debug, Default)]
///     pub struct Meters(pub f64);
/// }
///
/// let st = Meters::SHAPE.struct_type().unwrap();
/// assert_eq!(st.kind, StructKind::TupleStruct);
/// assert_eq!(st.fields[0].name, "0");
/// assert!(Meters::SHAPE.vtable.default_in_place.is_some());
/// ```
#[macro_export]
macro_rules! describe {
    (
        #![describe($($opt:tt)*)]
        $($item:tt)*
    ) => {
        $crate::describe!(@item [$($opt)*] $($item)*);
    };

    (@item [$($opt:tt)*]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$fmeta])* $fvis $field: $fty),*
        }

        unsafe impl $crate::Describe for $name {
            const VTABLE: &'static $crate::ValueVTable =
                &const { $crate::__describe_vtable!($name; $($opt)*) };

            const SHAPE: &'static $crate::Shape = &const {
                $crate::Shape::builder_for_sized::<Self>()
                    .type_identifier(stringify!($name))
                    .ty($crate::__describe_ty!([$($opt)*]
                        $crate::StructType::builder()
                            .struct_()
                            .fields(&const {[
                                $(
                                    $crate::Field::builder()
                                        .name(stringify!($field))
                                        .shape(|| <$fty as $crate::Describe>::SHAPE)
                                        .offset(::core::mem::offset_of!($name, $field))
                                        .build()
                                ),*
                            ]})
                            .build()
                    ))
                    .build()
            };
        }
    };

    (@item [$($opt:tt)*]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident (
            $($(#[$fmeta:meta])* $fvis:vis $fty:ty),* $(,)?
        );
    ) => {
        $(#[$meta])*
        $vis struct $name (
            $($(#[$fmeta])* $fvis $fty),*
        );

        unsafe impl $crate::Describe for $name {
            const VTABLE: &'static $crate::ValueVTable =
                &const { $crate::__describe_vtable!($name; $($opt)*) };

            const SHAPE: &'static $crate::Shape = &const {
                $crate::Shape::builder_for_sized::<Self>()
                    .type_identifier(stringify!($name))
                    .ty($crate::__describe_ty!([$($opt)*]
                        $crate::StructType::builder()
                            .tuple_struct()
                            .fields(&const {
                                $crate::__describe_tuple_fields!(
                                    $name; []; [$($fty,)*]; [0 1 2 3 4 5 6 7 8 9 10 11]
                                )
                            })
                            .build()
                    ))
                    .build()
            };
        }
    };

    (@item [$($opt:tt)*]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident;
    ) => {
        $(#[$meta])*
        $vis struct $name;

        unsafe impl $crate::Describe for $name {
            const VTABLE: &'static $crate::ValueVTable =
                &const { $crate::__describe_vtable!($name; $($opt)*) };

            const SHAPE: &'static $crate::Shape = &const {
                $crate::Shape::builder_for_sized::<Self>()
                    .type_identifier(stringify!($name))
                    .ty($crate::__describe_ty!([$($opt)*]
                        $crate::StructType::builder().unit().build()
                    ))
                    .build()
            };
        }
    };

    (@item [$($opt:tt)*] $($rest:tt)*) => {
        ::core::compile_error!(
            "describe! accepts a single non-generic struct; use describe_opaque! for enums and other types"
        );
    };

    ($($item:tt)*) => {
        $crate::describe!(@item [] $($item)*);
    };
}

/// Implements [`Describe`](crate::Describe) for an existing local type without exposing
/// its layout.
///
/// Enums, handles and anything whose all-zero bit pattern is not a valid value belong
/// here. Pass `default` to expose the type's `Default` impl.
///
/// ```
/// use tabula_core::{Describe, Type, UserType, describe_opaque};
///
/// #[derive(Default)]
/// enum Mode {
///     #[default]
///     Fast,
///     Safe,
/// }
/// describe_opaque!(Mode, default);
///
/// assert!(matches!(Mode::SHAPE.ty, Type::User(UserType::Opaque)));
/// ```
#[macro_export]
macro_rules! describe_opaque {
    ($name:ident $(, $($opt:tt)*)?) => {
        unsafe impl $crate::Describe for $name {
            const VTABLE: &'static $crate::ValueVTable =
                &const { $crate::__describe_vtable!($name; $($($opt)*)?) };

            const SHAPE: &'static $crate::Shape = &const {
                $crate::Shape::builder_for_sized::<Self>()
                    .type_identifier(stringify!($name))
                    .ty($crate::Type::User($crate::UserType::Opaque))
                    .build()
            };
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __describe_vtable {
    (@munch $name:ident, $builder:expr;) => {
        $builder.build()
    };
    (@munch $name:ident, $builder:expr; default $(, $($rest:tt)*)?) => {
        $crate::__describe_vtable!(@munch $name,
            $builder.default_in_place($crate::default_in_place::<$name>);
            $($($rest)*)?
        )
    };
    (@munch $name:ident, $builder:expr; invariants = $check:path $(, $($rest:tt)*)?) => {
        $crate::__describe_vtable!(@munch $name,
            $builder.invariants($check);
            $($($rest)*)?
        )
    };
    (@munch $name:ident, $builder:expr; opaque $(, $($rest:tt)*)?) => {
        $crate::__describe_vtable!(@munch $name, $builder; $($($rest)*)?)
    };
    (@munch $name:ident, $builder:expr; $($unknown:tt)+) => {
        ::core::compile_error!(concat!(
            "unknown describe option: ",
            stringify!($($unknown)+),
            " (expected `default`, `opaque` or `invariants = path`)"
        ))
    };
    ($name:ident; $($opt:tt)*) => {
        $crate::__describe_vtable!(@munch $name,
            $crate::ValueVTable::builder::<$name>()
                .type_name(|f| f.write_str(stringify!($name)));
            $($opt)*
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __describe_ty {
    ([] $st:expr) => {
        $crate::Type::User($crate::UserType::Struct($st))
    };
    ([opaque $($rest:tt)*] $st:expr) => {
        $crate::Type::User($crate::UserType::Opaque)
    };
    ([$skip:tt $($rest:tt)*] $st:expr) => {
        $crate::__describe_ty!([$($rest)*] $st)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __describe_tuple_fields {
    ($name:ident; [$($done:expr,)*]; []; [$($idx:tt)*]) => {
        [$($done),*]
    };
    ($name:ident; [$($done:expr,)*]; [$fty:ty, $($rest:ty,)*]; [$idx:tt $($idxs:tt)*]) => {
        $crate::__describe_tuple_fields!(
            $name;
            [
                $($done,)*
                $crate::Field::builder()
                    .name(stringify!($idx))
                    .shape(|| <$fty as $crate::Describe>::SHAPE)
                    .offset(::core::mem::offset_of!($name, $idx))
                    .build(),
            ];
            [$($rest,)*];
            [$($idxs)*]
        )
    };
    ($name:ident; [$($done:expr,)*]; [$($rest:ty,)+]; []) => {
        ::core::compile_error!("describe! supports tuple structs with at most 12 fields")
    };
}
