use super::*;

mod field;
pub use field::*;

mod struct_;
pub use struct_::*;

mod primitive;
pub use primitive::*;

mod sequence;
pub use sequence::*;

mod user;
pub use user::*;

/// What a type is, structurally: a primitive, a sequence, or something user-defined.
///
/// See <https://doc.rust-lang.org/reference/types.html>
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub enum Type {
    /// Built-in primitive.
    Primitive(PrimitiveType),
    /// Fixed-size sequence (array).
    Sequence(SequenceType),
    /// User-defined type (struct, tuple, or anything opaque).
    User(UserType),
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "Primitive({p:?})"),
            Type::Sequence(SequenceType::Array(ArrayType { t, n })) => {
                write!(f, "Sequence(Array([{t}; {n}]))")
            }
            Type::User(UserType::Struct(st)) => {
                // Guillemets mark this as not-quite-Rust syntax.
                write!(f, "User(Struct(«kind: {:?}", st.kind)?;
                match st.kind {
                    StructKind::Struct => {
                        write!(f, ", fields: (")?;
                        for (i, field) in st.fields.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", field.name)?;
                        }
                        write!(f, ")")?;
                    }
                    StructKind::TupleStruct | StructKind::Tuple => {
                        write!(f, ", fields: {}", st.fields.len())?;
                    }
                    StructKind::Unit => {}
                }
                write!(f, "»))")
            }
            Type::User(UserType::Opaque) => write!(f, "User(Opaque)"),
        }
    }
}
