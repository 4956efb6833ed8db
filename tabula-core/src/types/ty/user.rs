use super::StructType;

/// User-defined types
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub enum UserType {
    /// Describes a `struct` (named, tuple or unit) or a tuple
    Struct(StructType),
    /// A type whose internal representation is not exposed: enums, handles,
    /// heap-owning containers. Its layout cannot be synthesized field by field.
    Opaque,
}
