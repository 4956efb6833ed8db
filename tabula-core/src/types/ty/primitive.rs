/// Describes built-in primitives (u32, bool, char, etc.)
///
/// Every primitive described here accepts the all-zero bit pattern as a valid value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    /// Boolean (`bool`)
    Boolean,
    /// Numeric (integer/float)
    Numeric(NumericType),
    /// Textual (`char`)
    Textual(TextualType),
}

/// Describes numeric types (integer/float)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericType {
    /// Integer (`u16`, `i8`, `usize`, etc.)
    ///
    /// Number of bits can be found by checking the size of the shape's layout.
    Integer {
        /// Is this a signed integer (`i`) or unsigned (`u`)?
        signed: bool,
    },
    /// Floating-point (`f32`, `f64`)
    Float,
}

/// Describes textual types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextualType {
    /// Unicode scalar value (`char`)
    Char,
}
