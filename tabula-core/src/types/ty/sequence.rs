use super::Shape;

/// Describes built-in fixed-size sequence types
#[derive(Clone, Copy, Debug)]
pub enum SequenceType {
    /// Array (`[T; N]`)
    Array(ArrayType),
}

/// Describes a fixed-size array (`[T; N]`)
#[derive(Clone, Copy, Debug)]
pub struct ArrayType {
    /// Shape of the element type
    pub t: &'static Shape,
    /// Constant length of the array
    pub n: usize,
}
