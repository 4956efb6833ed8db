use super::*;

mod option;
pub use option::*;

mod smartptr;
pub use smartptr::*;

/// The semantic definition of a shape: is it an option, a smart pointer?
///
/// Where [`Type`] says how a value is laid out, `Def` says what protocol it speaks.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub enum Def {
    /// Undefined - you can interact with the type through [`Type`] and [`ValueVTable`].
    Undefined,

    /// Option: has a canonical absent value.
    ///
    /// e.g. `Option<T>`
    Option(OptionDef),

    /// Smart pointers, like `Box<T>`, `Arc<T>`, `Rc<T>`
    SmartPointer(SmartPointerDef),
}
