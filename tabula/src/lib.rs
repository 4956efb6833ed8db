#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

extern crate alloc;

pub use tabula_core::*;

mod error;
pub use error::*;

mod introspect;
pub use introspect::*;

mod registry;
pub use registry::*;

mod heap_value;
pub use heap_value::*;

mod scratch;

mod factory;
pub use factory::*;

/// Builds a default `T` with the default [`Factory`] settings.
///
/// Shorthand for `Factory::new(registry).create::<T>()`.
pub fn create_default<T: Describe>(registry: &Registry) -> Result<T, BuildError> {
    Factory::new(registry).create::<T>()
}

/// Builds a default value of `shape` with the default [`Factory`] settings.
pub fn create_default_of(
    registry: &Registry,
    shape: &'static Shape,
) -> Result<HeapValue, BuildError> {
    Factory::new(registry).create_of(shape)
}
