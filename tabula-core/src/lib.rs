#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

#[cfg(feature = "alloc")]
extern crate alloc;

// `describe!` and friends
mod macros;

// Opaque pointer utilities
mod ptr;
pub use ptr::*;

// Descriptors for `core::` types
mod impls_core;

// Descriptors for `alloc::` types
#[cfg(feature = "alloc")]
mod impls_alloc;

// Const type Id
mod typeid;
pub use typeid::*;

// Type definitions
mod types;
pub use types::*;

/// Allows querying the [`Shape`] of a type: its identity, layout, drop glue and,
/// for aggregates, the name, type and offset of every field.
///
/// This is the type descriptor the default-instance factory works from.
///
/// # Safety
///
/// The factory writes raw bytes into memory based on what this trait reports, then
/// treats that memory as a `Self`. Reporting a wrong layout, a wrong field offset, or a
/// field whose shape does not match the real field type is undefined behavior.
///
/// Prefer the [`describe!`] macro, which derives every offset with
/// [`core::mem::offset_of!`].
pub unsafe trait Describe: 'static {
    /// Function pointers for the operations the factory needs: printing the type name,
    /// dropping a value in place, and (optionally) writing a default value.
    const VTABLE: &'static ValueVTable;

    /// The shape of this type
    ///
    /// Shape embeds [`Self::VTABLE`].
    const SHAPE: &'static Shape;
}
