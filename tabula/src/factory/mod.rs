//! The recursive construction algorithm.
//!
//! [`Factory::create_of`] enters the classifier, which either delegates to a registered
//! capability or hands the type to the structural builder. The structural builder
//! resolves every field by calling back into the classifier.

use alloc::vec::Vec;

use log::debug;
use owo_colors::OwoColorize;
use tabula_core::{Describe, Shape};

use crate::{BuildError, HeapValue, Introspect, Registry, ShapeIntrospector};

mod classify;
mod resolve;
mod structural;

/// How deep aggregates may nest by default before [`BuildError::DepthLimitExceeded`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Builds default instances from a [`Registry`] and an [`Introspect`] provider.
///
/// A factory holds no state between calls and may be shared across threads.
///
/// ```
/// use tabula::{Factory, Registry, describe};
///
/// describe! {
///     #[derive(Debug, PartialEq)]
///     pub struct Tree {
///         pub children: Vec<Tree>,
///         pub weight: u32,
///     }
/// }
///
/// let registry = Registry::inferred();
/// let factory = Factory::new(&registry).max_depth(Some(8));
/// assert_eq!(
///     factory.create::<Tree>().unwrap(),
///     Tree { children: vec![], weight: 0 }
/// );
/// ```
#[derive(Clone, Copy)]
pub struct Factory<'a> {
    registry: &'a Registry,
    introspector: &'a dyn Introspect,
    max_depth: Option<usize>,
    detect_cycles: bool,
}

impl<'a> Factory<'a> {
    /// A factory reading layouts with [`ShapeIntrospector`], detecting cycles, and
    /// limiting nesting to [`DEFAULT_MAX_DEPTH`].
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            introspector: &ShapeIntrospector,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            detect_cycles: true,
        }
    }

    /// Uses `introspector` to learn field layouts.
    pub fn with_introspector(mut self, introspector: &'a dyn Introspect) -> Self {
        self.introspector = introspector;
        self
    }

    /// Sets how deep aggregates and pointers may nest; `None` removes the limit.
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether re-entering a type that is already being built fails with
    /// [`BuildError::CyclicType`].
    pub fn detect_cycles(mut self, detect_cycles: bool) -> Self {
        self.detect_cycles = detect_cycles;
        self
    }

    /// Builds a default `T`.
    pub fn create<T: Describe>(&self) -> Result<T, BuildError> {
        self.create_of(T::SHAPE)?.materialize::<T>()
    }

    /// Builds a default value of `shape`.
    pub fn create_of(&self, shape: &'static Shape) -> Result<HeapValue, BuildError> {
        let mut descent = Descent::default();
        self.classify_and_build(shape, &mut descent)
            .inspect_err(|e| debug!("Building a default {} failed: {e}", shape.red()))
    }

    /// Runs `build` with `shape` pushed onto the stack of aggregates in flight.
    fn descend<R>(
        &self,
        shape: &'static Shape,
        descent: &mut Descent,
        build: impl FnOnce(&mut Descent) -> Result<R, BuildError>,
    ) -> Result<R, BuildError> {
        if self.detect_cycles && descent.in_flight.contains(&shape) {
            return Err(BuildError::CyclicType {
                shape,
                depth: descent.depth(),
            });
        }
        if let Some(limit) = self.max_depth {
            if descent.depth() >= limit {
                return Err(BuildError::DepthLimitExceeded { shape, limit });
            }
        }

        descent.in_flight.push(shape);
        let result = build(descent);
        descent.in_flight.pop();
        result
    }
}

impl core::fmt::Debug for Factory<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Factory")
            .field("registry", self.registry)
            .field("max_depth", &self.max_depth)
            .field("detect_cycles", &self.detect_cycles)
            .finish_non_exhaustive()
    }
}

/// The aggregates currently under construction, outermost first.
#[derive(Default)]
pub(crate) struct Descent {
    in_flight: Vec<&'static Shape>,
}

impl Descent {
    fn depth(&self) -> usize {
        self.in_flight.len()
    }
}
