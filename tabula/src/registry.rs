use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::any::TypeId;

use bitflags::bitflags;
use log::trace;
use owo_colors::OwoColorize;
use tabula_core::{DefaultInPlaceFn, Def, Describe, Shape, default_in_place};

use crate::{BuildError, HeapValue, RegistryError};

bitflags! {
    /// Which construction capabilities a [`Registry`] offers for a type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilitySet: u8 {
        /// A default constructor: builds the value with no arguments.
        const DEFAULT_CONSTRUCTOR = 1 << 0;

        /// An absent value, like `None`.
        const ABSENCE = 1 << 1;
    }
}

type DynConstructor = Arc<dyn Fn() -> HeapValue + Send + Sync>;

/// One way of producing a value with no arguments.
#[derive(Clone)]
pub(crate) enum Constructor {
    /// Writes the value straight into fresh storage.
    InPlace(DefaultInPlaceFn),
    /// Produces a boxed value; its shape is checked by the caller.
    Closure(DynConstructor),
}

impl Constructor {
    pub(crate) fn construct(&self, shape: &'static Shape) -> Result<HeapValue, BuildError> {
        match self {
            // SAFETY: in-place constructors are only ever recorded for the shape they
            // initialize
            Constructor::InPlace(init) => unsafe { HeapValue::alloc_with(shape, *init) },
            Constructor::Closure(f) => Ok(f()),
        }
    }
}

#[derive(Clone)]
struct Entry {
    shape: &'static Shape,
    default: Option<Constructor>,
    absent: Option<Constructor>,
}

impl Entry {
    fn new(shape: &'static Shape) -> Self {
        Self {
            shape,
            default: None,
            absent: None,
        }
    }
}

/// The construction capabilities known for each type.
///
/// A registry is filled up front and then only read: it is `Send + Sync`, and any number
/// of threads may build from the same one at once.
///
/// ```
/// use tabula::{CapabilitySet, Describe, Registry};
///
/// let mut registry = Registry::new();
/// registry
///     .register_default::<String>()
///     .register_constructor(|| 8080u16);
///
/// assert_eq!(
///     registry.capabilities(String::SHAPE),
///     CapabilitySet::DEFAULT_CONSTRUCTOR
/// );
/// assert!(registry.capabilities(u32::SHAPE).is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    entries: BTreeMap<TypeId, Entry>,
    inferred: bool,
}

impl Registry {
    /// An empty registry: only capabilities registered explicitly exist.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that also reads capabilities off the descriptors themselves: a
    /// `Default` exposed by a type's vtable counts as its default constructor, and every
    /// `Option<T>` has its `None` as absent value.
    ///
    /// Explicit registrations take precedence.
    pub fn inferred() -> Self {
        Self {
            entries: BTreeMap::new(),
            inferred: true,
        }
    }

    /// Whether capabilities are inferred from descriptors.
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    fn entry(&mut self, shape: &'static Shape) -> &mut Entry {
        self.entries
            .entry(shape.id.get())
            .or_insert_with(|| Entry::new(shape))
    }

    /// Registers `T::default()` as the default constructor of `T`.
    pub fn register_default<T: Describe + Default>(&mut self) -> &mut Self {
        trace!("Registering Default of {}", T::SHAPE.green());
        self.entry(T::SHAPE).default = Some(Constructor::InPlace(default_in_place::<T>));
        self
    }

    /// Registers a closure as the default constructor of `T`.
    pub fn register_constructor<T, F>(&mut self, constructor: F) -> &mut Self
    where
        T: Describe,
        F: Fn() -> T + Send + Sync + 'static,
    {
        trace!("Registering constructor of {}", T::SHAPE.green());
        self.entry(T::SHAPE).default = Some(Constructor::Closure(Arc::new(move || {
            HeapValue::new(constructor())
        })));
        self
    }

    /// Registers a type-erased constructor for `shape`, for containers that only know
    /// types at runtime.
    ///
    /// The factory checks every value it returns: a value of any other shape fails the
    /// build with [`BuildError::TypeMismatch`].
    pub fn register_dynamic<F>(&mut self, shape: &'static Shape, constructor: F) -> &mut Self
    where
        F: Fn() -> HeapValue + Send + Sync + 'static,
    {
        trace!("Registering dynamic constructor of {}", shape.green());
        self.entry(shape).default = Some(Constructor::Closure(Arc::new(constructor)));
        self
    }

    /// Registers the absent value of `T`, which must be an `Option`.
    pub fn register_absent<T: Describe>(&mut self) -> Result<&mut Self, RegistryError> {
        let Def::Option(def) = T::SHAPE.def else {
            return Err(RegistryError::NoAbsentValue { shape: T::SHAPE });
        };
        trace!("Registering absent value of {}", T::SHAPE.green());
        self.entry(T::SHAPE).absent = Some(Constructor::InPlace(def.vtable.init_none_fn));
        Ok(self)
    }

    /// Registers a closure producing the absent value of `T`, for types that model
    /// absence without being an `Option`.
    pub fn register_absent_with<T, F>(&mut self, absent: F) -> &mut Self
    where
        T: Describe,
        F: Fn() -> T + Send + Sync + 'static,
    {
        trace!("Registering absent value constructor of {}", T::SHAPE.green());
        self.entry(T::SHAPE).absent = Some(Constructor::Closure(Arc::new(move || {
            HeapValue::new(absent())
        })));
        self
    }

    /// Forgets every capability registered for `shape`. Returns whether there were any.
    pub fn unregister(&mut self, shape: &'static Shape) -> bool {
        self.entries.remove(&shape.id.get()).is_some()
    }

    /// Reports which capabilities apply to `shape`, inferred ones included.
    pub fn capabilities(&self, shape: &'static Shape) -> CapabilitySet {
        let mut set = CapabilitySet::empty();
        if self.default_constructor(shape).is_some() {
            set |= CapabilitySet::DEFAULT_CONSTRUCTOR;
        }
        if self.absent_constructor(shape).is_some() {
            set |= CapabilitySet::ABSENCE;
        }
        set
    }

    pub(crate) fn default_constructor(&self, shape: &'static Shape) -> Option<Constructor> {
        let explicit = self
            .entries
            .get(&shape.id.get())
            .and_then(|entry| entry.default.clone());
        if explicit.is_some() || !self.inferred {
            return explicit;
        }
        shape.vtable.default_in_place.map(Constructor::InPlace)
    }

    pub(crate) fn absent_constructor(&self, shape: &'static Shape) -> Option<Constructor> {
        let explicit = self
            .entries
            .get(&shape.id.get())
            .and_then(|entry| entry.absent.clone());
        if explicit.is_some() || !self.inferred {
            return explicit;
        }
        match shape.def {
            Def::Option(def) => Some(Constructor::InPlace(def.vtable.init_none_fn)),
            _ => None,
        }
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Caps<'a>(&'a Entry);
        impl core::fmt::Debug for Caps<'_> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut set = CapabilitySet::empty();
                set.set(CapabilitySet::DEFAULT_CONSTRUCTOR, self.0.default.is_some());
                set.set(CapabilitySet::ABSENCE, self.0.absent.is_some());
                write!(f, "{set:?}")
            }
        }

        let mut map = f.debug_map();
        for entry in self.entries.values() {
            map.entry(&format_args!("{}", entry.shape), &Caps(entry));
        }
        map.finish()?;
        if self.inferred {
            f.write_str(" (inferred)")?;
        }
        Ok(())
    }
}
