#![allow(dead_code)]

use std::sync::Mutex;

use tabula::{Introspect, LayoutInfo, NotIntrospectable, PointerInfo, Shape, ShapeIntrospector};

/// Delegates to [`ShapeIntrospector`] and remembers every shape it was asked about.
#[derive(Default)]
pub struct Recording {
    asked: Mutex<Vec<&'static Shape>>,
}

impl Recording {
    pub fn asked(&self) -> Vec<String> {
        self.asked
            .lock()
            .unwrap()
            .iter()
            .map(|shape| shape.to_string())
            .collect()
    }

    pub fn times_asked(&self, shape: &'static Shape) -> usize {
        self.asked.lock().unwrap().iter().filter(|s| **s == shape).count()
    }
}

// SAFETY: answers come straight from `ShapeIntrospector`
unsafe impl Introspect for Recording {
    fn layout_of(&self, shape: &'static Shape) -> Result<LayoutInfo, NotIntrospectable> {
        self.asked.lock().unwrap().push(shape);
        ShapeIntrospector.layout_of(shape)
    }

    fn pointer_of(&self, shape: &'static Shape) -> Option<PointerInfo> {
        ShapeIntrospector.pointer_of(shape)
    }
}
