use tabula::{
    BuildError, Describe, Factory, FieldInfo, FieldName, HeapValue, Introspect, LayoutInfo,
    NotIntrospectable, NotIntrospectableReason, Registry, Shape, ShapeIntrospector, Violation,
    create_default, describe,
};
use tabula_testhelpers::test;

describe! {
    #[derive(Debug, PartialEq)]
    pub struct Point {
        pub x: i32,
        pub y: i32,
    }
}

describe! {
    #[derive(Debug)]
    pub struct Config {
        pub port: u16,
        pub name: String,
    }
}

describe! {
    #[derive(Debug)]
    pub struct Outer {
        pub id: u64,
        pub config: Config,
    }
}

#[test]
fn opaque_field_without_constructor() {
    let err = create_default::<Config>(&Registry::new()).unwrap_err();

    let BuildError::FieldBuildFailure {
        parent,
        position,
        field,
        inner,
    } = &err
    else {
        panic!("expected a field failure, got {err:?}");
    };
    assert_eq!(*parent, Config::SHAPE);
    assert_eq!(*position, 1);
    assert_eq!(*field, FieldName::Named("name"));
    assert_eq!(
        **inner,
        BuildError::UnbuildableType {
            shape: String::SHAPE,
            reason: NotIntrospectableReason::Opaque,
        }
    );
    assert_eq!(err.field_path().as_deref(), Some("Config.name"));
}

#[test]
fn nested_failures_carry_the_whole_path() {
    let err = create_default::<Outer>(&Registry::new()).unwrap_err();
    assert_eq!(err.field_path().as_deref(), Some("Outer.config.name"));
    assert!(matches!(
        err.root_cause(),
        BuildError::UnbuildableType { shape, .. } if *shape == String::SHAPE
    ));

    let message = err.to_string();
    assert!(message.contains("Cannot build field"), "{message}");
    assert!(message.contains("String"), "{message}");
}

#[test]
fn array_elements_are_indexed_in_the_path() {
    describe! {
        #[derive(Debug)]
        struct Grid {
            cells: [Config; 2],
        }
    }

    let err = create_default::<Grid>(&Registry::new()).unwrap_err();
    assert_eq!(err.field_path().as_deref(), Some("Grid.cells[0].name"));
}

#[test]
fn top_level_opaque_type() {
    let err = create_default::<Vec<u8>>(&Registry::new()).unwrap_err();
    assert_eq!(
        err,
        BuildError::UnbuildableType {
            shape: <Vec<u8>>::SHAPE,
            reason: NotIntrospectableReason::Opaque,
        }
    );
    assert_eq!(err.field_path(), None);
    assert_eq!(err.root_cause(), &err);
}

#[test]
fn dynamic_constructor_of_the_wrong_type() {
    let mut registry = Registry::new();
    registry.register_dynamic(u16::SHAPE, || HeapValue::new(7u64));

    let err = create_default::<Config>(&registry).unwrap_err();
    assert_eq!(
        *err.root_cause(),
        BuildError::TypeMismatch {
            expected: u16::SHAPE,
            actual: u64::SHAPE,
        }
    );
    assert_eq!(err.field_path().as_deref(), Some("Config.port"));
}

#[test]
fn materializing_as_another_type() {
    let err = Factory::new(&Registry::new())
        .create_of(Point::SHAPE)?
        .materialize::<(i32, i32)>()
        .unwrap_err();
    assert!(matches!(err, BuildError::TypeMismatch { .. }));
}

/// Reports the real fields of a struct, with one field moved to `offset`.
struct Shifted {
    field: usize,
    offset: usize,
}

// SAFETY: only used to check that bad layouts are rejected before anything is read
unsafe impl Introspect for Shifted {
    fn layout_of(&self, shape: &'static Shape) -> Result<LayoutInfo, NotIntrospectable> {
        let mut info = ShapeIntrospector.layout_of(shape)?;
        if shape == Point::SHAPE {
            info.fields[self.field].offset = self.offset;
        }
        Ok(info)
    }
}

#[test]
fn field_past_the_end() {
    let shifted = Shifted { field: 1, offset: 6 };
    let err = Factory::new(&Registry::new())
        .with_introspector(&shifted)
        .create::<Point>()
        .unwrap_err();

    assert_eq!(err.field_path().as_deref(), Some("Point.y"));
    assert_eq!(
        *err.root_cause(),
        BuildError::LayoutViolation {
            shape: Point::SHAPE,
            field: Some(FieldName::Named("y")),
            offset: 6,
            violation: Violation::OutOfBounds { end: 10, size: 8 },
        }
    );
}

#[test]
fn overlapping_fields() {
    let shifted = Shifted { field: 1, offset: 0 };
    let err = Factory::new(&Registry::new())
        .with_introspector(&shifted)
        .create::<Point>()
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        BuildError::LayoutViolation {
            violation: Violation::Overlap {
                with: FieldName::Named("x")
            },
            ..
        }
    ));
}

#[test]
fn misaligned_field() {
    let shifted = Shifted { field: 0, offset: 2 };
    let err = Factory::new(&Registry::new())
        .with_introspector(&shifted)
        .create::<Point>()
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        BuildError::LayoutViolation {
            violation: Violation::Misaligned { align: 4 },
            ..
        }
    ));
}

#[test]
fn reported_size_differs_from_the_type() {
    struct Oversized;

    // SAFETY: the factory rejects the layout before allocating
    unsafe impl Introspect for Oversized {
        fn layout_of(&self, shape: &'static Shape) -> Result<LayoutInfo, NotIntrospectable> {
            let mut info = ShapeIntrospector.layout_of(shape)?;
            info.size += 8;
            Ok(info)
        }
    }

    let err = Factory::new(&Registry::new())
        .with_introspector(&Oversized)
        .create::<Point>()
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::LayoutViolation {
            shape: Point::SHAPE,
            field: None,
            offset: 0,
            violation: Violation::LayoutMismatch { size: 16, align: 4 },
        }
    );
}

describe! {
    #![describe(invariants = Span::is_valid)]
    #[derive(Debug, PartialEq)]
    pub struct Span {
        pub start: u32,
        pub end: u32,
    }
}

impl Span {
    fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

#[test]
fn types_with_invariants_are_not_synthesized() {
    let err = create_default::<Span>(&Registry::new()).unwrap_err();
    assert_eq!(
        err,
        BuildError::UnbuildableType {
            shape: Span::SHAPE,
            reason: NotIntrospectableReason::Invariants,
        }
    );

    let mut registry = Registry::new();
    registry.register_constructor(|| Span { start: 0, end: 1 });
    assert_eq!(
        create_default::<Span>(&registry)?,
        Span { start: 0, end: 1 }
    );
}

#[test]
fn synthesized_value_still_has_to_hold_invariants() {
    /// Ignores declared invariants and reports plain struct fields.
    struct Permissive;

    // SAFETY: offsets and shapes come from the descriptor itself
    unsafe impl Introspect for Permissive {
        fn layout_of(&self, shape: &'static Shape) -> Result<LayoutInfo, NotIntrospectable> {
            let Some(st) = shape.struct_type() else {
                return ShapeIntrospector.layout_of(shape);
            };
            Ok(LayoutInfo {
                size: shape.layout.size(),
                align: shape.layout.align(),
                fields: st
                    .fields
                    .iter()
                    .map(|f| FieldInfo {
                        name: FieldName::Named(f.name),
                        shape: f.shape(),
                        offset: f.offset,
                    })
                    .collect(),
            })
        }
    }

    let err = Factory::new(&Registry::new())
        .with_introspector(&Permissive)
        .create::<Span>()
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::UnbuildableType {
            shape: Span::SHAPE,
            reason: NotIntrospectableReason::InvariantsViolated,
        }
    );
}

describe! {
    #[derive(Debug)]
    pub struct Node {
        pub value: u8,
        pub next: Box<Node>,
    }
}

#[test]
fn self_containing_type_is_a_cycle() {
    let err = create_default::<Node>(&Registry::inferred()).unwrap_err();
    assert_eq!(
        *err.root_cause(),
        BuildError::CyclicType {
            shape: Node::SHAPE,
            depth: 2,
        }
    );
    assert_eq!(err.field_path().as_deref(), Some("Node.next.*"));
}

#[test]
fn depth_limit_without_cycle_detection() {
    let err = Factory::new(&Registry::inferred())
        .detect_cycles(false)
        .max_depth(Some(16))
        .create::<Node>()
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        BuildError::DepthLimitExceeded { limit: 16, .. }
    ));
}

#[test]
fn depth_limit_counts_every_level() {
    describe! {
        #[derive(Debug, PartialEq)]
        struct Leaf {
            value: u8,
        }
    }
    describe! {
        #[derive(Debug, PartialEq)]
        struct Branch {
            leaf: Leaf,
        }
    }
    describe! {
        #[derive(Debug, PartialEq)]
        struct Trunk {
            branch: Branch,
        }
    }

    let registry = Registry::new();
    let err = Factory::new(&registry)
        .max_depth(Some(2))
        .create::<Trunk>()
        .unwrap_err();
    assert_eq!(
        *err.root_cause(),
        BuildError::DepthLimitExceeded {
            shape: Leaf::SHAPE,
            limit: 2,
        }
    );
    assert_eq!(err.field_path().as_deref(), Some("Trunk.branch.leaf"));

    // Trunk, Branch, Leaf and the u8 inside it
    let trunk = Factory::new(&registry).max_depth(Some(4)).create::<Trunk>()?;
    assert_eq!(trunk.branch.leaf.value, 0);
    Factory::new(&registry).max_depth(None).create::<Trunk>()?;
}
