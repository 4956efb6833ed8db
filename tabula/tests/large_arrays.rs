//! Arrays report one field per element; building them must stay linear in the element
//! count. These tests install no logger, so tracing costs nothing here.

use std::time::{Duration, Instant};

use tabula::{Describe, Registry, create_default_of, describe};

const BUDGET: Duration = Duration::from_secs(5);

#[test]
fn large_byte_array_builds_in_linear_time() {
    const N: usize = 64 * 1024;
    let registry = Registry::new();

    let started = Instant::now();
    let value = create_default_of(&registry, <[u8; N]>::SHAPE).unwrap();
    let elapsed = started.elapsed();

    let bytes = value.into_box::<[u8; N]>().unwrap();
    assert!(bytes.iter().all(|b| *b == 0));
    assert!(
        elapsed < BUDGET,
        "building [u8; {N}] took {elapsed:?}, budget is {BUDGET:?}"
    );
}

describe! {
    #[derive(Debug, PartialEq, Clone, Copy)]
    pub struct Pixel {
        pub r: u8,
        pub g: u8,
        pub b: u8,
    }
}

#[test]
fn large_array_of_structs() {
    const N: usize = 16 * 1024;
    let registry = Registry::inferred();

    let started = Instant::now();
    let value = create_default_of(&registry, <[Pixel; N]>::SHAPE).unwrap();
    let elapsed = started.elapsed();

    let pixels = value.into_box::<[Pixel; N]>().unwrap();
    assert!(pixels.iter().all(|p| *p == Pixel { r: 0, g: 0, b: 0 }));
    assert!(
        elapsed < BUDGET,
        "building [Pixel; {N}] took {elapsed:?}, budget is {BUDGET:?}"
    );
}
