#![no_main]

use libfuzzer_sys::fuzz_target;
use zfparray::{DType, ElementKind, RawArrayMut};

mod common;
use common::{shape, FuzzKind, FuzzMode};

#[derive(arbitrary::Arbitrary, Debug)]
struct FuzzInput {
    kind: FuzzKind,
    extents: Vec<u8>,
    mode: FuzzMode,
    stream: Vec<u8>,
}

// Arbitrary bytes must decode to an error or to garbage, never out of bounds.
fuzz_target!(|input: FuzzInput| {
    let kind = ElementKind::from(input.kind);
    let shape = shape(&input.extents);
    let count: usize = shape.iter().product();

    let mut storage = vec![0u64; count];
    let bytes = &mut bytemuck::cast_slice_mut::<u64, u8>(&mut storage)[..count * kind.width()];
    let dtype: DType = kind.dtype();
    let mut destination = RawArrayMut::from_bytes(bytes, dtype, &shape).unwrap();
    let _ = zfparray::decompress(&input.stream, &mut destination, &input.mode.mode());
});

