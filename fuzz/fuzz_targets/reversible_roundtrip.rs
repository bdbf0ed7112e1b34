#![no_main]

use libfuzzer_sys::fuzz_target;
use zfparray::{Mode, RawArray, RawArrayMut};

mod common;
use common::shape;

#[derive(arbitrary::Arbitrary, Debug)]
struct FuzzInput {
    extents: Vec<u8>,
    values: Vec<i32>,
}

fuzz_target!(|input: FuzzInput| {
    let shape = shape(&input.extents);
    let count: usize = shape.iter().product();
    if input.values.len() < count {
        return;
    }
    let values = &input.values[..count];

    let array = RawArray::from_slice(values, &shape).unwrap();
    let compressed = zfparray::compress(&array, &Mode::Reversible).unwrap();

    let mut restored = vec![0i32; count];
    let mut destination = RawArrayMut::from_slice(&mut restored, &shape).unwrap();
    zfparray::decompress(&compressed, &mut destination, &Mode::Reversible).unwrap();
    assert_eq!(restored, values);
});
