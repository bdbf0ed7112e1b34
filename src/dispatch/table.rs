use std::ptr::NonNull;

use crate::dispatch::{Element, ElementKind};
use crate::{NativeCodec, NativeError};

/// Opens a native field over contiguous memory with the given extents,
/// slowest-varying first.
pub(crate) type FieldConstructor<C> =
    unsafe fn(&C, NonNull<u8>, &[usize]) -> Result<<C as NativeCodec>::Field, NativeError>;

// The codec wants the fastest-varying extent first, so the host shape is
// handed over reversed.

unsafe fn open_1d<C: NativeCodec, T: Element>(
    codec: &C,
    data: NonNull<u8>,
    extents: &[usize],
) -> Result<C::Field, NativeError> {
    unsafe { codec.open_field_1d(data, T::KIND, extents[0]) }
}

unsafe fn open_2d<C: NativeCodec, T: Element>(
    codec: &C,
    data: NonNull<u8>,
    extents: &[usize],
) -> Result<C::Field, NativeError> {
    unsafe { codec.open_field_2d(data, T::KIND, extents[1], extents[0]) }
}

unsafe fn open_3d<C: NativeCodec, T: Element>(
    codec: &C,
    data: NonNull<u8>,
    extents: &[usize],
) -> Result<C::Field, NativeError> {
    unsafe { codec.open_field_3d(data, T::KIND, extents[2], extents[1], extents[0]) }
}

unsafe fn open_4d<C: NativeCodec, T: Element>(
    codec: &C,
    data: NonNull<u8>,
    extents: &[usize],
) -> Result<C::Field, NativeError> {
    unsafe { codec.open_field_4d(data, T::KIND, extents[3], extents[2], extents[1], extents[0]) }
}

macro_rules! field_table {
    ($($kind:ident => $ty:ty),+ $(,)?) => {
        /// Field constructor for a `(kind, rank)` pair, if the codec has one.
        pub(crate) fn field_constructor<C: NativeCodec>(
            kind: ElementKind,
            rank: usize,
        ) -> Option<FieldConstructor<C>> {
            match (kind, rank) {
                $(
                    (ElementKind::$kind, 1) => Some(open_1d::<C, $ty> as FieldConstructor<C>),
                    (ElementKind::$kind, 2) => Some(open_2d::<C, $ty> as FieldConstructor<C>),
                    (ElementKind::$kind, 3) => Some(open_3d::<C, $ty> as FieldConstructor<C>),
                    (ElementKind::$kind, 4) => Some(open_4d::<C, $ty> as FieldConstructor<C>),
                )+
                _ => None,
            }
        }
    };
}

field_table! {
    Float32 => f32,
    Float64 => f64,
    Int32 => i32,
    Int64 => i64,
}
