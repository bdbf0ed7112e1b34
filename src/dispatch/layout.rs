use std::ptr::{self, NonNull};

use crate::dispatch::MAX_RANK;

/// Byte strides of a row-major contiguous array.
pub(crate) fn row_major_strides(shape: &[usize], width: usize) -> Vec<isize> {
    let mut strides = vec![0; shape.len()];
    let mut step = width as isize;
    for (stride, &extent) in strides.iter_mut().zip(shape).rev() {
        *stride = step;
        step *= extent as isize;
    }
    strides
}

/// Whether `strides` describe a row-major contiguous layout.
///
/// Axes of extent 1 are never stepped over, so their stride is ignored.
pub(crate) fn is_row_major(shape: &[usize], strides: &[isize], width: usize) -> bool {
    if shape.len() != strides.len() {
        return false;
    }
    let mut expected = width as isize;
    for (&extent, &stride) in shape.iter().zip(strides).rev() {
        if extent != 1 && stride != expected {
            return false;
        }
        expected *= extent as isize;
    }
    true
}

/// Calls `visit(linear_index, byte_offset)` for every element in row-major order.
fn for_each_offset(extents: &[usize], strides: &[isize], mut visit: impl FnMut(usize, isize)) {
    let rank = extents.len();
    let count: usize = extents.iter().product();
    let mut index = [0usize; MAX_RANK];
    let mut offset = 0isize;
    for linear in 0..count {
        visit(linear, offset);
        for axis in (0..rank).rev() {
            index[axis] += 1;
            offset += strides[axis];
            if index[axis] < extents[axis] {
                break;
            }
            offset -= strides[axis] * extents[axis] as isize;
            index[axis] = 0;
        }
    }
}

/// Copies a strided array into the contiguous buffer `out`.
///
/// # Safety
///
/// Every element addressed by `base`, `extents` and `strides` must be valid
/// for reads of `width` bytes, and `out` must hold `count * width` bytes.
pub(crate) unsafe fn gather(
    base: NonNull<u8>,
    extents: &[usize],
    strides: &[isize],
    width: usize,
    out: &mut [u8],
) {
    for_each_offset(extents, strides, |linear, offset| {
        let dst = &mut out[linear * width..(linear + 1) * width];
        // SAFETY: `offset` addresses an element of the source array
        unsafe { ptr::copy_nonoverlapping(base.as_ptr().offset(offset), dst.as_mut_ptr(), width) };
    });
}

/// Copies the contiguous buffer `src` into a strided array.
///
/// # Safety
///
/// Every element addressed by `base`, `extents` and `strides` must be valid
/// for writes of `width` bytes, and `src` must hold `count * width` bytes.
pub(crate) unsafe fn scatter(
    src: &[u8],
    base: NonNull<u8>,
    extents: &[usize],
    strides: &[isize],
    width: usize,
) {
    for_each_offset(extents, strides, |linear, offset| {
        let from = &src[linear * width..(linear + 1) * width];
        // SAFETY: `offset` addresses an element of the destination array
        unsafe { ptr::copy_nonoverlapping(from.as_ptr(), base.as_ptr().offset(offset), width) };
    });
}
