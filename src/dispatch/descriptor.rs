use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::dispatch::layout::is_row_major;
use crate::dispatch::{
    ArrayLike, ArrayLikeMut, DType, ElementKind, LayoutPolicy, ZfpError, ZfpResult,
};

/// Largest number of axes the codec supports.
pub const MAX_RANK: usize = 4;

/// Normalized view of a host array, valid for one compress call.
///
/// Extents are stored slowest-varying first, as declared by the host.
#[derive(Debug, Clone, Copy)]
pub struct ArrayDescriptor<'a> {
    kind: ElementKind,
    rank: usize,
    extents: [usize; MAX_RANK],
    strides: [isize; MAX_RANK],
    contiguous: bool,
    data: NonNull<u8>,
    _borrow: PhantomData<&'a [u8]>,
}

impl ArrayDescriptor<'_> {
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents[..self.rank]
    }

    pub fn byte_strides(&self) -> &[isize] {
        &self.strides[..self.rank]
    }

    /// Row-major contiguous and aligned for the element kind.
    pub fn is_contiguous(&self) -> bool {
        self.contiguous
    }

    pub fn element_count(&self) -> usize {
        self.extents().iter().product()
    }

    /// Size of the elements in bytes, ignoring any gaps between them.
    pub fn byte_len(&self) -> usize {
        self.element_count() * self.kind.width()
    }

    pub(crate) fn data_ptr(&self) -> NonNull<u8> {
        self.data
    }
}

/// Normalized view of a writable host array, valid for one decompress call.
#[derive(Debug)]
pub struct DestinationDescriptor<'a> {
    inner: ArrayDescriptor<'a>,
    _borrow: PhantomData<&'a mut [u8]>,
}

impl DestinationDescriptor<'_> {
    pub(crate) fn data_ptr_mut(&mut self) -> NonNull<u8> {
        self.inner.data
    }
}

impl<'a> Deref for DestinationDescriptor<'a> {
    type Target = ArrayDescriptor<'a>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Resolves `array`, rejecting anything that is not row-major contiguous.
pub fn resolve(array: &dyn ArrayLike) -> ZfpResult<ArrayDescriptor<'_>> {
    resolve_with(array, LayoutPolicy::Strict)
}

/// Resolves `array` under the given layout policy.
///
/// Checks, in order: element type, rank, empty axes, layout.
pub fn resolve_with(array: &dyn ArrayLike, layout: LayoutPolicy) -> ZfpResult<ArrayDescriptor<'_>> {
    inspect(
        array.dtype(),
        array.shape(),
        &array.byte_strides(),
        array.data_ptr(),
        layout,
    )
}

/// Resolves a destination, rejecting anything that is not row-major contiguous.
pub fn resolve_mut(array: &mut dyn ArrayLikeMut) -> ZfpResult<DestinationDescriptor<'_>> {
    resolve_mut_with(array, LayoutPolicy::Strict)
}

/// Resolves a destination under the given layout policy.
pub fn resolve_mut_with(
    array: &mut dyn ArrayLikeMut,
    layout: LayoutPolicy,
) -> ZfpResult<DestinationDescriptor<'_>> {
    let data = array.data_ptr_mut();
    let inner = inspect(
        array.dtype(),
        array.shape(),
        &array.byte_strides(),
        data,
        layout,
    )?;
    Ok(DestinationDescriptor {
        inner,
        _borrow: PhantomData,
    })
}

fn inspect<'a>(
    dtype: DType,
    shape: &[usize],
    strides: &[isize],
    data: NonNull<u8>,
    layout: LayoutPolicy,
) -> ZfpResult<ArrayDescriptor<'a>> {
    let kind = ElementKind::try_from(dtype)?;

    let rank = shape.len();
    if !(1..=MAX_RANK).contains(&rank) {
        return Err(ZfpError::UnsupportedRank(rank));
    }
    if shape.contains(&0) {
        return Err(ZfpError::EmptyArray {
            shape: shape.to_vec(),
        });
    }
    if strides.len() != rank {
        return Err(ZfpError::NonContiguous);
    }

    let aligned = (data.as_ptr() as usize) % kind.width() == 0;
    let contiguous = aligned && is_row_major(shape, strides, kind.width());
    if !contiguous && layout == LayoutPolicy::Strict {
        return Err(ZfpError::NonContiguous);
    }

    let mut descriptor = ArrayDescriptor {
        kind,
        rank,
        extents: [0; MAX_RANK],
        strides: [0; MAX_RANK],
        contiguous,
        data,
        _borrow: PhantomData,
    };
    descriptor.extents[..rank].copy_from_slice(shape);
    descriptor.strides[..rank].copy_from_slice(strides);
    Ok(descriptor)
}
