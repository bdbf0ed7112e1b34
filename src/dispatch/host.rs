use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::dispatch::layout::row_major_strides;
use crate::dispatch::{DType, HostElement, ZfpError, ZfpResult};

/// A host array the resolver can inspect.
///
/// # Safety
///
/// `data_ptr` must point at the element with index `[0, 0, ...]`, and every
/// element reachable through `shape` and `byte_strides` must be valid for
/// reads of `dtype().size()` bytes for as long as `self` is borrowed.
/// `byte_strides` must have one entry per axis.
pub unsafe trait ArrayLike {
    /// Runtime element type.
    fn dtype(&self) -> DType;

    /// Declared extents, slowest-varying axis first.
    fn shape(&self) -> &[usize];

    /// Distance in bytes between neighbours along each axis.
    fn byte_strides(&self) -> Vec<isize>;

    /// Address of the first element. May dangle when the array is empty.
    fn data_ptr(&self) -> NonNull<u8>;
}

/// A host array that can be decompressed into.
///
/// # Safety
///
/// In addition to the [`ArrayLike`] contract, the memory returned by
/// `data_ptr_mut` must be valid for writes for as long as `self` is
/// mutably borrowed.
pub unsafe trait ArrayLikeMut: ArrayLike {
    /// Address of the first element, for writing.
    fn data_ptr_mut(&mut self) -> NonNull<u8>;
}

/// Borrowed view over foreign array memory: pointer, element type, shape
/// and byte strides, the way buffer-protocol hosts describe arrays.
#[derive(Debug, Clone)]
pub struct RawArray<'a> {
    data: NonNull<u8>,
    dtype: DType,
    shape: Vec<usize>,
    byte_strides: Vec<isize>,
    _borrow: PhantomData<&'a [u8]>,
}

impl<'a> RawArray<'a> {
    /// Row-major view of `data` with the given `shape`.
    pub fn from_slice<T: HostElement>(data: &'a [T], shape: &[usize]) -> ZfpResult<Self> {
        check_len(shape, data.len())?;
        Ok(Self {
            data: NonNull::from(data).cast(),
            dtype: T::DTYPE,
            shape: shape.to_vec(),
            byte_strides: row_major_strides(shape, size_of::<T>()),
            _borrow: PhantomData,
        })
    }

    /// Row-major view of raw bytes holding `dtype` elements.
    ///
    /// `bytes` need not be aligned; a misaligned view is treated as
    /// non-contiguous by the resolver.
    pub fn from_bytes(bytes: &'a [u8], dtype: DType, shape: &[usize]) -> ZfpResult<Self> {
        check_byte_len(shape, dtype, bytes.len())?;
        Ok(Self {
            data: NonNull::from(bytes).cast(),
            dtype,
            shape: shape.to_vec(),
            byte_strides: row_major_strides(shape, dtype.size()),
            _borrow: PhantomData,
        })
    }

    /// View over arbitrary strided memory.
    ///
    /// # Safety
    ///
    /// `data`, `shape` and `byte_strides` must satisfy the [`ArrayLike`]
    /// contract for the lifetime `'a`.
    pub unsafe fn from_raw_parts(
        data: NonNull<u8>,
        dtype: DType,
        shape: &[usize],
        byte_strides: &[isize],
    ) -> Self {
        Self {
            data,
            dtype,
            shape: shape.to_vec(),
            byte_strides: byte_strides.to_vec(),
            _borrow: PhantomData,
        }
    }
}

unsafe impl ArrayLike for RawArray<'_> {
    fn dtype(&self) -> DType {
        self.dtype
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn byte_strides(&self) -> Vec<isize> {
        self.byte_strides.clone()
    }

    fn data_ptr(&self) -> NonNull<u8> {
        self.data
    }
}

/// Mutable counterpart of [`RawArray`].
#[derive(Debug)]
pub struct RawArrayMut<'a> {
    data: NonNull<u8>,
    dtype: DType,
    shape: Vec<usize>,
    byte_strides: Vec<isize>,
    _borrow: PhantomData<&'a mut [u8]>,
}

impl<'a> RawArrayMut<'a> {
    /// Row-major view of `data` with the given `shape`.
    pub fn from_slice<T: HostElement>(data: &'a mut [T], shape: &[usize]) -> ZfpResult<Self> {
        check_len(shape, data.len())?;
        Ok(Self {
            data: NonNull::from(data).cast(),
            dtype: T::DTYPE,
            shape: shape.to_vec(),
            byte_strides: row_major_strides(shape, size_of::<T>()),
            _borrow: PhantomData,
        })
    }

    /// Row-major view of raw bytes holding `dtype` elements.
    pub fn from_bytes(bytes: &'a mut [u8], dtype: DType, shape: &[usize]) -> ZfpResult<Self> {
        check_byte_len(shape, dtype, bytes.len())?;
        Ok(Self {
            data: NonNull::from(bytes).cast(),
            dtype,
            shape: shape.to_vec(),
            byte_strides: row_major_strides(shape, dtype.size()),
            _borrow: PhantomData,
        })
    }

    /// View over arbitrary strided memory.
    ///
    /// # Safety
    ///
    /// `data`, `shape` and `byte_strides` must satisfy the [`ArrayLikeMut`]
    /// contract for the lifetime `'a`, and no other reference may access the
    /// memory during `'a`.
    pub unsafe fn from_raw_parts(
        data: NonNull<u8>,
        dtype: DType,
        shape: &[usize],
        byte_strides: &[isize],
    ) -> Self {
        Self {
            data,
            dtype,
            shape: shape.to_vec(),
            byte_strides: byte_strides.to_vec(),
            _borrow: PhantomData,
        }
    }
}

unsafe impl ArrayLike for RawArrayMut<'_> {
    fn dtype(&self) -> DType {
        self.dtype
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn byte_strides(&self) -> Vec<isize> {
        self.byte_strides.clone()
    }

    fn data_ptr(&self) -> NonNull<u8> {
        self.data
    }
}

unsafe impl ArrayLikeMut for RawArrayMut<'_> {
    fn data_ptr_mut(&mut self) -> NonNull<u8> {
        self.data
    }
}

fn check_len(shape: &[usize], actual: usize) -> ZfpResult<()> {
    let expected: usize = shape.iter().product();
    if expected == actual {
        Ok(())
    } else {
        Err(ZfpError::ShapeMismatch { expected, actual })
    }
}

fn check_byte_len(shape: &[usize], dtype: DType, bytes: usize) -> ZfpResult<()> {
    if bytes % dtype.size() != 0 {
        return Err(ZfpError::ShapeMismatch {
            expected: shape.iter().product(),
            actual: bytes / dtype.size(),
        });
    }
    check_len(shape, bytes / dtype.size())
}

#[cfg(feature = "ndarray")]
mod ndarray_impl {
    use std::ptr::NonNull;

    use ndarray::{ArrayBase, Data, DataMut, Dimension};

    use super::{ArrayLike, ArrayLikeMut};
    use crate::dispatch::{DType, HostElement};

    unsafe impl<S, D> ArrayLike for ArrayBase<S, D>
    where
        S: Data,
        S::Elem: HostElement,
        D: Dimension,
    {
        fn dtype(&self) -> DType {
            <S::Elem as HostElement>::DTYPE
        }

        fn shape(&self) -> &[usize] {
            ArrayBase::shape(self)
        }

        fn byte_strides(&self) -> Vec<isize> {
            let width = size_of::<S::Elem>() as isize;
            ArrayBase::strides(self).iter().map(|s| s * width).collect()
        }

        fn data_ptr(&self) -> NonNull<u8> {
            NonNull::new(self.as_ptr().cast_mut().cast()).unwrap_or(NonNull::dangling())
        }
    }

    unsafe impl<S, D> ArrayLikeMut for ArrayBase<S, D>
    where
        S: DataMut,
        S::Elem: HostElement,
        D: Dimension,
    {
        fn data_ptr_mut(&mut self) -> NonNull<u8> {
            NonNull::new(self.as_mut_ptr().cast()).unwrap_or(NonNull::dangling())
        }
    }
}
