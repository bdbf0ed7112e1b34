#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

use std::ptr::NonNull;

#[cfg(feature = "zfp")]
/// Native backend over the [zfp C library](https://zfp.io/)
pub mod zfp;

/// Array resolution, mode validation and `(kind, rank)` dispatch
pub mod dispatch;

pub use dispatch::{
    padded_element_count, resolve, resolve_mut, resolve_mut_with, resolve_with, size_bound,
    ArrayDescriptor, ArrayLike, ArrayLikeMut, CompressedBuffer, CompressionMode, DType,
    DestinationDescriptor, Dispatcher, Element, ElementKind, HostElement, LayoutPolicy, Mode,
    ModeParameterError, ModeParameters, RateBlocks, RawArray, RawArrayMut, Settings, ZfpError,
    ZfpResult, BLOCK_EDGE, HEADER_BYTES, MAX_RANK,
};

/// Compresses `array` with the zfp backend and default [`Settings`].
///
/// ```no_run
/// # use zfparray::Mode;
/// let data = ndarray::Array2::<f32>::zeros((64, 64));
/// let compressed = zfparray::compress(&data, &Mode::FixedAccuracy { tolerance: 1e-3 }).unwrap();
///
/// let mut restored = ndarray::Array2::<f32>::zeros((64, 64));
/// zfparray::decompress(&compressed, &mut restored, &Mode::FixedAccuracy { tolerance: 1e-3 }).unwrap();
/// ```
#[cfg(feature = "zfp")]
pub fn compress(array: &dyn ArrayLike, mode: &Mode) -> ZfpResult<CompressedBuffer> {
    Dispatcher::new(zfp::Zfp).compress(array, mode)
}

/// Decompresses `buffer` into `destination` with the zfp backend and default [`Settings`].
///
/// `destination` must have the shape and element type the buffer was compressed from.
#[cfg(feature = "zfp")]
pub fn decompress(buffer: &[u8], destination: &mut dyn ArrayLikeMut, mode: &Mode) -> ZfpResult<()> {
    Dispatcher::new(zfp::Zfp).decompress(buffer, destination, mode)
}

/// Failure reported by a [`NativeCodec`].
///
/// The [`Dispatcher`] translates these into [`ZfpError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeError {
    /// Opaque failure code, passed through uninterpreted
    Code(i32),
    /// The bitstream ended before the field was fully decoded
    Truncated,
    /// The bitstream is structurally inconsistent with the stream parameters
    Inconsistent,
    /// The output would not fit in the bitstream capacity
    Overflow,
}

/// Everything a backend needs to configure its stream for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    /// Fidelity policy and its parameter
    pub mode: Mode,
    /// Element kind of the field
    pub kind: ElementKind,
    /// Dimensionality used to convert a fixed rate into bits per block
    pub rate_dims: u32,
    /// Round fixed-rate blocks up to whole stream words
    pub align_rate: bool,
}

/// Low-level interface to a block-transform codec.
///
/// The shape mirrors the zfp C API: rank-specific field constructors, a
/// bitstream opened over caller memory, and compress/decompress entry points
/// taking both. Handles are plain values; the [`Dispatcher`] owns them in
/// scope guards and hands each one back to `close_field` / `close_bitstream`
/// exactly once, on every exit path.
///
/// Extents are given fastest-varying first, so a row-major array of shape
/// `[ny, nx]` opens as `open_field_2d(data, kind, nx, ny)`.
pub trait NativeCodec {
    /// Native description of an array's memory, type and shape.
    type Field;
    /// Native bitstream plus stream state.
    type Stream;

    /// Opens a 1-D field.
    ///
    /// # Safety
    ///
    /// `data` must be aligned for `kind` and valid for reads of `nx` elements
    /// until the returned field is closed. It must also be valid for writes
    /// if the field is passed to [`NativeCodec::decompress`].
    unsafe fn open_field_1d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
    ) -> Result<Self::Field, NativeError>;

    /// Opens a 2-D field.
    ///
    /// # Safety
    ///
    /// Same contract as [`NativeCodec::open_field_1d`] for `nx * ny` elements.
    unsafe fn open_field_2d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
    ) -> Result<Self::Field, NativeError>;

    /// Opens a 3-D field.
    ///
    /// # Safety
    ///
    /// Same contract as [`NativeCodec::open_field_1d`] for `nx * ny * nz` elements.
    unsafe fn open_field_3d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
        nz: usize,
    ) -> Result<Self::Field, NativeError>;

    /// Opens a 4-D field.
    ///
    /// # Safety
    ///
    /// Same contract as [`NativeCodec::open_field_1d`] for `nx * ny * nz * nw` elements.
    unsafe fn open_field_4d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
        nz: usize,
        nw: usize,
    ) -> Result<Self::Field, NativeError>;

    /// Releases a field handle.
    fn close_field(&self, field: Self::Field);

    /// Worst-case number of bytes a stream configured with `config` may
    /// write (or read) for `field`.
    fn maximum_size(&self, field: &Self::Field, config: &StreamConfig)
        -> Result<usize, NativeError>;

    /// Exact number of bytes decoding `field` reads, when `config` fixes it.
    ///
    /// Decompression input at least this long is read in place; without it
    /// the input is staged up to [`NativeCodec::maximum_size`]. A backend
    /// must never read past the size it reports here.
    fn exact_size(
        &self,
        _field: &Self::Field,
        _config: &StreamConfig,
    ) -> Result<Option<usize>, NativeError> {
        Ok(None)
    }

    /// Opens a bitstream over `capacity` bytes starting at `buffer`.
    ///
    /// # Safety
    ///
    /// `buffer` must be aligned to 8 bytes and valid for `capacity` bytes
    /// until the returned stream is closed. It must be valid for writes if
    /// the stream is passed to [`NativeCodec::compress`].
    unsafe fn open_bitstream(
        &self,
        buffer: NonNull<u8>,
        capacity: usize,
    ) -> Result<Self::Stream, NativeError>;

    /// Releases a bitstream handle.
    fn close_bitstream(&self, stream: Self::Stream);

    /// Compresses `field` into `stream`, returning the number of bytes written.
    fn compress(
        &self,
        field: &Self::Field,
        stream: &mut Self::Stream,
        config: &StreamConfig,
    ) -> Result<usize, NativeError>;

    /// Decompresses `stream` into `field`, returning the number of bytes consumed.
    fn decompress(
        &self,
        field: &mut Self::Field,
        stream: &mut Self::Stream,
        config: &StreamConfig,
    ) -> Result<usize, NativeError>;
}
