#![doc = include_str!("README.md")]

use std::ffi::c_void;
use std::ptr::{self, NonNull};

use zfp_sys::{
    bitstream, stream_close, stream_open, zfp_compress, zfp_decompress, zfp_field, zfp_field_1d,
    zfp_field_2d, zfp_field_3d, zfp_field_4d, zfp_field_blocks, zfp_field_free, zfp_stream,
    zfp_stream_close, zfp_stream_maximum_size, zfp_stream_open, zfp_stream_params,
    zfp_stream_rewind, zfp_stream_set_accuracy, zfp_stream_set_precision, zfp_stream_set_rate,
    zfp_stream_set_reversible,
};

use crate::{ElementKind, Mode, NativeCodec, NativeError, StreamConfig};

/// The zfp library as a [`NativeCodec`].
///
/// Stateless: every handle it hands out is created and freed within a single
/// [`Dispatcher`](crate::Dispatcher) call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zfp;

impl Zfp {
    /// `zfp_field_*d` returned null.
    pub const FIELD_ALLOC_FAILED: i32 = -1;
    /// `zfp_stream_open` or `stream_open` returned null.
    pub const STREAM_OPEN_FAILED: i32 = -2;
    /// `zfp_stream_maximum_size` returned zero.
    pub const MAXIMUM_SIZE_FAILED: i32 = -3;
    /// `zfp_compress` returned zero.
    pub const COMPRESS_FAILED: i32 = -4;
    /// `zfp_decompress` returned zero.
    pub const DECOMPRESS_FAILED: i32 = -5;
}

/// Owned `zfp_field`, freed on drop. Does not own the array memory.
#[derive(Debug)]
pub struct ZfpField(NonNull<zfp_field>);

impl Drop for ZfpField {
    fn drop(&mut self) {
        unsafe { zfp_field_free(self.0.as_ptr()) };
    }
}

/// Owned `zfp_stream` and the `bitstream` it reads or writes, both closed
/// on drop. Does not own the buffer memory.
#[derive(Debug)]
pub struct ZfpStream {
    zfp: NonNull<zfp_stream>,
    bits: NonNull<bitstream>,
}

impl Drop for ZfpStream {
    fn drop(&mut self) {
        unsafe {
            zfp_stream_close(self.zfp.as_ptr());
            stream_close(self.bits.as_ptr());
        }
    }
}

fn zfp_type(kind: ElementKind) -> zfp_sys::zfp_type {
    match kind {
        ElementKind::Float32 => zfp_sys::zfp_type_zfp_type_float,
        ElementKind::Float64 => zfp_sys::zfp_type_zfp_type_double,
        ElementKind::Int32 => zfp_sys::zfp_type_zfp_type_int32,
        ElementKind::Int64 => zfp_sys::zfp_type_zfp_type_int64,
    }
}

/// Applies the compression mode to `zfp`.
///
/// # Safety
///
/// `zfp` must be an open stream.
unsafe fn set_mode(zfp: NonNull<zfp_stream>, config: &StreamConfig) {
    let zfp = zfp.as_ptr();
    unsafe {
        match config.mode {
            Mode::FixedRate { rate } => {
                zfp_stream_set_rate(
                    zfp,
                    rate,
                    zfp_type(config.kind),
                    config.rate_dims,
                    i32::from(config.align_rate),
                );
            }
            Mode::FixedPrecision { precision } => {
                zfp_stream_set_precision(zfp, precision);
            }
            Mode::FixedAccuracy { tolerance } => {
                zfp_stream_set_accuracy(zfp, tolerance);
            }
            Mode::Reversible => zfp_stream_set_reversible(zfp),
        }
    }
}

/// Runs `f` on a detached stream configured with `config`.
fn with_detached_stream<T>(
    config: &StreamConfig,
    f: impl FnOnce(NonNull<zfp_stream>) -> T,
) -> Result<T, NativeError> {
    let zfp = NonNull::new(unsafe { zfp_stream_open(ptr::null_mut()) })
        .ok_or(NativeError::Code(Zfp::STREAM_OPEN_FAILED))?;
    unsafe { set_mode(zfp, config) };
    let result = f(zfp);
    unsafe { zfp_stream_close(zfp.as_ptr()) };
    Ok(result)
}

fn field(raw: *mut zfp_field) -> Result<ZfpField, NativeError> {
    NonNull::new(raw)
        .map(ZfpField)
        .ok_or(NativeError::Code(Zfp::FIELD_ALLOC_FAILED))
}

impl NativeCodec for Zfp {
    type Field = ZfpField;
    type Stream = ZfpStream;

    unsafe fn open_field_1d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
    ) -> Result<ZfpField, NativeError> {
        field(unsafe { zfp_field_1d(data.as_ptr().cast::<c_void>(), zfp_type(kind), nx) })
    }

    unsafe fn open_field_2d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
    ) -> Result<ZfpField, NativeError> {
        field(unsafe { zfp_field_2d(data.as_ptr().cast::<c_void>(), zfp_type(kind), nx, ny) })
    }

    unsafe fn open_field_3d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
        nz: usize,
    ) -> Result<ZfpField, NativeError> {
        field(unsafe { zfp_field_3d(data.as_ptr().cast::<c_void>(), zfp_type(kind), nx, ny, nz) })
    }

    unsafe fn open_field_4d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
        nz: usize,
        nw: usize,
    ) -> Result<ZfpField, NativeError> {
        field(unsafe {
            zfp_field_4d(data.as_ptr().cast::<c_void>(), zfp_type(kind), nx, ny, nz, nw)
        })
    }

    fn close_field(&self, field: ZfpField) {
        drop(field);
    }

    fn maximum_size(&self, field: &ZfpField, config: &StreamConfig) -> Result<usize, NativeError> {
        let size = with_detached_stream(config, |zfp| unsafe {
            zfp_stream_maximum_size(zfp.as_ptr(), field.0.as_ptr())
        })?;
        match size {
            0 => Err(NativeError::Code(Zfp::MAXIMUM_SIZE_FAILED)),
            size => Ok(size),
        }
    }

    /// Fixed rate only: every block takes exactly `maxbits`, and the stream
    /// is flushed to whole 64-bit words. Other modes stop at data-dependent
    /// points.
    fn exact_size(
        &self,
        field: &ZfpField,
        config: &StreamConfig,
    ) -> Result<Option<usize>, NativeError> {
        if !matches!(config.mode, Mode::FixedRate { .. }) {
            return Ok(None);
        }
        let maxbits = with_detached_stream(config, |zfp| {
            let mut maxbits = 0;
            unsafe {
                zfp_stream_params(
                    zfp.as_ptr(),
                    ptr::null_mut(),
                    &mut maxbits,
                    ptr::null_mut(),
                    ptr::null_mut(),
                );
            }
            maxbits
        })?;
        let blocks = unsafe { zfp_field_blocks(field.0.as_ptr()) };
        let bits = blocks * maxbits as usize;
        Ok(Some(bits.div_ceil(64) * 8))
    }

    unsafe fn open_bitstream(
        &self,
        buffer: NonNull<u8>,
        capacity: usize,
    ) -> Result<ZfpStream, NativeError> {
        let bits = NonNull::new(unsafe { stream_open(buffer.as_ptr().cast::<c_void>(), capacity) })
            .ok_or(NativeError::Code(Zfp::STREAM_OPEN_FAILED))?;
        match NonNull::new(unsafe { zfp_stream_open(bits.as_ptr()) }) {
            Some(zfp) => Ok(ZfpStream { zfp, bits }),
            None => {
                unsafe { stream_close(bits.as_ptr()) };
                Err(NativeError::Code(Zfp::STREAM_OPEN_FAILED))
            }
        }
    }

    fn close_bitstream(&self, stream: ZfpStream) {
        drop(stream);
    }

    fn compress(
        &self,
        field: &ZfpField,
        stream: &mut ZfpStream,
        config: &StreamConfig,
    ) -> Result<usize, NativeError> {
        let written = unsafe {
            set_mode(stream.zfp, config);
            zfp_stream_rewind(stream.zfp.as_ptr());
            zfp_compress(stream.zfp.as_ptr(), field.0.as_ptr())
        };
        match written {
            0 => Err(NativeError::Code(Zfp::COMPRESS_FAILED)),
            written => Ok(written),
        }
    }

    fn decompress(
        &self,
        field: &mut ZfpField,
        stream: &mut ZfpStream,
        config: &StreamConfig,
    ) -> Result<usize, NativeError> {
        let consumed = unsafe {
            set_mode(stream.zfp, config);
            zfp_stream_rewind(stream.zfp.as_ptr());
            zfp_decompress(stream.zfp.as_ptr(), field.0.as_ptr())
        };
        match consumed {
            0 => Err(NativeError::Code(Zfp::DECOMPRESS_FAILED)),
            consumed => Ok(consumed),
        }
    }
}

/// Generates a reversible round trip per element kind and rank.
macro_rules! reversible_roundtrips {
    ($($name:ident => $ty:ty,)*) => {
    };
}

reversible_roundtrips! {
    reversible_f32 => f32,
    reversible_f64 => f64,
    reversible_i32 => i32,
    reversible_i64 => i64,
}
