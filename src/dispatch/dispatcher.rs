use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::dispatch::buffer::InputView;
use crate::dispatch::helpers::word_len;
use crate::dispatch::layout::{gather, scatter};
use crate::dispatch::table::{field_constructor, FieldConstructor};
use crate::dispatch::{
    resolve_mut_with, resolve_with, size_bound, ArrayDescriptor, ArrayLike, ArrayLikeMut,
    CompressedBuffer, DestinationDescriptor, Mode, Settings, ZfpError, ZfpResult,
};
use crate::{NativeCodec, NativeError, StreamConfig};

/// Routes arrays to the codec's field constructor for their `(kind, rank)`
/// and drives one compression or decompression per call.
///
/// A dispatcher holds no per-call state, so a shared reference can serve
/// any number of concurrent calls on disjoint arrays.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<C> {
    codec: C,
    settings: Settings,
}

impl<C: NativeCodec> Dispatcher<C> {
    /// Dispatcher with default [`Settings`].
    pub fn new(codec: C) -> Self {
        Self::with_settings(codec, Settings::default())
    }

    /// Dispatcher with explicit [`Settings`].
    pub fn with_settings(codec: C, settings: Settings) -> Self {
        Self { codec, settings }
    }

    /// Settings applied to every call.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Backend the dispatcher drives.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Resolves `array` and compresses it.
    pub fn compress(&self, array: &dyn ArrayLike, mode: &Mode) -> ZfpResult<CompressedBuffer> {
        let descriptor = resolve_with(array, self.settings.layout)?;
        self.compress_descriptor(&descriptor, mode)
    }

    /// Compresses an already resolved array.
    ///
    /// The mode is validated before any native handle is opened. Strided
    /// descriptors (only produced under [`LayoutPolicy::Gather`](crate::LayoutPolicy::Gather))
    /// are first copied into a contiguous staging buffer.
    pub fn compress_descriptor(
        &self,
        descriptor: &ArrayDescriptor<'_>,
        mode: &Mode,
    ) -> ZfpResult<CompressedBuffer> {
        let kind = descriptor.kind();
        let extents = descriptor.extents();
        mode.validate(kind)?;
        let open = self.lookup(descriptor)?;
        let config = self.stream_config(mode, descriptor);

        let staging = if descriptor.is_contiguous() {
            Vec::new()
        } else {
            gather_words(descriptor)
        };
        let data = if descriptor.is_contiguous() {
            descriptor.data_ptr()
        } else {
            NonNull::from(&staging[..]).cast()
        };

        // SAFETY: `data` is aligned and holds `extents` elements of `kind`,
        // either in the host array or in `staging`, both outliving the field.
        let field = unsafe { FieldGuard::open(&self.codec, open, data, extents)? };
        let maximum = self
            .codec
            .maximum_size(&field, &config)
            .map_err(|e| translate(e, 0))?;
        let bound = size_bound(extents, kind, mode, self.settings.header_bytes);

        let mut buffer = CompressedBuffer::with_capacity(bound.max(maximum));
        let capacity = buffer.capacity();
        log::debug!(
            "compressing {kind} array of shape {extents:?} with {mode}, capacity {capacity} bytes"
        );

        // SAFETY: the word storage is aligned and `capacity` bytes long, and
        // it is not touched again until the stream is closed.
        let mut stream = unsafe { StreamGuard::open(&self.codec, buffer.storage(), capacity)? };
        let written = self
            .codec
            .compress(&field, &mut stream, &config)
            .map_err(|e| translate(e, capacity))?;
        drop(stream);
        drop(field);

        if written > capacity {
            return Err(ZfpError::BufferTooSmall {
                capacity,
                required: written,
            });
        }
        buffer.truncate(written);
        log::debug!("compressed {kind} array of shape {extents:?} into {written} bytes");
        Ok(buffer)
    }

    /// Resolves `destination` and decompresses `buffer` into it.
    pub fn decompress(
        &self,
        buffer: &[u8],
        destination: &mut dyn ArrayLikeMut,
        mode: &Mode,
    ) -> ZfpResult<()> {
        let mut descriptor = resolve_mut_with(destination, self.settings.layout)?;
        self.decompress_descriptor(buffer, &mut descriptor, mode)
    }

    /// Decompresses `buffer` into an already resolved destination.
    ///
    /// The destination must have the kind and shape the buffer was compressed
    /// from, and `mode` must be the mode it was compressed with. A different
    /// mode decodes to garbage unless the codec happens to notice, in which
    /// case [`ZfpError::ModeMismatch`] is returned. The destination contents
    /// are unspecified after an error.
    pub fn decompress_descriptor(
        &self,
        buffer: &[u8],
        destination: &mut DestinationDescriptor<'_>,
        mode: &Mode,
    ) -> ZfpResult<()> {
        let kind = destination.kind();
        mode.validate(kind)?;
        let open = self.lookup(&**destination)?;
        let config = self.stream_config(mode, &**destination);
        let contiguous = destination.is_contiguous();
        let byte_len = destination.byte_len();

        let mut staging: Vec<u64> = if contiguous {
            Vec::new()
        } else {
            vec![0; word_len(byte_len)]
        };
        let data = if contiguous {
            destination.data_ptr_mut()
        } else {
            NonNull::from(&mut staging[..]).cast()
        };

        // SAFETY: `data` is aligned, writable and holds the destination's
        // elements, either in the host array or in `staging`.
        let mut field = unsafe { FieldGuard::open(&self.codec, open, data, destination.extents())? };
        // Read in place when the codec can say exactly how far it reads.
        // Otherwise its worst case may run past `buffer`, so stage instead.
        let exact = self
            .codec
            .exact_size(&field, &config)
            .map_err(|e| translate(e, buffer.len()))?;
        let required = match exact {
            Some(exact) => exact,
            None => self
                .codec
                .maximum_size(&field, &config)
                .map_err(|e| translate(e, buffer.len()))?,
        };
        let input = InputView::new(buffer, required);
        log::debug!(
            "decompressing {} bytes into {kind} array of shape {:?} with {mode} ({})",
            buffer.len(),
            destination.extents(),
            if input.is_borrowed() { "borrowed" } else { "staged" },
        );

        // SAFETY: the view is aligned, `input.capacity()` bytes long and only read.
        let mut stream = unsafe { StreamGuard::open(&self.codec, input.storage(), input.capacity())? };
        let consumed = self
            .codec
            .decompress(&mut field, &mut stream, &config)
            .map_err(|e| translate(e, buffer.len()))?;
        drop(stream);
        drop(field);

        if consumed > buffer.len() {
            return Err(ZfpError::TruncatedInput {
                available: buffer.len(),
                consumed,
            });
        }
        if !contiguous {
            let packed = &bytemuck::cast_slice(&staging)[..byte_len];
            // SAFETY: the descriptor was resolved from a live `ArrayLikeMut`
            unsafe {
                scatter(
                    packed,
                    destination.data_ptr_mut(),
                    destination.extents(),
                    destination.byte_strides(),
                    kind.width(),
                );
            }
        }
        log::debug!("decompressed {consumed} bytes");
        Ok(())
    }

    fn lookup(&self, descriptor: &ArrayDescriptor<'_>) -> ZfpResult<FieldConstructor<C>> {
        let (kind, rank) = (descriptor.kind(), descriptor.rank());
        field_constructor::<C>(kind, rank).ok_or(ZfpError::InternalDispatchError { kind, rank })
    }

    fn stream_config(&self, mode: &Mode, descriptor: &ArrayDescriptor<'_>) -> StreamConfig {
        StreamConfig {
            mode: *mode,
            kind: descriptor.kind(),
            rate_dims: self.settings.rate_blocks.dims(descriptor.rank()),
            align_rate: self.settings.align_rate,
        }
    }
}

/// Packs a strided array into contiguous, word-aligned storage.
fn gather_words(descriptor: &ArrayDescriptor<'_>) -> Vec<u64> {
    let mut words = vec![0; word_len(descriptor.byte_len())];
    let packed = &mut bytemuck::cast_slice_mut(&mut words)[..descriptor.byte_len()];
    // SAFETY: the descriptor was resolved from a live `ArrayLike`
    unsafe {
        gather(
            descriptor.data_ptr(),
            descriptor.extents(),
            descriptor.byte_strides(),
            descriptor.kind().width(),
            packed,
        );
    }
    words
}

/// Maps a backend failure onto the public error. `bytes` is the bitstream
/// capacity when compressing and the input length when decompressing.
fn translate(error: NativeError, bytes: usize) -> ZfpError {
    match error {
        NativeError::Code(code) => ZfpError::CodecError { code },
        NativeError::Truncated => ZfpError::TruncatedInput {
            available: bytes,
            consumed: bytes + 1,
        },
        NativeError::Inconsistent => ZfpError::ModeMismatch,
        NativeError::Overflow => ZfpError::BufferTooSmall {
            capacity: bytes,
            required: bytes + 1,
        },
    }
}

/// Closes the wrapped field when dropped.
struct FieldGuard<'c, C: NativeCodec> {
    codec: &'c C,
    field: ManuallyDrop<C::Field>,
}

impl<'c, C: NativeCodec> FieldGuard<'c, C> {
    /// # Safety
    ///
    /// `data` must satisfy the field contract of [`NativeCodec`] for
    /// `extents` until the guard is dropped.
    unsafe fn open(
        codec: &'c C,
        open: FieldConstructor<C>,
        data: NonNull<u8>,
        extents: &[usize],
    ) -> ZfpResult<Self> {
        let field = unsafe { open(codec, data, extents) }.map_err(|e| translate(e, 0))?;
        log::trace!("opened field {extents:?}");
        Ok(Self {
            codec,
            field: ManuallyDrop::new(field),
        })
    }
}

impl<C: NativeCodec> Deref for FieldGuard<'_, C> {
    type Target = C::Field;

    fn deref(&self) -> &C::Field {
        &self.field
    }
}

impl<C: NativeCodec> DerefMut for FieldGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C::Field {
        &mut self.field
    }
}

impl<C: NativeCodec> Drop for FieldGuard<'_, C> {
    fn drop(&mut self) {
        // SAFETY: taken once, here, and never touched again
        let field = unsafe { ManuallyDrop::take(&mut self.field) };
        self.codec.close_field(field);
        log::trace!("closed field");
    }
}

/// Closes the wrapped bitstream when dropped.
struct StreamGuard<'c, C: NativeCodec> {
    codec: &'c C,
    stream: ManuallyDrop<C::Stream>,
}

impl<'c, C: NativeCodec> StreamGuard<'c, C> {
    /// # Safety
    ///
    /// Same contract as [`NativeCodec::open_bitstream`], until the guard is dropped.
    unsafe fn open(codec: &'c C, buffer: NonNull<u8>, capacity: usize) -> ZfpResult<Self> {
        let stream =
            unsafe { codec.open_bitstream(buffer, capacity) }.map_err(|e| translate(e, capacity))?;
        log::trace!("opened bitstream over {capacity} bytes");
        Ok(Self {
            codec,
            stream: ManuallyDrop::new(stream),
        })
    }
}

impl<C: NativeCodec> Deref for StreamGuard<'_, C> {
    type Target = C::Stream;

    fn deref(&self) -> &C::Stream {
        &self.stream
    }
}

impl<C: NativeCodec> DerefMut for StreamGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C::Stream {
        &mut self.stream
    }
}

impl<C: NativeCodec> Drop for StreamGuard<'_, C> {
    fn drop(&mut self) {
        // SAFETY: taken once, here, and never touched again
        let stream = unsafe { ManuallyDrop::take(&mut self.stream) };
        self.codec.close_bitstream(stream);
        log::trace!("closed bitstream");
    }
}
