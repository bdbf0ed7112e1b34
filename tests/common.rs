#![allow(dead_code)]

use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};
use zfparray::{ElementKind, NativeCodec, NativeError, StreamConfig};

/// Stage of a call at which [`CountingCodec`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpenField,
    MaximumSize,
    OpenBitstream,
    Compress,
    Decompress,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::OpenField,
        Stage::MaximumSize,
        Stage::OpenBitstream,
        Stage::Compress,
        Stage::Decompress,
    ];
}

#[derive(Debug)]
pub struct MockField {
    data: NonNull<u8>,
    bytes: usize,
}

#[derive(Debug)]
pub struct MockStream {
    buffer: NonNull<u8>,
    capacity: usize,
}

/// Copying codec that counts every handle it opens and closes.
///
/// "Compression" stores the field bytes verbatim; the worst case it reports
/// is the raw size plus one word.
#[derive(Debug, Default)]
pub struct CountingCodec {
    fault: Option<(Stage, NativeError)>,
    over_report: Option<usize>,
    exact: bool,
    pub fields_opened: AtomicUsize,
    pub fields_closed: AtomicUsize,
    pub streams_opened: AtomicUsize,
    pub streams_closed: AtomicUsize,
    pub calls: AtomicUsize,
    pub last_capacity: AtomicUsize,
    /// Address of the last bitstream buffer
    pub last_buffer: AtomicUsize,
    pub last_extents: Mutex<Vec<usize>>,
}

impl CountingCodec {
    pub fn failing(stage: Stage, error: NativeError) -> Self {
        Self {
            fault: Some((stage, error)),
            ..Self::default()
        }
    }

    /// Reports `extra` bytes more than it actually wrote.
    pub fn over_reporting(extra: usize) -> Self {
        Self {
            over_report: Some(extra),
            ..Self::default()
        }
    }

    /// Reports the exact size of every stream, so aligned input is read in place.
    pub fn exact_sized() -> Self {
        Self {
            exact: true,
            ..Self::default()
        }
    }

    pub fn allocations(&self) -> usize {
        self.fields_opened.load(Ordering::SeqCst) + self.streams_opened.load(Ordering::SeqCst)
    }

    pub fn assert_balanced(&self) {
        assert_eq!(
            self.fields_opened.load(Ordering::SeqCst),
            self.fields_closed.load(Ordering::SeqCst),
            "field handles leaked"
        );
        assert_eq!(
            self.streams_opened.load(Ordering::SeqCst),
            self.streams_closed.load(Ordering::SeqCst),
            "bitstream handles leaked"
        );
    }

    fn check(&self, stage: Stage) -> Result<(), NativeError> {
        match self.fault {
            Some((failing, error)) if failing == stage => Err(error),
            _ => Ok(()),
        }
    }

    fn open(&self, data: NonNull<u8>, kind: ElementKind, extents: &[usize]) -> Result<MockField, NativeError> {
        self.check(Stage::OpenField)?;
        self.fields_opened.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_extents.lock() {
            *last = extents.to_vec();
        }
        Ok(MockField {
            data,
            bytes: extents.iter().product::<usize>() * kind.width(),
        })
    }
}

impl NativeCodec for CountingCodec {
    type Field = MockField;
    type Stream = MockStream;

    unsafe fn open_field_1d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
    ) -> Result<MockField, NativeError> {
        self.open(data, kind, &[nx])
    }

    unsafe fn open_field_2d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
    ) -> Result<MockField, NativeError> {
        self.open(data, kind, &[nx, ny])
    }

    unsafe fn open_field_3d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
        nz: usize,
    ) -> Result<MockField, NativeError> {
        self.open(data, kind, &[nx, ny, nz])
    }

    unsafe fn open_field_4d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
        nz: usize,
        nw: usize,
    ) -> Result<MockField, NativeError> {
        self.open(data, kind, &[nx, ny, nz, nw])
    }

    fn close_field(&self, _: MockField) {
        self.fields_closed.fetch_add(1, Ordering::SeqCst);
    }

    fn maximum_size(&self, field: &MockField, _: &StreamConfig) -> Result<usize, NativeError> {
        self.check(Stage::MaximumSize)?;
        Ok(field.bytes + 8)
    }

    fn exact_size(&self, field: &MockField, _: &StreamConfig) -> Result<Option<usize>, NativeError> {
        self.check(Stage::MaximumSize)?;
        Ok(self.exact.then_some(field.bytes))
    }

    unsafe fn open_bitstream(
        &self,
        buffer: NonNull<u8>,
        capacity: usize,
    ) -> Result<MockStream, NativeError> {
        self.check(Stage::OpenBitstream)?;
        self.streams_opened.fetch_add(1, Ordering::SeqCst);
        self.last_capacity.store(capacity, Ordering::SeqCst);
        self.last_buffer.store(buffer.as_ptr() as usize, Ordering::SeqCst);
        Ok(MockStream { buffer, capacity })
    }

    fn close_bitstream(&self, _: MockStream) {
        self.streams_closed.fetch_add(1, Ordering::SeqCst);
    }

    fn compress(
        &self,
        field: &MockField,
        stream: &mut MockStream,
        _: &StreamConfig,
    ) -> Result<usize, NativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check(Stage::Compress)?;
        if field.bytes > stream.capacity {
            return Err(NativeError::Overflow);
        }
        unsafe { ptr::copy_nonoverlapping(field.data.as_ptr(), stream.buffer.as_ptr(), field.bytes) };
        Ok(field.bytes + self.over_report.unwrap_or(0))
    }

    fn decompress(
        &self,
        field: &mut MockField,
        stream: &mut MockStream,
        _: &StreamConfig,
    ) -> Result<usize, NativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check(Stage::Decompress)?;
        let bytes = field.bytes.min(stream.capacity);
        unsafe { ptr::copy_nonoverlapping(stream.buffer.as_ptr(), field.data.as_ptr(), bytes) };
        Ok(field.bytes)
    }
}

/// Forwards to `inner`, remembering where the last bitstream was opened.
#[derive(Debug, Default)]
pub struct Recording<C> {
    pub inner: C,
    pub last_buffer: AtomicUsize,
    pub last_capacity: AtomicUsize,
}

impl<C> Recording<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last_buffer: AtomicUsize::new(0),
            last_capacity: AtomicUsize::new(0),
        }
    }

    /// Whether the last stream was opened directly over `bytes`.
    pub fn read_in_place(&self, bytes: &[u8]) -> bool {
        self.last_buffer.load(Ordering::SeqCst) == bytes.as_ptr() as usize
    }
}

impl<C: NativeCodec> NativeCodec for Recording<C> {
    type Field = C::Field;
    type Stream = C::Stream;

    unsafe fn open_field_1d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
    ) -> Result<C::Field, NativeError> {
        unsafe { self.inner.open_field_1d(data, kind, nx) }
    }

    unsafe fn open_field_2d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
    ) -> Result<C::Field, NativeError> {
        unsafe { self.inner.open_field_2d(data, kind, nx, ny) }
    }

    unsafe fn open_field_3d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
        nz: usize,
    ) -> Result<C::Field, NativeError> {
        unsafe { self.inner.open_field_3d(data, kind, nx, ny, nz) }
    }

    unsafe fn open_field_4d(
        &self,
        data: NonNull<u8>,
        kind: ElementKind,
        nx: usize,
        ny: usize,
        nz: usize,
        nw: usize,
    ) -> Result<C::Field, NativeError> {
        unsafe { self.inner.open_field_4d(data, kind, nx, ny, nz, nw) }
    }

    fn close_field(&self, field: C::Field) {
        self.inner.close_field(field);
    }

    fn maximum_size(&self, field: &C::Field, config: &StreamConfig) -> Result<usize, NativeError> {
        self.inner.maximum_size(field, config)
    }

    fn exact_size(
        &self,
        field: &C::Field,
        config: &StreamConfig,
    ) -> Result<Option<usize>, NativeError> {
        self.inner.exact_size(field, config)
    }

    unsafe fn open_bitstream(
        &self,
        buffer: NonNull<u8>,
        capacity: usize,
    ) -> Result<C::Stream, NativeError> {
        self.last_buffer.store(buffer.as_ptr() as usize, Ordering::SeqCst);
        self.last_capacity.store(capacity, Ordering::SeqCst);
        unsafe { self.inner.open_bitstream(buffer, capacity) }
    }

    fn close_bitstream(&self, stream: C::Stream) {
        self.inner.close_bitstream(stream);
    }

    fn compress(
        &self,
        field: &C::Field,
        stream: &mut C::Stream,
        config: &StreamConfig,
    ) -> Result<usize, NativeError> {
        self.inner.compress(field, stream, config)
    }

    fn decompress(
        &self,
        field: &mut C::Field,
        stream: &mut C::Stream,
        config: &StreamConfig,
    ) -> Result<usize, NativeError> {
        self.inner.decompress(field, stream, config)
    }
}

/// Routes the dispatcher's `log` output to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `n` values drawn uniformly from `[-1000, 1000)`.
pub fn random_f64(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(-1000.0..1000.0)).collect()
}

pub fn random_f32(n: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(-1000.0f32..1000.0)).collect()
}

/// `n` values over the whole `i32` range.
pub fn random_i32(n: usize, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random::<i32>()).collect()
}

pub fn random_i64(n: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random::<i64>()).collect()
}

/// Alternates `MAX - i` and `MIN + i`, the largest steps an integer block can hold.
pub fn extreme_i32(n: usize) -> Vec<i32> {
    (0..n as i32)
        .map(|i| if i % 2 == 0 { i32::MAX - i } else { i32::MIN + i })
        .collect()
}

pub fn extreme_i64(n: usize) -> Vec<i64> {
    (0..n as i64)
        .map(|i| if i % 2 == 0 { i64::MAX - i } else { i64::MIN + i })
        .collect()
}

/// Largest, smallest normal, subnormal, signed zero and infinite values, repeated.
pub fn special_f64(n: usize) -> Vec<f64> {
    let values = [
        f64::MAX,
        f64::MIN_POSITIVE,
        f64::from_bits(1),
        -0.0,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::MIN,
        1.0,
    ];
    values.into_iter().cycle().take(n).collect()
}

pub fn special_f32(n: usize) -> Vec<f32> {
    let values = [
        f32::MAX,
        f32::MIN_POSITIVE,
        f32::from_bits(1),
        -0.0,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::MIN,
        1.0,
    ];
    values.into_iter().cycle().take(n).collect()
}

/// A smooth field: a sum of sines over the linear index.
pub fn smooth_f64(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = i as f64 / 64.0;
            x.sin() * 100.0 + (x * 0.3).cos() * 10.0
        })
        .collect()
}

/// Shapes of rank 1 to 4, as small and awkward as block padding allows.
pub fn test_shapes() -> Vec<Vec<usize>> {
    vec![
        vec![1],
        vec![13],
        vec![1, 1],
        vec![5, 7],
        vec![3, 4, 5],
        vec![2, 3, 1, 6],
        vec![4, 4, 4, 4],
    ]
}
