use std::fmt;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::dispatch::helpers::{word_len, WORD_BYTES};

/// Owned compressed bytes.
///
/// Backed by 64-bit words so the codec can write whole words; the visible
/// length is the number of bytes the codec reported, not the capacity that
/// was allocated for it.
#[derive(Clone, PartialEq, Eq)]
pub struct CompressedBuffer {
    words: Vec<u64>,
    len: usize,
}

impl CompressedBuffer {
    /// Zeroed buffer able to hold at least `capacity` bytes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; word_len(capacity)],
            len: 0,
        }
    }

    /// Allocated size in bytes, a whole number of words.
    pub(crate) fn capacity(&self) -> usize {
        self.words.len() * WORD_BYTES
    }

    /// Start of the word storage, for handing to the codec.
    pub(crate) fn storage(&mut self) -> NonNull<u8> {
        NonNull::from(&mut self.words[..]).cast()
    }

    /// Keeps the first `len` bytes and releases the unused words.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.len = len.min(self.capacity());
        self.words.truncate(word_len(self.len));
        self.words.shrink_to_fit();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }

    /// Copies the bytes into a plain `Vec<u8>`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Deref for CompressedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for CompressedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<CompressedBuffer> for Vec<u8> {
    fn from(buffer: CompressedBuffer) -> Self {
        buffer.to_vec()
    }
}

impl fmt::Debug for CompressedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedBuffer")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Read-only bitstream source for decompression.
///
/// Borrows the caller's bytes when they are word aligned and at least
/// `required` long; otherwise copies them into zero-padded words so the
/// codec can read `required` bytes without leaving owned memory.
pub(crate) enum InputView<'a> {
    Borrowed(&'a [u64]),
    Staged(Vec<u64>),
}

impl<'a> InputView<'a> {
    pub(crate) fn new(bytes: &'a [u8], required: usize) -> Self {
        if bytes.len() >= required {
            if let Ok(words) = bytemuck::try_cast_slice::<u8, u64>(bytes) {
                return Self::Borrowed(words);
            }
        }
        let mut words = vec![0u64; word_len(bytes.len().max(required))];
        bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..bytes.len()].copy_from_slice(bytes);
        Self::Staged(words)
    }

    pub(crate) fn is_borrowed(&self) -> bool {
        matches!(self, Self::Borrowed(_))
    }

    fn words(&self) -> &[u64] {
        match self {
            Self::Borrowed(words) => words,
            Self::Staged(words) => words,
        }
    }

    /// Readable size in bytes.
    pub(crate) fn capacity(&self) -> usize {
        self.words().len() * WORD_BYTES
    }

    /// Start of the words. The codec only reads through this pointer.
    pub(crate) fn storage(&self) -> NonNull<u8> {
        NonNull::from(self.words()).cast()
    }
}
