/// Bytes reserved on top of the data bound for stream headers and the final word flush.
pub const HEADER_BYTES: usize = 32;

/// What to do with arrays that are not row-major contiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// Reject with [`ZfpError::NonContiguous`](crate::ZfpError::NonContiguous)
    #[default]
    Strict,
    /// Copy through a contiguous staging buffer
    Gather,
}

/// How a fixed rate is turned into bits per block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateBlocks {
    /// Every field is treated as 1-D: a block gets `4 * rate` bits whatever its rank.
    #[default]
    Linear,
    /// A rank `d` block of `4^d` values gets `4^d * rate` bits.
    Field,
}

impl RateBlocks {
    /// Dimensionality handed to the codec for a field of `rank` axes.
    #[must_use]
    pub fn dims(self, rank: usize) -> u32 {
        match self {
            Self::Linear => 1,
            Self::Field => rank as u32,
        }
    }
}

/// Per-dispatcher configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub layout: LayoutPolicy,
    pub rate_blocks: RateBlocks,
    /// Round fixed-rate blocks up to whole 64-bit words
    pub align_rate: bool,
    /// Margin added to the computed output bound
    pub header_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout: LayoutPolicy::Strict,
            rate_blocks: RateBlocks::Linear,
            align_rate: false,
            header_bytes: HEADER_BYTES,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutPolicy) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_rate_blocks(mut self, rate_blocks: RateBlocks) -> Self {
        self.rate_blocks = rate_blocks;
        self
    }

    #[must_use]
    pub fn with_align_rate(mut self, align_rate: bool) -> Self {
        self.align_rate = align_rate;
        self
    }

    #[must_use]
    pub fn with_header_bytes(mut self, header_bytes: usize) -> Self {
        self.header_bytes = header_bytes;
        self
    }
}
