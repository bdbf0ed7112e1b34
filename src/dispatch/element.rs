use std::fmt;

use crate::dispatch::{ZfpError, ZfpResult};

/// Element type of a host array.
///
/// Wider than [`ElementKind`]: a host may hold any of these, only four of
/// them can be compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
}

impl DType {
    /// Size of one element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 | Self::F16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bool => "bool",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::F16 => "float16",
            Self::F32 => "float32",
            Self::F64 => "float64",
        })
    }
}

/// The element kinds the codec accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Float32,
    Float64,
    Int32,
    Int64,
}

impl ElementKind {
    /// All kinds, in dispatch-table order.
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Float32,
        ElementKind::Float64,
        ElementKind::Int32,
        ElementKind::Int64,
    ];

    /// Size of one element in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
            Self::Float64 | Self::Int64 => 8,
        }
    }

    /// Size of one element in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.width() as u32 * 8
    }

    /// Largest fixed precision, i.e. the width of the codec's block mantissa.
    #[must_use]
    pub const fn max_precision(self) -> u32 {
        self.bits()
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// The host [`DType`] with the same representation.
    #[must_use]
    pub const fn dtype(self) -> DType {
        match self {
            Self::Float32 => DType::F32,
            Self::Float64 => DType::F64,
            Self::Int32 => DType::I32,
            Self::Int64 => DType::I64,
        }
    }
}

impl TryFrom<DType> for ElementKind {
    type Error = ZfpError;

    fn try_from(dtype: DType) -> ZfpResult<Self> {
        match dtype {
            DType::F32 => Ok(Self::Float32),
            DType::F64 => Ok(Self::Float64),
            DType::I32 => Ok(Self::Int32),
            DType::I64 => Ok(Self::Int64),
            other => Err(ZfpError::UnsupportedType(other)),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.dtype(), f)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Rust types that can back a host array.
pub trait HostElement: sealed::Sealed + Copy + 'static {
    /// Runtime tag for this type.
    const DTYPE: DType;
}

/// Host element types the codec accepts.
pub trait Element: HostElement + bytemuck::Pod {
    /// Codec element kind for this type.
    const KIND: ElementKind;
}

macro_rules! host_elements {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl HostElement for $ty {
                const DTYPE: DType = DType::$dtype;
            }
        )*
    };
}

host_elements! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

#[cfg(feature = "ndarray")]
host_elements! {
    half::f16 => F16,
}

impl Element for f32 {
    const KIND: ElementKind = ElementKind::Float32;
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Float64;
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Int32;
}

impl Element for i64 {
    const KIND: ElementKind = ElementKind::Int64;
}
