use zfparray::{ElementKind, Mode};

#[derive(arbitrary::Arbitrary, Clone, Copy, PartialEq, Eq, Debug)]
pub enum FuzzKind {
    Float32,
    Float64,
    Int32,
    Int64,
}

impl From<FuzzKind> for ElementKind {
    fn from(kind: FuzzKind) -> Self {
        match kind {
            FuzzKind::Float32 => ElementKind::Float32,
            FuzzKind::Float64 => ElementKind::Float64,
            FuzzKind::Int32 => ElementKind::Int32,
            FuzzKind::Int64 => ElementKind::Int64,
        }
    }
}

#[derive(arbitrary::Arbitrary, Clone, Copy, Debug)]
pub struct FuzzMode {
    pub selector: u8,
    pub rate: f64,
    pub precision: u32,
    pub tolerance: f64,
}

impl FuzzMode {
    pub fn mode(self) -> Mode {
        match self.selector % 4 {
            0 => Mode::FixedRate { rate: self.rate },
            1 => Mode::FixedPrecision {
                precision: self.precision,
            },
            2 => Mode::FixedAccuracy {
                tolerance: self.tolerance,
            },
            _ => Mode::Reversible,
        }
    }
}

/// Clamps arbitrary extents to a small array of rank 1 to 4.
pub fn shape(extents: &[u8]) -> Vec<usize> {
    let rank = extents.len().clamp(1, 4);
    (0..rank)
        .map(|axis| usize::from(extents.get(axis).copied().unwrap_or(1) % 17) + 1)
        .collect()
}
