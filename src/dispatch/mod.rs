mod buffer;
mod descriptor;
mod dispatcher;
mod element;
mod error;
mod helpers;
mod host;
mod layout;
mod mode;
mod settings;
mod table;

pub use buffer::CompressedBuffer;
pub use descriptor::{
    resolve, resolve_mut, resolve_mut_with, resolve_with, ArrayDescriptor, DestinationDescriptor,
    MAX_RANK,
};
pub use dispatcher::Dispatcher;
pub use element::{DType, Element, ElementKind, HostElement};
pub use error::{ModeParameterError, ZfpError, ZfpResult};
pub use helpers::{padded_element_count, size_bound, BLOCK_EDGE};
pub use host::{ArrayLike, ArrayLikeMut, RawArray, RawArrayMut};
pub use mode::{CompressionMode, Mode, ModeParameters};
pub use settings::{LayoutPolicy, RateBlocks, Settings, HEADER_BYTES};
