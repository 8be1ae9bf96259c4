//! The binary container codec: header, window table, speaker table, and
//! per-window text buffers.

pub mod header;
pub mod raw;
pub mod reader;
pub mod writer;

use thiserror::Error;

use crate::codec::CodecError;
use crate::model::IdentifierError;

/// An error occurred while reading or writing the binary container.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinaryError {
    /// The header's magic matched neither the forward nor the reversed
    /// form.
    #[error("header magic matches neither known form")]
    InvalidHeaderMagic,
    /// Fewer bytes were available than the fixed header size.
    #[error("stream is smaller than the fixed header size")]
    StreamTooSmall,
    /// A window-header entry's `window_type` was not `0` or `1`.
    #[error("unknown window type {0}")]
    UnknownWindowType(i32),
    /// Writing an identifier longer than the fixed on-disk field allows.
    #[error(transparent)]
    IdentifierTooLong(#[from] IdentifierError),
    /// A line buffer failed to decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
