//! Top-level error aggregation.

use thiserror::Error;

use crate::binary::BinaryError;
use crate::codec::CodecError;
use crate::surface::compiler::CompileError;

/// An error occurred somewhere in the MessageScript toolkit.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MsgScriptError {
    /// An error comes from the binary container reader/writer.
    #[error("binary error: {0}")]
    Binary(#[from] BinaryError),
    /// An error comes from the token codec.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    /// An error comes from the surface-syntax compiler.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

/// A custom result type for this crate.
pub type Result<T> = core::result::Result<T, MsgScriptError>;
