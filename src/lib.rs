//! A binary codec and surface-syntax toolkit for embedded game dialogue
//! scripts: a bit-packed token stream, a fixed-layout container format, and
//! a bidirectional mapping to a tag-annotated text syntax.
//!
//! ```text
//! bytes ⇄ binary::reader/writer ⇄ binary::raw::RawScript ⇄ lift/lower ⇄ model::Script ⇄ surface::compiler/decompiler ⇄ text
//! ```
//!
//! [`decode_script`] and [`encode_script`] cover the left half of that
//! pipeline; [`compile`] and [`decompile`] cover the right half.

pub mod binary;
pub mod codec;
pub mod diagnostics;
pub mod error;
pub mod library;
pub mod lift;
pub mod lower;
pub mod model;
pub mod surface;

pub use diagnostics::init_logging;
pub use error::{MsgScriptError, Result};
pub use model::Script;
pub use surface::compiler::compile;
pub use surface::decompiler::decompile_script as decompile;

/// Parses a complete container byte stream into a [`Script`], tracing
/// non-zero opaque fields through the default [`diagnostics::TracingSink`].
///
/// Equivalent to running [`binary::reader::read_script`] followed by
/// [`lift::lift_script`]. Callers that want a different [`diagnostics::DiagnosticSink`]
/// should call those two functions directly.
///
/// # Errors
///
/// Returns an error if the header is malformed, a window-header entry
/// names an unknown window type, or a line buffer fails to decode.
pub fn decode_script(data: &[u8]) -> Result<Script> {
    let mut sink = diagnostics::TracingSink;
    let raw = binary::reader::read_script(data, &mut sink)?;
    let script = lift::lift_script(&raw, &mut sink)?;
    Ok(script)
}

/// Serializes a [`Script`] into a complete container byte stream, using the
/// endianness of `script.format_version`.
///
/// Equivalent to running [`lower::lower_script`] followed by
/// [`binary::writer::write_script`].
///
/// # Errors
///
/// Returns an error if a window's identifier exceeds
/// [`model::IDENTIFIER_MAX_LEN`] bytes.
pub fn encode_script(script: &Script, options: codec::CodecOptions) -> Result<Vec<u8>> {
    let raw = lower::lower_script(script, options)?;
    Ok(binary::writer::write_script(&raw, script.format_version))
}
