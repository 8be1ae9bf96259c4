//! The mutable in-memory representation of a MessageScript.
//!
//! Ownership is strictly tree-shaped: a [`Script`] owns its [`Window`]s; each
//! `Window` owns its [`Line`]s and (for [`Window::Dialogue`]) its [`Speaker`];
//! each `Line` owns its [`Token`]s. There are no cycles, so the whole tree can
//! be freely cloned, compared, and mutated by callers between a decode and a
//! re-encode.

/// The maximum length, in bytes, of a stored identifier.
pub const IDENTIFIER_MAX_LEN: usize = 24;

/// The on-disk format version, determined by the container's magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormatVersion {
    /// `MSG1`/`MSG0`: version 1, little-endian multi-byte fields.
    V1LittleEndian,
    /// `1GSM`: version 1, big-endian multi-byte fields.
    V1BigEndian,
}

impl FormatVersion {
    /// Returns whether multi-byte fields of this version are little-endian.
    #[must_use]
    pub const fn is_little_endian(self) -> bool {
        matches!(self, Self::V1LittleEndian)
    }
}

/// A complete MessageScript document: an ordered list of [`Window`]s plus the
/// opaque metadata carried in the container header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Script {
    /// 16-bit signed metadata from the header; meaning is game-specific.
    pub user_id: i16,
    /// The format version the script was read as (or will be written as).
    pub format_version: FormatVersion,
    /// The ordered windows of this script. Windows are addressed by
    /// position; identifiers are not required to be globally unique.
    pub windows: Vec<Window>,
}

impl Script {
    /// Creates an empty script with the given format version.
    #[must_use]
    pub const fn new(format_version: FormatVersion) -> Self {
        Self {
            user_id: 0,
            format_version,
            windows: Vec::new(),
        }
    }
}

/// A dialogue or selection window, the top-level item of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Window {
    /// A conversation window: an optional speaker plus an ordered list of
    /// lines shown one after another.
    Dialogue(DialogueWindow),
    /// A choice window: each line is one selectable option.
    Selection(SelectionWindow),
}

impl Window {
    /// Returns the window's identifier, regardless of variant.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Dialogue(w) => &w.identifier,
            Self::Selection(w) => &w.identifier,
        }
    }

    /// Returns the window's lines, regardless of variant.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        match self {
            Self::Dialogue(w) => &w.lines,
            Self::Selection(w) => &w.lines,
        }
    }
}

/// A conversation window.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DialogueWindow {
    /// ASCII identifier, at most [`IDENTIFIER_MAX_LEN`] bytes.
    pub identifier: String,
    /// Who is speaking, if anyone is named.
    pub speaker: Option<Speaker>,
    /// The dialogue lines, shown in order.
    pub lines: Vec<Line>,
}

/// A choice window.
///
/// The raw layout carries four 16-bit fields (`field_18`, `option_count`,
/// `field_1c`, `field_1e`) alongside the identifier; of those, `option_count`
/// is structurally meaningful (it is the length of `lines`) and so is
/// derived from `lines.len()` rather than stored redundantly here. The
/// remaining three are genuinely opaque and are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionWindow {
    /// ASCII identifier, at most [`IDENTIFIER_MAX_LEN`] bytes.
    pub identifier: String,
    /// The choice lines, shown in order.
    pub lines: Vec<Line>,
    /// Opaque 16-bit field from the raw layout, preserved verbatim.
    pub field_18: i16,
    /// Opaque 16-bit field from the raw layout, preserved verbatim.
    pub field_1c: i16,
    /// Opaque 16-bit field from the raw layout, preserved verbatim.
    pub field_1e: i16,
}

/// Who is speaking in a [`DialogueWindow`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Speaker {
    /// The speaker's name, itself a line of tokens (so it may carry inline
    /// tags such as function calls).
    Named(Line),
    /// A run-time substitution index; the engine fills in the name later.
    VariableIndex(u16),
}

/// An ordered sequence of tokens, terminated implicitly by the container's
/// line-terminator sentinel when encoded to bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    /// The tokens that make up this line, in order.
    pub tokens: Vec<Token>,
}

impl Line {
    /// Creates an empty line.
    #[must_use]
    pub const fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Creates a line from an explicit token vector.
    #[must_use]
    pub const fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

impl FromIterator<Token> for Line {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

/// The smallest semantic unit within a [`Line`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Token {
    /// A run of character bytes in the game's text encoding.
    Text(Vec<u8>),
    /// A call to a bit-packed opcode.
    Function {
        /// Which function table the opcode belongs to (`0..=7`).
        table_index: u8,
        /// The opcode's index within its table (`0..=31`).
        function_index: u8,
        /// The opcode's arguments, read back as signed 16-bit words.
        args: Vec<i16>,
    },
    /// A within-line break; not a line terminator.
    NewLine,
    /// An explicit two-byte character escape.
    CodePoint {
        /// The high byte of the escaped character.
        high: u8,
        /// The low byte of the escaped character.
        low: u8,
    },
}

impl Token {
    /// Shorthand for constructing a [`Token::Function`].
    #[must_use]
    pub const fn function(table_index: u8, function_index: u8, args: Vec<i16>) -> Self {
        Self::Function {
            table_index,
            function_index,
            args,
        }
    }

    /// Shorthand for constructing a [`Token::Text`] from a `&str`.
    #[must_use]
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Text(s.as_ref().as_bytes().to_vec())
    }
}

/// Truncates (and validates) an identifier for storage in the fixed-size
/// on-disk field. Returns the ASCII bytes, NUL-padded to
/// [`IDENTIFIER_MAX_LEN`], or an error if the identifier is too long.
pub(crate) fn pack_identifier(identifier: &str) -> Result<[u8; IDENTIFIER_MAX_LEN], IdentifierError> {
    let bytes = identifier.as_bytes();
    if bytes.len() > IDENTIFIER_MAX_LEN {
        return Err(IdentifierError::TooLong {
            identifier: identifier.to_owned(),
            max: IDENTIFIER_MAX_LEN,
        });
    }
    let mut out = [0u8; IDENTIFIER_MAX_LEN];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Reads a NUL-padded fixed-size identifier field back into a `String`,
/// trimming the trailing NUL padding.
#[must_use]
pub(crate) fn unpack_identifier(raw: &[u8; IDENTIFIER_MAX_LEN]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Writing an identifier whose byte length exceeds [`IDENTIFIER_MAX_LEN`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier `{identifier}` is longer than {max} bytes")]
pub struct IdentifierError {
    /// The offending identifier.
    pub identifier: String,
    /// The maximum allowed byte length.
    pub max: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_round_trip() {
        let packed = pack_identifier("greet").unwrap();
        assert_eq!(unpack_identifier(&packed), "greet");
    }

    #[test]
    fn identifier_clamp() {
        let too_long = "x".repeat(IDENTIFIER_MAX_LEN + 1);
        let err = pack_identifier(&too_long).unwrap_err();
        assert_eq!(err.max, IDENTIFIER_MAX_LEN);
    }

    #[test]
    fn identifier_exact_length_is_accepted() {
        let exact = "x".repeat(IDENTIFIER_MAX_LEN);
        let packed = pack_identifier(&exact).unwrap();
        assert_eq!(unpack_identifier(&packed), exact);
    }
}
