//! The raw binary model: a literal, unvalidated mirror of the container's
//! on-disk layout, as produced by [`crate::binary::reader`] and consumed by
//! [`crate::binary::writer`]. [`crate::lift`] turns this into the
//! higher-level [`crate::model`] tree; [`crate::lower`] does the inverse.

use crate::binary::header::Header;
use crate::model::IDENTIFIER_MAX_LEN;

/// One entry of the window-header array: which kind of window it is, and
/// where its body lives relative to the end of the fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawWindowHeader {
    /// `0` for [`RawWindow::Dialogue`], `1` for [`RawWindow::Selection`].
    pub window_type: i32,
    /// Byte offset of the window body, relative to `base + `[`Header`]
    /// size. `0` means the entry is skipped (no window body).
    pub window_offset: i32,
}

/// The raw (unvalidated) body of a dialogue window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDialogueWindow {
    /// Fixed-size, NUL-padded ASCII identifier.
    pub identifier: [u8; IDENTIFIER_MAX_LEN],
    /// Number of lines; equals `line_start_offsets.len()`.
    pub line_count: i16,
    /// Treated as unsigned; values `>= speaker_count` denote a
    /// variable-index speaker rather than a named one.
    pub speaker_id: u16,
    /// Absolute offsets (within the containing chunk) of each line's start.
    /// Empty when the window has no lines.
    pub line_start_offsets: Vec<i32>,
    /// The concatenated, NUL-terminated per-line byte buffers.
    pub text_buffer: Vec<u8>,
}

/// The raw (unvalidated) body of a selection window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSelectionWindow {
    /// Fixed-size, NUL-padded ASCII identifier.
    pub identifier: [u8; IDENTIFIER_MAX_LEN],
    /// Opaque field, preserved verbatim.
    pub field_18: i16,
    /// Number of options; equals `option_start_offsets.len()`.
    pub option_count: i16,
    /// Opaque field, preserved verbatim.
    pub field_1c: i16,
    /// Opaque field, preserved verbatim.
    pub field_1e: i16,
    /// Absolute offsets (within the containing chunk) of each option's
    /// start.
    pub option_start_offsets: Vec<i32>,
    /// The concatenated, NUL-terminated per-option byte buffers.
    pub text_buffer: Vec<u8>,
}

/// One window body, tagged by its [`RawWindowHeader::window_type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawWindow {
    /// A dialogue window body.
    Dialogue(RawDialogueWindow),
    /// A selection window body.
    Selection(RawSelectionWindow),
}

/// The speaker table header, immediately following the window-header array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSpeakerTableHeader {
    /// Offset (from `base + `[`Header`] size) of the `speaker_count`-entry
    /// array of absolute name offsets.
    pub speaker_name_array_offset: i32,
    /// Number of speaker name entries.
    pub speaker_count: i32,
    /// Opaque field, preserved verbatim.
    pub field_08: i32,
    /// Opaque field, preserved verbatim.
    pub field_0c: i32,
}

/// The complete raw binary model of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScript {
    /// The fixed header.
    pub header: Header,
    /// One slot per window-header entry. `None` marks an entry whose
    /// `window_offset` was `0` (skipped).
    pub windows: Vec<Option<RawWindow>>,
    /// The speaker table header.
    pub speaker_table_header: RawSpeakerTableHeader,
    /// One slot per speaker name entry. `None` marks a null name offset;
    /// `Some` holds the NUL-terminated name bytes, NUL included.
    pub speaker_names: Vec<Option<Vec<u8>>>,
    /// The relocation table's raw bytes, treated opaquely. `None` if the
    /// header's `relocation_table_offset` was `0`.
    pub relocation_table: Option<Vec<u8>>,
}
