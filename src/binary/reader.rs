//! Parses a container byte stream into a [`RawScript`].
//!
//! Reading proceeds in the order the container is laid out: fixed header,
//! window-header array, per-window bodies, speaker table header, speaker
//! name array, and finally the opaque relocation table.

use crate::binary::header::{
    read_i16_at, read_i32_at, read_u16, Header, HEADER_SIZE,
};
use crate::binary::raw::{
    RawDialogueWindow, RawScript, RawSelectionWindow, RawSpeakerTableHeader, RawWindow,
    RawWindowHeader,
};
use crate::binary::BinaryError;
use crate::diagnostics::DiagnosticSink;
use crate::model::{FormatVersion, IDENTIFIER_MAX_LEN};

type Result<T> = core::result::Result<T, BinaryError>;

/// Window-header array entries are 8 bytes: `window_type: i32`,
/// `window_offset: i32`.
const WINDOW_HEADER_ENTRY_SIZE: usize = 8;

/// Reads a complete [`RawScript`] from `data`, logging a [`DiagnosticSink::trace`]
/// note through `sink` for every non-zero opaque field encountered.
///
/// # Errors
///
/// Returns [`BinaryError::StreamTooSmall`] or [`BinaryError::InvalidHeaderMagic`]
/// from the header parse, or [`BinaryError::UnknownWindowType`] if a
/// window-header entry names a type other than `0` (dialogue) or `1`
/// (selection).
pub fn read_script(data: &[u8], sink: &mut dyn DiagnosticSink) -> Result<RawScript> {
    let (header, version) = Header::parse(data)?;
    let base = HEADER_SIZE;

    let window_count = usize::try_from(header.window_count).unwrap_or(0);
    let mut windows = Vec::with_capacity(window_count);
    let mut window_table_end = base;
    for index in 0..window_count {
        let entry_offset = base + index * WINDOW_HEADER_ENTRY_SIZE;
        let entry = read_window_header(data, entry_offset, version);
        window_table_end = entry_offset + WINDOW_HEADER_ENTRY_SIZE;
        if entry.window_offset == 0 {
            windows.push(None);
            continue;
        }
        let body_offset = base + usize::try_from(entry.window_offset).unwrap_or(0);
        let window = match entry.window_type {
            0 => RawWindow::Dialogue(read_dialogue_window(data, body_offset, version)?),
            1 => RawWindow::Selection(read_selection_window(data, body_offset, version)?),
            other => return Err(BinaryError::UnknownWindowType(other)),
        };
        windows.push(Some(window));
    }

    let speaker_table_header = read_speaker_table_header(data, window_table_end, version);
    if speaker_table_header.field_08 != 0 {
        sink.trace(&format!(
            "speaker table field_08 is non-zero ({}), preserved verbatim",
            speaker_table_header.field_08
        ));
    }
    if speaker_table_header.field_0c != 0 {
        sink.trace(&format!(
            "speaker table field_0c is non-zero ({}), preserved verbatim",
            speaker_table_header.field_0c
        ));
    }
    let speaker_names = read_speaker_names(data, base, &speaker_table_header, version);

    let relocation_table = if header.relocation_table_offset != 0 {
        let offset = base + usize::try_from(header.relocation_table_offset).unwrap_or(0);
        let size = usize::try_from(header.relocation_table_size).unwrap_or(0);
        Some(data[offset..offset + size].to_vec())
    } else {
        None
    };

    Ok(RawScript {
        header,
        windows,
        speaker_table_header,
        speaker_names,
        relocation_table,
    })
}

fn read_window_header(data: &[u8], offset: usize, version: FormatVersion) -> RawWindowHeader {
    RawWindowHeader {
        window_type: read_i32_at(data, offset, version),
        window_offset: read_i32_at(data, offset + 4, version),
    }
}

fn read_identifier(data: &[u8], offset: usize) -> [u8; IDENTIFIER_MAX_LEN] {
    let mut id = [0u8; IDENTIFIER_MAX_LEN];
    id.copy_from_slice(&data[offset..offset + IDENTIFIER_MAX_LEN]);
    id
}

fn read_dialogue_window(
    data: &[u8],
    offset: usize,
    version: FormatVersion,
) -> Result<RawDialogueWindow> {
    let identifier = read_identifier(data, offset);
    let mut cursor = offset + IDENTIFIER_MAX_LEN;
    let line_count = read_i16_at(data, cursor, version);
    cursor += 2;
    let speaker_id = read_u16(data, cursor, version);
    cursor += 2;

    let count = usize::try_from(line_count).unwrap_or(0);
    let mut line_start_offsets = Vec::with_capacity(count);
    for _ in 0..count {
        line_start_offsets.push(read_i32_at(data, cursor, version));
        cursor += 4;
    }
    let text_buffer_size = read_i32_at(data, cursor, version);
    cursor += 4;
    let size = usize::try_from(text_buffer_size).unwrap_or(0);
    let text_buffer = data[cursor..cursor + size].to_vec();

    Ok(RawDialogueWindow {
        identifier,
        line_count,
        speaker_id,
        line_start_offsets,
        text_buffer,
    })
}

fn read_selection_window(
    data: &[u8],
    offset: usize,
    version: FormatVersion,
) -> Result<RawSelectionWindow> {
    let identifier = read_identifier(data, offset);
    let mut cursor = offset + IDENTIFIER_MAX_LEN;
    let field_18 = read_i16_at(data, cursor, version);
    cursor += 2;
    let option_count = read_i16_at(data, cursor, version);
    cursor += 2;
    let field_1c = read_i16_at(data, cursor, version);
    cursor += 2;
    let field_1e = read_i16_at(data, cursor, version);
    cursor += 2;

    let count = usize::try_from(option_count).unwrap_or(0);
    let mut option_start_offsets = Vec::with_capacity(count);
    for _ in 0..count {
        option_start_offsets.push(read_i32_at(data, cursor, version));
        cursor += 4;
    }
    let text_buffer_size = read_i32_at(data, cursor, version);
    cursor += 4;
    let size = usize::try_from(text_buffer_size).unwrap_or(0);
    let text_buffer = data[cursor..cursor + size].to_vec();

    Ok(RawSelectionWindow {
        identifier,
        field_18,
        option_count,
        field_1c,
        field_1e,
        option_start_offsets,
        text_buffer,
    })
}

fn read_speaker_table_header(
    data: &[u8],
    offset: usize,
    version: FormatVersion,
) -> RawSpeakerTableHeader {
    RawSpeakerTableHeader {
        speaker_name_array_offset: read_i32_at(data, offset, version),
        speaker_count: read_i32_at(data, offset + 4, version),
        field_08: read_i32_at(data, offset + 8, version),
        field_0c: read_i32_at(data, offset + 12, version),
    }
}

fn read_speaker_names(
    data: &[u8],
    base: usize,
    table_header: &RawSpeakerTableHeader,
    version: FormatVersion,
) -> Vec<Option<Vec<u8>>> {
    let count = usize::try_from(table_header.speaker_count).unwrap_or(0);
    let array_offset = base + usize::try_from(table_header.speaker_name_array_offset).unwrap_or(0);
    let mut names = Vec::with_capacity(count);
    for index in 0..count {
        let entry_offset = array_offset + index * 4;
        let name_offset = read_i32_at(data, entry_offset, version);
        if name_offset == 0 {
            names.push(None);
            continue;
        }
        let start = base + usize::try_from(name_offset).unwrap_or(0);
        let end = data[start..]
            .iter()
            .position(|&b| b == 0)
            .map_or(data.len(), |pos| start + pos + 1);
        names.push(Some(data[start..end].to_vec()));
    }
    names
}
