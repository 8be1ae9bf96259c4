//! Serializes a [`RawScript`] back into container bytes.
//!
//! Writing is two-pass: first every window body and the speaker name table
//! are laid out and their sizes measured, which fixes every offset; only
//! then are the bytes actually emitted. This avoids mutable offset
//! back-patching once real byte slices exist.
//!
//! The relocation table is never preserved verbatim. Per the container's
//! opaque-pointer-table convention, it is regenerated here as a flat list of
//! absolute file offsets of every pointer field this pass wrote.

use crate::binary::header::{
    write_i16_at, write_i32_at, write_u16_at, Header, HEADER_SIZE,
};
use crate::binary::raw::{RawScript, RawWindow};
use crate::model::{FormatVersion, IDENTIFIER_MAX_LEN};

const WINDOW_HEADER_ENTRY_SIZE: usize = 8;
const SPEAKER_TABLE_HEADER_SIZE: usize = 16;

struct Layout {
    base: usize,
    window_table_offset: usize,
    speaker_table_header_offset: usize,
    window_body_offsets: Vec<Option<usize>>,
    window_body_sizes: Vec<usize>,
    speaker_name_array_offset: usize,
    speaker_name_offsets: Vec<Option<usize>>,
    total_len: usize,
}

fn dialogue_body_size(window: &crate::binary::raw::RawDialogueWindow) -> usize {
    IDENTIFIER_MAX_LEN
        + 2 // line_count
        + 2 // speaker_id
        + window.line_start_offsets.len() * 4
        + 4 // text_buffer_size
        + window.text_buffer.len()
}

fn selection_body_size(window: &crate::binary::raw::RawSelectionWindow) -> usize {
    IDENTIFIER_MAX_LEN
        + 2 // field_18
        + 2 // option_count
        + 2 // field_1c
        + 2 // field_1e
        + window.option_start_offsets.len() * 4
        + 4 // text_buffer_size
        + window.text_buffer.len()
}

fn plan_layout(raw: &RawScript) -> Layout {
    let base = HEADER_SIZE;
    let window_table_offset = base;
    let window_table_size = raw.windows.len() * WINDOW_HEADER_ENTRY_SIZE;
    let speaker_table_header_offset = window_table_offset + window_table_size;

    let mut cursor = speaker_table_header_offset + SPEAKER_TABLE_HEADER_SIZE;
    let mut window_body_offsets = Vec::with_capacity(raw.windows.len());
    let mut window_body_sizes = Vec::with_capacity(raw.windows.len());
    for window in &raw.windows {
        match window {
            None => {
                window_body_offsets.push(None);
                window_body_sizes.push(0);
            }
            Some(RawWindow::Dialogue(w)) => {
                let size = dialogue_body_size(w);
                window_body_offsets.push(Some(cursor));
                window_body_sizes.push(size);
                cursor += size;
            }
            Some(RawWindow::Selection(w)) => {
                let size = selection_body_size(w);
                window_body_offsets.push(Some(cursor));
                window_body_sizes.push(size);
                cursor += size;
            }
        }
    }

    let speaker_name_array_offset = cursor;
    cursor += raw.speaker_names.len() * 4;

    let mut speaker_name_offsets = Vec::with_capacity(raw.speaker_names.len());
    for name in &raw.speaker_names {
        match name {
            None => speaker_name_offsets.push(None),
            Some(bytes) => {
                speaker_name_offsets.push(Some(cursor));
                cursor += bytes.len();
            }
        }
    }

    Layout {
        base,
        window_table_offset,
        speaker_table_header_offset,
        window_body_offsets,
        window_body_sizes,
        speaker_name_array_offset,
        speaker_name_offsets,
        total_len: cursor,
    }
}

/// Serializes `raw` into a complete container byte stream using `version`'s
/// endianness, regenerating the window table, speaker table, and relocation
/// table offsets from scratch.
#[must_use]
pub fn write_script(raw: &RawScript, version: FormatVersion) -> Vec<u8> {
    let layout = plan_layout(raw);
    let mut relocations: Vec<u32> = Vec::new();

    let relocation_table_offset = layout.total_len;
    let mut relocation_bytes = Vec::new();

    let mut out = vec![0u8; layout.total_len];

    for (index, window) in raw.windows.iter().enumerate() {
        let entry_offset = layout.window_table_offset + index * WINDOW_HEADER_ENTRY_SIZE;
        let (window_type, window_offset) = match (window, layout.window_body_offsets[index]) {
            (Some(RawWindow::Dialogue(_)), Some(body_offset)) => {
                (0i32, (body_offset - layout.base) as i32)
            }
            (Some(RawWindow::Selection(_)), Some(body_offset)) => {
                (1i32, (body_offset - layout.base) as i32)
            }
            _ => (0i32, 0i32),
        };
        write_i32_at(&mut out, entry_offset, window_type, version);
        write_i32_at(&mut out, entry_offset + 4, window_offset, version);
        if window_offset != 0 {
            relocations.push((entry_offset + 4) as u32);
        }

        if let (Some(w), Some(offset)) = (window, layout.window_body_offsets[index]) {
            write_window_body(&mut out, offset, w, version);
        }
    }

    write_i32_at(
        &mut out,
        layout.speaker_table_header_offset,
        (layout.speaker_name_array_offset - layout.base) as i32,
        version,
    );
    relocations.push(layout.speaker_table_header_offset as u32);
    write_i32_at(
        &mut out,
        layout.speaker_table_header_offset + 4,
        raw.speaker_names.len() as i32,
        version,
    );
    write_i32_at(
        &mut out,
        layout.speaker_table_header_offset + 8,
        raw.speaker_table_header.field_08,
        version,
    );
    write_i32_at(
        &mut out,
        layout.speaker_table_header_offset + 12,
        raw.speaker_table_header.field_0c,
        version,
    );

    for (index, name) in raw.speaker_names.iter().enumerate() {
        let entry_offset = layout.speaker_name_array_offset + index * 4;
        match (name, layout.speaker_name_offsets[index]) {
            (Some(bytes), Some(name_offset)) => {
                write_i32_at(
                    &mut out,
                    entry_offset,
                    (name_offset - layout.base) as i32,
                    version,
                );
                relocations.push(entry_offset as u32);
                out[name_offset..name_offset + bytes.len()].copy_from_slice(bytes);
            }
            _ => write_i32_at(&mut out, entry_offset, 0, version),
        }
    }

    for offset in &relocations {
        let bytes = if version.is_little_endian() {
            offset.to_le_bytes()
        } else {
            offset.to_be_bytes()
        };
        relocation_bytes.extend_from_slice(&bytes);
    }

    let header = Header {
        magic: Header::magic_for(version),
        file_size: (relocation_table_offset + relocation_bytes.len()) as i32,
        relocation_table_offset: if relocation_bytes.is_empty() {
            0
        } else {
            (relocation_table_offset - layout.base) as i32
        },
        relocation_table_size: relocation_bytes.len() as i32,
        window_count: raw.windows.len() as i32,
        is_relocated: !relocation_bytes.is_empty(),
        ..raw.header
    };
    out[..HEADER_SIZE].copy_from_slice(&header.write(version));

    out.extend_from_slice(&relocation_bytes);
    out
}

fn write_window_body(out: &mut [u8], offset: usize, window: &RawWindow, version: FormatVersion) {
    match window {
        RawWindow::Dialogue(w) => {
            out[offset..offset + IDENTIFIER_MAX_LEN].copy_from_slice(&w.identifier);
            let mut cursor = offset + IDENTIFIER_MAX_LEN;
            write_i16_at(out, cursor, w.line_count, version);
            cursor += 2;
            write_u16_at(out, cursor, w.speaker_id, version);
            cursor += 2;
            for value in &w.line_start_offsets {
                write_i32_at(out, cursor, *value, version);
                cursor += 4;
            }
            write_i32_at(out, cursor, w.text_buffer.len() as i32, version);
            cursor += 4;
            out[cursor..cursor + w.text_buffer.len()].copy_from_slice(&w.text_buffer);
        }
        RawWindow::Selection(w) => {
            out[offset..offset + IDENTIFIER_MAX_LEN].copy_from_slice(&w.identifier);
            let mut cursor = offset + IDENTIFIER_MAX_LEN;
            write_i16_at(out, cursor, w.field_18, version);
            cursor += 2;
            write_i16_at(out, cursor, w.option_count, version);
            cursor += 2;
            write_i16_at(out, cursor, w.field_1c, version);
            cursor += 2;
            write_i16_at(out, cursor, w.field_1e, version);
            cursor += 2;
            for value in &w.option_start_offsets {
                write_i32_at(out, cursor, *value, version);
                cursor += 4;
            }
            write_i32_at(out, cursor, w.text_buffer.len() as i32, version);
            cursor += 4;
            out[cursor..cursor + w.text_buffer.len()].copy_from_slice(&w.text_buffer);
        }
    }
}
