//! Lifts a [`RawScript`] into the validated, mutable [`Script`] tree.
//!
//! Lifting is where line buffers are actually decoded by [`crate::codec`],
//! identifiers are unpacked from their fixed-size fields, and a dialogue
//! window's numeric `speaker_id` is resolved against the speaker table into
//! a [`Speaker`].

use crate::binary::raw::{RawDialogueWindow, RawScript, RawSelectionWindow, RawWindow};
use crate::codec::decode_line;
use crate::diagnostics::DiagnosticSink;
use crate::model::{unpack_identifier, DialogueWindow, Line, Script, SelectionWindow, Speaker, Window};
use crate::MsgScriptError;

/// Lifts `raw` into a [`Script`], decoding every line buffer along the way.
/// Every non-zero opaque field encountered (a selection window's
/// `field_18`/`field_1c`/`field_1e`) is logged via [`DiagnosticSink::trace`]
/// before being preserved verbatim.
///
/// # Errors
///
/// Returns an error if any line buffer fails to decode (see
/// [`crate::codec::CodecError`]).
pub fn lift_script(raw: &RawScript, sink: &mut dyn DiagnosticSink) -> Result<Script, MsgScriptError> {
    let speaker_count = raw.speaker_names.len();
    let mut windows = Vec::with_capacity(raw.windows.len());
    for window in raw.windows.iter().flatten() {
        windows.push(lift_window(window, raw, speaker_count, sink)?);
    }
    Ok(Script {
        user_id: raw.header.user_id,
        format_version: crate::binary::header::Header::format_version_for_magic(&raw.header.magic)
            .unwrap_or(crate::model::FormatVersion::V1LittleEndian),
        windows,
    })
}

fn lift_window(
    window: &RawWindow,
    raw: &RawScript,
    speaker_count: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<Window, MsgScriptError> {
    match window {
        RawWindow::Dialogue(w) => Ok(Window::Dialogue(lift_dialogue(w, raw, speaker_count)?)),
        RawWindow::Selection(w) => Ok(Window::Selection(lift_selection(w, sink)?)),
    }
}

/// Decodes every line whose start offset is given, rebasing offsets so the
/// smallest equals `0` relative to `text_buffer`.
fn lift_lines(offsets: &[i32], text_buffer: &[u8]) -> Result<Vec<Line>, MsgScriptError> {
    let rebase = offsets.iter().copied().min().unwrap_or(0);
    let mut lines = Vec::with_capacity(offsets.len());
    for &offset in offsets {
        let start = usize::try_from(offset - rebase).unwrap_or(0);
        let (line, _) = decode_line(text_buffer, start)?;
        lines.push(line);
    }
    Ok(lines)
}

fn lift_dialogue(
    w: &RawDialogueWindow,
    raw: &RawScript,
    speaker_count: usize,
) -> Result<DialogueWindow, MsgScriptError> {
    let lines = lift_lines(&w.line_start_offsets, &w.text_buffer)?;
    let speaker_id = usize::from(w.speaker_id);
    let speaker = if speaker_id >= speaker_count {
        Some(Speaker::VariableIndex(w.speaker_id))
    } else {
        match raw.speaker_names.get(speaker_id).and_then(Option::as_ref) {
            Some(name_bytes) => {
                let (line, _) = decode_line(name_bytes, 0)?;
                Some(Speaker::Named(line))
            }
            None => None,
        }
    };
    Ok(DialogueWindow {
        identifier: unpack_identifier(&w.identifier),
        speaker,
        lines,
    })
}

fn lift_selection(w: &RawSelectionWindow, sink: &mut dyn DiagnosticSink) -> Result<SelectionWindow, MsgScriptError> {
    let lines = lift_lines(&w.option_start_offsets, &w.text_buffer)?;
    if w.field_18 != 0 {
        sink.trace(&format!("selection window field_18 is non-zero ({}), preserved verbatim", w.field_18));
    }
    if w.field_1c != 0 {
        sink.trace(&format!("selection window field_1c is non-zero ({}), preserved verbatim", w.field_1c));
    }
    if w.field_1e != 0 {
        sink.trace(&format!("selection window field_1e is non-zero ({}), preserved verbatim", w.field_1e));
    }
    Ok(SelectionWindow {
        identifier: unpack_identifier(&w.identifier),
        lines,
        field_18: w.field_18,
        field_1c: w.field_1c,
        field_1e: w.field_1e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::header::Header;
    use crate::binary::raw::RawSpeakerTableHeader;
    use crate::model::{FormatVersion, Token};

    fn header(version: FormatVersion) -> crate::binary::header::Header {
        Header {
            file_type: 0,
            is_compressed: false,
            user_id: 0,
            file_size: 0,
            magic: Header::magic_for(version),
            field_0c: 0,
            relocation_table_offset: 0,
            relocation_table_size: 0,
            window_count: 1,
            is_relocated: false,
            field_1e: 0,
        }
    }

    #[test]
    fn lifts_a_named_speaker_dialogue_window() {
        let mut identifier = [0u8; crate::model::IDENTIFIER_MAX_LEN];
        identifier[..5].copy_from_slice(b"greet");
        let dialogue = RawDialogueWindow {
            identifier,
            line_count: 1,
            speaker_id: 0,
            line_start_offsets: vec![0],
            text_buffer: b"HI\0".to_vec(),
        };
        let raw = RawScript {
            header: header(FormatVersion::V1LittleEndian),
            windows: vec![Some(RawWindow::Dialogue(dialogue))],
            speaker_table_header: RawSpeakerTableHeader {
                speaker_name_array_offset: 0,
                speaker_count: 1,
                field_08: 0,
                field_0c: 0,
            },
            speaker_names: vec![Some(b"Bob\0".to_vec())],
            relocation_table: None,
        };
        let script = lift_script(&raw, &mut crate::diagnostics::NullSink).unwrap();
        assert_eq!(script.windows.len(), 1);
        let Window::Dialogue(w) = &script.windows[0] else {
            panic!("expected dialogue window");
        };
        assert_eq!(w.identifier, "greet");
        assert_eq!(w.lines[0].tokens, vec![Token::Text(b"HI".to_vec())]);
        match &w.speaker {
            Some(Speaker::Named(line)) => assert_eq!(line.tokens, vec![Token::Text(b"Bob".to_vec())]),
            other => panic!("expected named speaker, got {other:?}"),
        }
    }

    #[test]
    fn speaker_id_past_table_end_is_variable_index() {
        let mut identifier = [0u8; crate::model::IDENTIFIER_MAX_LEN];
        identifier[..5].copy_from_slice(b"greet");
        let dialogue = RawDialogueWindow {
            identifier,
            line_count: 0,
            speaker_id: 9,
            line_start_offsets: vec![],
            text_buffer: vec![],
        };
        let raw = RawScript {
            header: header(FormatVersion::V1LittleEndian),
            windows: vec![Some(RawWindow::Dialogue(dialogue))],
            speaker_table_header: RawSpeakerTableHeader {
                speaker_name_array_offset: 0,
                speaker_count: 1,
                field_08: 0,
                field_0c: 0,
            },
            speaker_names: vec![Some(b"Bob\0".to_vec())],
            relocation_table: None,
        };
        let script = lift_script(&raw, &mut crate::diagnostics::NullSink).unwrap();
        let Window::Dialogue(w) = &script.windows[0] else {
            panic!("expected dialogue window");
        };
        assert_eq!(w.speaker, Some(Speaker::VariableIndex(9)));
    }

    #[derive(Default)]
    struct RecordingSink {
        traces: Vec<String>,
    }

    impl crate::diagnostics::DiagnosticSink for RecordingSink {
        fn trace(&mut self, message: &str) {
            self.traces.push(message.to_owned());
        }
        fn info(&mut self, _message: &str) {}
        fn warning(&mut self, _message: &str) {}
        fn error(&mut self, _message: &str) {}
    }

    #[test]
    fn traces_non_zero_opaque_selection_fields() {
        let selection = RawSelectionWindow {
            identifier: [0u8; crate::model::IDENTIFIER_MAX_LEN],
            field_18: 7,
            option_count: 0,
            field_1c: 0,
            field_1e: 3,
            option_start_offsets: vec![],
            text_buffer: vec![],
        };
        let raw = RawScript {
            header: header(FormatVersion::V1LittleEndian),
            windows: vec![Some(RawWindow::Selection(selection))],
            speaker_table_header: RawSpeakerTableHeader {
                speaker_name_array_offset: 0,
                speaker_count: 0,
                field_08: 0,
                field_0c: 0,
            },
            speaker_names: vec![],
            relocation_table: None,
        };
        let mut sink = RecordingSink::default();
        lift_script(&raw, &mut sink).unwrap();
        assert_eq!(sink.traces.len(), 2, "{:?}", sink.traces);
        assert!(sink.traces[0].contains("field_18"));
        assert!(sink.traces[1].contains("field_1e"));
    }
}
