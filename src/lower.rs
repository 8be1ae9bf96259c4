//! Lowers a [`Script`] into a [`RawScript`], the inverse of [`crate::lift`].
//!
//! Named speakers are deduplicated into a single shared speaker table,
//! windows without a speaker all share one null table slot, and a
//! [`Speaker::VariableIndex`] is written through as the raw `speaker_id`
//! verbatim. That last case means a variable index that happens to fall
//! within the live speaker table's range will lift back as a named speaker
//! rather than a variable one; this ambiguity is inherent to the on-disk
//! format, not introduced here.

use crate::binary::raw::{
    RawDialogueWindow, RawScript, RawSelectionWindow, RawSpeakerTableHeader, RawWindow,
};
use crate::binary::header::Header;
use crate::codec::{encode_line, CodecOptions};
use crate::model::{pack_identifier, DialogueWindow, Line, Script, SelectionWindow, Speaker, Window};
use crate::MsgScriptError;

struct SpeakerTable {
    entries: Vec<Option<Line>>,
    null_slot: Option<usize>,
}

impl SpeakerTable {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            null_slot: None,
        }
    }

    fn index_for(&mut self, speaker: Option<&Speaker>) -> u16 {
        match speaker {
            None => {
                let slot = *self.null_slot.get_or_insert_with(|| {
                    let index = self.entries.len();
                    self.entries.push(None);
                    index
                });
                slot as u16
            }
            Some(Speaker::VariableIndex(idx)) => *idx,
            Some(Speaker::Named(line)) => {
                if let Some(index) = self
                    .entries
                    .iter()
                    .position(|entry| entry.as_ref() == Some(line))
                {
                    return index as u16;
                }
                let index = self.entries.len();
                self.entries.push(Some(line.clone()));
                index as u16
            }
        }
    }
}

/// Lowers `script` into a [`RawScript`], encoding every line with `options`.
///
/// # Errors
///
/// Returns an error if packing a window's identifier exceeds
/// [`crate::model::IDENTIFIER_MAX_LEN`] bytes.
pub fn lower_script(script: &Script, options: CodecOptions) -> Result<RawScript, MsgScriptError> {
    let mut speaker_table = SpeakerTable::new();
    let mut windows = Vec::with_capacity(script.windows.len());
    for window in &script.windows {
        windows.push(Some(lower_window(window, &mut speaker_table, options)?));
    }

    let speaker_names = speaker_table
        .entries
        .into_iter()
        .map(|entry| {
            entry.map(|line| {
                let mut bytes = Vec::new();
                encode_line(&line, options, &mut bytes);
                bytes
            })
        })
        .collect::<Vec<_>>();

    let header = Header {
        file_type: 0,
        is_compressed: false,
        user_id: script.user_id,
        file_size: 0,
        magic: Header::magic_for(script.format_version),
        field_0c: 0,
        relocation_table_offset: 0,
        relocation_table_size: 0,
        window_count: windows.len() as i32,
        is_relocated: false,
        field_1e: 0,
    };

    Ok(RawScript {
        header,
        windows,
        speaker_table_header: RawSpeakerTableHeader {
            speaker_name_array_offset: 0,
            speaker_count: speaker_names.len() as i32,
            field_08: 0,
            field_0c: 0,
        },
        speaker_names,
        relocation_table: None,
    })
}

fn lower_window(
    window: &Window,
    speaker_table: &mut SpeakerTable,
    options: CodecOptions,
) -> Result<RawWindow, MsgScriptError> {
    match window {
        Window::Dialogue(w) => Ok(RawWindow::Dialogue(lower_dialogue(w, speaker_table, options)?)),
        Window::Selection(w) => Ok(RawWindow::Selection(lower_selection(w, options)?)),
    }
}

/// Encodes `lines` and lays them out contiguously, so the resulting start
/// offsets are already rebased with the smallest equal to `0`.
fn lay_out_lines(lines: &[Line], options: CodecOptions) -> (Vec<i32>, Vec<u8>) {
    let mut offsets = Vec::with_capacity(lines.len());
    let mut buffer = Vec::new();
    for line in lines {
        offsets.push(buffer.len() as i32);
        encode_line(line, options, &mut buffer);
    }
    (offsets, buffer)
}

fn lower_dialogue(
    w: &DialogueWindow,
    speaker_table: &mut SpeakerTable,
    options: CodecOptions,
) -> Result<RawDialogueWindow, MsgScriptError> {
    let identifier = pack_identifier(&w.identifier).map_err(crate::binary::BinaryError::from)?;
    let speaker_id = speaker_table.index_for(w.speaker.as_ref());
    let (line_start_offsets, text_buffer) = lay_out_lines(&w.lines, options);
    Ok(RawDialogueWindow {
        identifier,
        line_count: w.lines.len() as i16,
        speaker_id,
        line_start_offsets,
        text_buffer,
    })
}

fn lower_selection(w: &SelectionWindow, options: CodecOptions) -> Result<RawSelectionWindow, MsgScriptError> {
    let identifier = pack_identifier(&w.identifier).map_err(crate::binary::BinaryError::from)?;
    let (option_start_offsets, text_buffer) = lay_out_lines(&w.lines, options);
    Ok(RawSelectionWindow {
        identifier,
        field_18: w.field_18,
        option_count: w.lines.len() as i16,
        field_1c: w.field_1c,
        field_1e: w.field_1e,
        option_start_offsets,
        text_buffer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_line;
    use crate::model::{FormatVersion, Token};

    #[test]
    fn lowers_and_reads_back_a_named_speaker() {
        let mut script = Script::new(FormatVersion::V1LittleEndian);
        script.windows.push(Window::Dialogue(DialogueWindow {
            identifier: "greet".into(),
            speaker: Some(Speaker::Named(Line::from_tokens(vec![Token::text("Bob")]))),
            lines: vec![Line::from_tokens(vec![Token::text("HI")])],
        }));
        let raw = lower_script(&script, CodecOptions::default()).unwrap();
        assert_eq!(raw.speaker_names.len(), 1);
        let Some(RawWindow::Dialogue(w)) = &raw.windows[0] else {
            panic!("expected dialogue window");
        };
        assert_eq!(w.speaker_id, 0);
        let (line, _) = decode_line(&w.text_buffer, 0).unwrap();
        assert_eq!(line.tokens, vec![Token::Text(b"HI".to_vec())]);
    }

    #[test]
    fn shares_one_null_slot_across_speakerless_windows() {
        let mut script = Script::new(FormatVersion::V1LittleEndian);
        for _ in 0..2 {
            script.windows.push(Window::Dialogue(DialogueWindow {
                identifier: "w".into(),
                speaker: None,
                lines: vec![],
            }));
        }
        let raw = lower_script(&script, CodecOptions::default()).unwrap();
        assert_eq!(raw.speaker_names.len(), 1);
        assert_eq!(raw.speaker_names[0], None);
    }

    #[test]
    fn rejects_an_overlong_identifier() {
        let mut script = Script::new(FormatVersion::V1LittleEndian);
        script.windows.push(Window::Selection(SelectionWindow {
            identifier: "x".repeat(25),
            lines: vec![],
            field_18: 0,
            field_1c: 0,
            field_1e: 0,
        }));
        let err = lower_script(&script, CodecOptions::default()).unwrap_err();
        assert!(matches!(err, MsgScriptError::Binary(_)));
    }
}
