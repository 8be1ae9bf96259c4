//! Walks a [`Script`] and emits tag-annotated surface syntax, the inverse
//! of [`crate::surface::compiler::compile`].

use std::fmt::Write as _;

use itertools::Itertools as _;

use crate::library::{LibrarySet, UNUSED_SENTINEL};
use crate::model::{DialogueWindow, Line, Script, SelectionWindow, Speaker, Token, Window};

/// Options controlling decompilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecompileOptions {
    /// When `true`, a [`Token::Function`] whose library entry is named
    /// [`UNUSED_SENTINEL`] is omitted from the emitted line entirely.
    pub omit_unused: bool,
}

/// Decompiles `script` into surface syntax text, resolving function-token
/// names via `libraries` when given.
#[must_use]
pub fn decompile_script(script: &Script, libraries: Option<&LibrarySet>, options: DecompileOptions) -> String {
    let mut out = String::new();
    for window in &script.windows {
        decompile_window(window, libraries, options, &mut out);
    }
    out
}

fn decompile_window(window: &Window, libraries: Option<&LibrarySet>, options: DecompileOptions, out: &mut String) {
    match window {
        Window::Dialogue(w) => decompile_dialogue(w, libraries, options, out),
        Window::Selection(w) => decompile_selection(w, libraries, options, out),
    }
}

fn decompile_dialogue(w: &DialogueWindow, libraries: Option<&LibrarySet>, options: DecompileOptions, out: &mut String) {
    write!(out, "[dlg {}", w.identifier).expect("writing to a String never fails");
    match &w.speaker {
        Some(Speaker::Named(line)) => {
            out.push_str(" [");
            decompile_tokens(&line.tokens, libraries, options, out);
            out.push(']');
        }
        Some(Speaker::VariableIndex(index)) => {
            write!(out, " [{index}]").expect("writing to a String never fails");
        }
        None => {}
    }
    out.push_str("]\n");
    for line in &w.lines {
        decompile_line(line, libraries, options, out);
    }
}

fn decompile_selection(w: &SelectionWindow, libraries: Option<&LibrarySet>, options: DecompileOptions, out: &mut String) {
    writeln!(out, "[sel {}]", w.identifier).expect("writing to a String never fails");
    for line in &w.lines {
        decompile_line(line, libraries, options, out);
    }
}

fn decompile_line(line: &Line, libraries: Option<&LibrarySet>, options: DecompileOptions, out: &mut String) {
    decompile_tokens(&line.tokens, libraries, options, out);
    out.push_str("[e]\n");
}

fn decompile_tokens(tokens: &[Token], libraries: Option<&LibrarySet>, options: DecompileOptions, out: &mut String) {
    for token in tokens {
        decompile_token(token, libraries, options, out);
    }
}

fn decompile_token(token: &Token, libraries: Option<&LibrarySet>, options: DecompileOptions, out: &mut String) {
    match token {
        Token::Text(bytes) => out.push_str(&String::from_utf8_lossy(bytes)),
        Token::NewLine => out.push_str("[n]"),
        Token::CodePoint { high, low } => {
            write!(out, "[x 0x{high:02X} 0x{low:02X}]").expect("writing to a String never fails");
        }
        Token::Function {
            table_index,
            function_index,
            args,
        } => decompile_function(*table_index, *function_index, args, libraries, options, out),
    }
}

fn decompile_function(
    table_index: u8,
    function_index: u8,
    args: &[i16],
    libraries: Option<&LibrarySet>,
    options: DecompileOptions,
    out: &mut String,
) {
    if let Some((_, entry)) = libraries.and_then(|libs| libs.find_by_indices(table_index, function_index)) {
        if options.omit_unused && entry.name == UNUSED_SENTINEL {
            return;
        }
        out.push('[');
        out.push_str(&entry.name);
        write_args(args, out);
        out.push(']');
        return;
    }
    write!(out, "[f {table_index} {function_index}").expect("writing to a String never fails");
    write_args(args, out);
    out.push(']');
}

fn write_args(args: &[i16], out: &mut String) {
    if args.is_empty() {
        return;
    }
    out.push(' ');
    out.push_str(&args.iter().map(i16::to_string).join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{FunctionEntry, FunctionLibrary, ParameterKind};
    use crate::model::FormatVersion;

    #[test]
    fn a6_variable_index_speaker_and_unnamed_function() {
        let script = Script {
            user_id: 0,
            format_version: FormatVersion::V1LittleEndian,
            windows: vec![Window::Dialogue(DialogueWindow {
                identifier: "greet".into(),
                speaker: Some(Speaker::VariableIndex(3)),
                lines: vec![Line::from_tokens(vec![Token::Function {
                    table_index: 0,
                    function_index: 2,
                    args: vec![100],
                }])],
            })],
        };
        let text = decompile_script(&script, None, DecompileOptions::default());
        assert_eq!(text, "[dlg greet [3]]\n[f 0 2 100][e]\n");
    }

    #[test]
    fn resolves_function_name_via_library() {
        let libraries = LibrarySet {
            libraries: vec![FunctionLibrary {
                index: 0,
                name: "common".into(),
                functions: vec![FunctionEntry {
                    name: "Wait".into(),
                    index: 2,
                    parameters: vec![ParameterKind::Int16],
                }],
            }],
        };
        let script = Script {
            user_id: 0,
            format_version: FormatVersion::V1LittleEndian,
            windows: vec![Window::Selection(SelectionWindow {
                identifier: "choice".into(),
                lines: vec![Line::from_tokens(vec![Token::Function {
                    table_index: 0,
                    function_index: 2,
                    args: vec![10],
                }])],
                field_18: 0,
                field_1c: 0,
                field_1e: 0,
            })],
        };
        let text = decompile_script(&script, Some(&libraries), DecompileOptions::default());
        assert_eq!(text, "[sel choice]\n[Wait 10][e]\n");
    }

    #[test]
    fn omits_unused_sentinel_function_when_flagged() {
        let libraries = LibrarySet {
            libraries: vec![FunctionLibrary {
                index: 0,
                name: "common".into(),
                functions: vec![FunctionEntry {
                    name: UNUSED_SENTINEL.into(),
                    index: 3,
                    parameters: vec![],
                }],
            }],
        };
        let script = Script {
            user_id: 0,
            format_version: FormatVersion::V1LittleEndian,
            windows: vec![Window::Dialogue(DialogueWindow {
                identifier: "greet".into(),
                speaker: None,
                lines: vec![Line::from_tokens(vec![
                    Token::text("Hi"),
                    Token::Function {
                        table_index: 0,
                        function_index: 3,
                        args: vec![],
                    },
                ])],
            })],
        };
        let text = decompile_script(&script, Some(&libraries), DecompileOptions { omit_unused: true });
        assert_eq!(text, "[dlg greet]\nHi[e]\n");
    }
}
