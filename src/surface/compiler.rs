//! Walks a [`DocumentTree`] (produced by any front-end, default
//! [`crate::surface::lexer`]) and builds a [`Script`].
//!
//! Four tag names are reserved and resolved without a [`LibrarySet`]: `f`
//! (function token), `n` (new line), `e` (end of line), `x` (code point).
//! Recognition of these four is case-insensitive; every other tag name is
//! looked up case-sensitively against the configured library.

use thiserror::Error;

use crate::diagnostics::DiagnosticSink;
use crate::library::LibrarySet;
use crate::model::{DialogueWindow, FormatVersion, Line, Script, SelectionWindow, Speaker, Token, Window};
use crate::surface::tree::{DocumentTree, ParsedNode, WindowKind, WindowNode};

/// A problem encountered while compiling surface syntax into a [`Script`].
/// Unlike [`crate::binary::BinaryError`], these accumulate rather than
/// aborting: a [`CompileOutput`] carries every diagnostic produced.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The front-end could not make sense of the input at this position.
    #[error("{line}:{col}: {message}")]
    Syntax {
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
        /// A human-readable description of the problem.
        message: String,
    },
    /// A tag name was neither one of the four reserved names nor resolved
    /// via the configured [`LibrarySet`].
    #[error("{line}:{col}: unknown tag `{name}`")]
    UnknownTag {
        /// The offending tag name, as written.
        name: String,
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
    },
    /// A tag argument was not a valid decimal or `0x`-prefixed hex integer.
    #[error("{line}:{col}: `{text}` is not a valid integer literal")]
    IntLiteralFormat {
        /// The offending literal text.
        text: String,
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
    },
    /// An integer argument did not fit in its narrower target type.
    #[error("{line}:{col}: value {value} does not fit")]
    ArgOutOfRange {
        /// The value that failed to narrow.
        value: i32,
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
    },
}

/// Options controlling compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// When `true`, a narrowing conversion that would lose bits (e.g. an
    /// `i32` argument too large for `i16`) is reported as
    /// [`CompileError::ArgOutOfRange`]. When `false` (the default), the
    /// value is silently truncated, preserving what real scripts have
    /// always relied on.
    pub strict_narrowing: bool,
    /// The [`FormatVersion`] stamped onto the compiled [`Script`]. Has no
    /// effect on compilation itself; only matters if the result is later
    /// lowered and written to binary.
    pub format_version: FormatVersion,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict_narrowing: false,
            format_version: FormatVersion::V1LittleEndian,
        }
    }
}

/// The result of compiling a document: the best-effort [`Script`] built so
/// far, plus every diagnostic raised along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// The compiled script. Complete only if `diagnostics` is empty.
    pub script: Script,
    /// Every [`CompileError`] raised while compiling, in source order.
    pub diagnostics: Vec<CompileError>,
}

impl CompileOutput {
    /// Returns whether compilation produced no diagnostics.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

fn narrow_to_u8(
    value: i32,
    options: CompileOptions,
    line: usize,
    col: usize,
    diagnostics: &mut Vec<CompileError>,
) -> u8 {
    match u8::try_from(value) {
        Ok(v) => v,
        Err(_) => {
            if options.strict_narrowing {
                diagnostics.push(CompileError::ArgOutOfRange { value, line, col });
            }
            value as u8
        }
    }
}

fn narrow_to_i16(
    value: i32,
    options: CompileOptions,
    line: usize,
    col: usize,
    diagnostics: &mut Vec<CompileError>,
) -> i16 {
    match i16::try_from(value) {
        Ok(v) => v,
        Err(_) => {
            if options.strict_narrowing {
                diagnostics.push(CompileError::ArgOutOfRange { value, line, col });
            }
            value as i16
        }
    }
}

/// Compiles a single window's body (or a speaker sub-block) into a
/// sequence of [`Line`]s: tokens accumulate until `[e]`, at which point the
/// current line is finalized and a new one begins. Any tokens left over at
/// the end (no trailing `[e]`) are finalized into one last line.
fn compile_nodes(
    nodes: &[ParsedNode],
    options: CompileOptions,
    libraries: Option<&LibrarySet>,
    diagnostics: &mut Vec<CompileError>,
    sink: &mut dyn DiagnosticSink,
) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Vec::new();

    for node in nodes {
        match node {
            ParsedNode::Text(text) => {
                let cleaned: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
                if !cleaned.is_empty() {
                    current.push(Token::Text(cleaned.into_bytes()));
                }
            }
            ParsedNode::Tag {
                name,
                int_literals,
                line,
                col,
            } => match name.to_ascii_lowercase().as_str() {
                "f" => {
                    if int_literals.len() < 2 {
                        diagnostics.push(CompileError::Syntax {
                            line: *line,
                            col: *col,
                            message: "`f` tag requires at least a table index and function index".into(),
                        });
                        continue;
                    }
                    let table_index = narrow_to_u8(int_literals[0], options, *line, *col, diagnostics);
                    let function_index = narrow_to_u8(int_literals[1], options, *line, *col, diagnostics);
                    let args = int_literals[2..]
                        .iter()
                        .map(|v| narrow_to_i16(*v, options, *line, *col, diagnostics))
                        .collect();
                    current.push(Token::Function {
                        table_index,
                        function_index,
                        args,
                    });
                }
                "n" => current.push(Token::NewLine),
                "e" => lines.push(Line::from_tokens(std::mem::take(&mut current))),
                "x" => {
                    if int_literals.len() != 2 {
                        diagnostics.push(CompileError::Syntax {
                            line: *line,
                            col: *col,
                            message: "`x` tag requires exactly two arguments".into(),
                        });
                        continue;
                    }
                    let high = narrow_to_u8(int_literals[0], options, *line, *col, diagnostics);
                    let low = narrow_to_u8(int_literals[1], options, *line, *col, diagnostics);
                    current.push(Token::CodePoint { high, low });
                }
                _ => match libraries.and_then(|libs| libs.find_by_name(name)) {
                    Some((lib, entry)) => {
                        let args = int_literals
                            .iter()
                            .take(entry.parameters.len())
                            .map(|v| narrow_to_i16(*v, options, *line, *col, diagnostics))
                            .collect();
                        current.push(Token::Function {
                            table_index: lib.index,
                            function_index: entry.index,
                            args,
                        });
                    }
                    None => {
                        diagnostics.push(CompileError::UnknownTag {
                            name: name.clone(),
                            line: *line,
                            col: *col,
                        });
                    }
                },
            },
        }
    }

    if !current.is_empty() {
        lines.push(Line::from_tokens(current));
    }
    if lines.is_empty() && nodes.is_empty() {
        lines.push(Line::new());
    }
    let _ = sink;
    lines
}

fn compile_speaker_block(
    nodes: &[ParsedNode],
    options: CompileOptions,
    libraries: Option<&LibrarySet>,
    diagnostics: &mut Vec<CompileError>,
    sink: &mut dyn DiagnosticSink,
) -> Speaker {
    let mut lines = compile_nodes(nodes, options, libraries, diagnostics, sink);
    if lines.len() > 1 {
        sink.warning("speaker sub-block has more than one line; using only the first");
        lines.truncate(1);
    }
    let first = lines.pop().unwrap_or_else(Line::new);
    if let [Token::Text(bytes)] = first.tokens.as_slice() {
        if let Ok(text) = std::str::from_utf8(bytes) {
            if let Ok(index) = text.trim().parse::<u16>() {
                return Speaker::VariableIndex(index);
            }
        }
    }
    Speaker::Named(first)
}

fn compile_window(
    node: &WindowNode,
    options: CompileOptions,
    libraries: Option<&LibrarySet>,
    diagnostics: &mut Vec<CompileError>,
    sink: &mut dyn DiagnosticSink,
) -> Window {
    match node.kind {
        WindowKind::Dialogue => {
            let speaker = node
                .speaker_block
                .as_ref()
                .map(|block| compile_speaker_block(block, options, libraries, diagnostics, sink));
            let lines = compile_nodes(&node.body, options, libraries, diagnostics, sink);
            Window::Dialogue(DialogueWindow {
                identifier: node.identifier.clone(),
                speaker,
                lines,
            })
        }
        WindowKind::Selection => {
            let lines = compile_nodes(&node.body, options, libraries, diagnostics, sink);
            Window::Selection(SelectionWindow {
                identifier: node.identifier.clone(),
                lines,
                field_18: 0,
                field_1c: 0,
                field_1e: 0,
            })
        }
    }
}

/// Compiles a [`DocumentTree`] into a [`CompileOutput`], never failing
/// outright: problems accumulate into `diagnostics` instead.
pub fn compile_document(
    tree: &DocumentTree,
    options: CompileOptions,
    libraries: Option<&LibrarySet>,
    sink: &mut dyn DiagnosticSink,
) -> CompileOutput {
    let mut diagnostics = Vec::new();
    let windows = tree
        .windows
        .iter()
        .map(|w| compile_window(w, options, libraries, &mut diagnostics, sink))
        .collect();
    CompileOutput {
        script: Script {
            user_id: 0,
            format_version: options.format_version,
            windows,
        },
        diagnostics,
    }
}

/// Lexes and compiles `source` in one call, returning `Ok` only if no
/// diagnostic was raised.
///
/// # Errors
///
/// Returns the first [`CompileError`] raised by either the lexer or the
/// compiler, for callers that want fail-fast semantics instead of
/// inspecting a full [`CompileOutput`].
pub fn compile(
    source: &str,
    options: CompileOptions,
    libraries: Option<&LibrarySet>,
) -> Result<Script, CompileError> {
    let mut sink = crate::diagnostics::TracingSink;
    let (tree, mut diagnostics) = crate::surface::lexer::lex_document(source);
    let output = compile_document(&tree, options, libraries, &mut sink);
    diagnostics.extend(output.diagnostics);
    if let Some(first) = diagnostics.into_iter().next() {
        return Err(first);
    }
    Ok(output.script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::library::{FunctionEntry, FunctionLibrary, ParameterKind};
    use crate::surface::lexer::lex_document;

    #[test]
    fn a4_empty_dialogue_window() {
        let (tree, lex_errors) = lex_document("[dlg greet][e]");
        assert!(lex_errors.is_empty());
        let mut sink = NullSink;
        let output = compile_document(&tree, CompileOptions::default(), None, &mut sink);
        assert!(output.is_success());
        let Window::Dialogue(w) = &output.script.windows[0] else {
            panic!("expected dialogue window");
        };
        assert_eq!(w.identifier, "greet");
        assert!(w.speaker.is_none());
        assert_eq!(w.lines, vec![Line::new()]);
    }

    #[test]
    fn a5_speaker_block_and_inline_newline() {
        let (tree, lex_errors) = lex_document("[dlg hi [Bob]]Hello[n]world[e]");
        assert!(lex_errors.is_empty(), "{lex_errors:?}");
        let mut sink = NullSink;
        let output = compile_document(&tree, CompileOptions::default(), None, &mut sink);
        assert!(output.is_success(), "{:?}", output.diagnostics);
        let Window::Dialogue(w) = &output.script.windows[0] else {
            panic!("expected dialogue window");
        };
        assert_eq!(w.identifier, "hi");
        assert_eq!(
            w.speaker,
            Some(Speaker::Named(Line::from_tokens(vec![Token::text("Bob")])))
        );
        assert_eq!(
            w.lines,
            vec![Line::from_tokens(vec![
                Token::text("Hello"),
                Token::NewLine,
                Token::text("world"),
            ])]
        );
    }

    #[test]
    fn unknown_tag_without_library_is_reported() {
        let (tree, _) = lex_document("[dlg x][Bob 1][e]");
        let mut sink = NullSink;
        let output = compile_document(&tree, CompileOptions::default(), None, &mut sink);
        assert!(matches!(
            output.diagnostics.as_slice(),
            [CompileError::UnknownTag { name, .. }] if name == "Bob"
        ));
    }

    #[test]
    fn named_tag_resolves_via_library() {
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
        let (tree, _) = lex_document("[dlg x][Wait 10][e]");
        let mut sink = NullSink;
        let output = compile_document(&tree, CompileOptions::default(), Some(&libraries), &mut sink);
        assert!(output.is_success());
        let Window::Dialogue(w) = &output.script.windows[0] else {
            panic!("expected dialogue window");
        };
        assert_eq!(
            w.lines[0].tokens,
            vec![Token::Function {
                table_index: 0,
                function_index: 2,
                args: vec![10],
            }]
        );
    }

    #[test]
    fn variable_index_speaker_block() {
        let (tree, _) = lex_document("[dlg x [3]][e]");
        let mut sink = NullSink;
        let output = compile_document(&tree, CompileOptions::default(), None, &mut sink);
        let Window::Dialogue(w) = &output.script.windows[0] else {
            panic!("expected dialogue window");
        };
        assert_eq!(w.speaker, Some(Speaker::VariableIndex(3)));
    }
}
