//! The default grammar front-end: a hand-rolled scanner that turns
//! `[dlg ident [...]]...[sel ident]...` source text into a [`DocumentTree`],
//! without depending on any parser-generator runtime.

use crate::surface::compiler::CompileError;
use crate::surface::cursor::Cursor;
use crate::surface::tree::{DocumentTree, ParsedNode, WindowKind, WindowNode};

/// Lexes `source` into a [`DocumentTree`], reporting malformed brackets or
/// identifiers as [`CompileError::Syntax`]. Recoverable: a malformed
/// construct is skipped so later windows still lex.
#[must_use]
pub fn lex_document(source: &str) -> (DocumentTree, Vec<CompileError>) {
    let mut cursor = Cursor::new(source);
    let mut errors = Vec::new();
    let mut windows = Vec::new();

    skip_whitespace(&mut cursor);
    while !cursor.is_at_end() {
        match peek_window_kind(&cursor) {
            Some(kind) => windows.push(lex_window(&mut cursor, kind, &mut errors)),
            None => {
                let (line, col) = cursor.position();
                errors.push(CompileError::Syntax {
                    line,
                    col,
                    message: "expected a `[dlg ...]` or `[sel ...]` window header".into(),
                });
                cursor.advance();
            }
        }
        skip_whitespace(&mut cursor);
    }

    (DocumentTree { windows }, errors)
}

fn skip_whitespace(cursor: &mut Cursor) {
    cursor.take_while(char::is_whitespace);
}

fn peek_window_kind(cursor: &Cursor) -> Option<WindowKind> {
    if cursor.peek() != Some('[') {
        return None;
    }
    let word: String = (1..=3usize).filter_map(|offset| cursor.peek_at(offset)).collect();
    match word.to_ascii_lowercase().as_str() {
        "dlg" => Some(WindowKind::Dialogue),
        "sel" => Some(WindowKind::Selection),
        _ => None,
    }
}

fn lex_window(cursor: &mut Cursor, kind: WindowKind, errors: &mut Vec<CompileError>) -> WindowNode {
    cursor.advance(); // '['
    cursor.take_while(|c| c.is_ascii_alphabetic());
    skip_whitespace(cursor);
    let identifier = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
    skip_whitespace(cursor);

    let speaker_block = if kind == WindowKind::Dialogue && cursor.peek() == Some('[') {
        cursor.advance(); // '['
        let nodes = lex_nodes(cursor, true, errors);
        if !cursor.bump_if(']') {
            let (line, col) = cursor.position();
            errors.push(CompileError::Syntax {
                line,
                col,
                message: "unterminated speaker sub-block".into(),
            });
        }
        skip_whitespace(cursor);
        Some(nodes)
    } else {
        None
    };

    if !cursor.bump_if(']') {
        let (line, col) = cursor.position();
        errors.push(CompileError::Syntax {
            line,
            col,
            message: "unterminated window header".into(),
        });
    }

    let body = lex_nodes(cursor, false, errors);
    WindowNode {
        kind,
        identifier,
        speaker_block,
        body,
    }
}

/// Reads a run of [`ParsedNode`]s. When `stop_at_bracket` is set (inside a
/// speaker sub-block), reading stops just before the closing `]`. Otherwise
/// (a window body), reading stops at the next window header or end of
/// input.
fn lex_nodes(cursor: &mut Cursor, stop_at_bracket: bool, errors: &mut Vec<CompileError>) -> Vec<ParsedNode> {
    let mut nodes = Vec::new();
    loop {
        if cursor.is_at_end() {
            break;
        }
        if stop_at_bracket {
            if cursor.peek() == Some(']') {
                break;
            }
        } else if peek_window_kind(cursor).is_some() {
            break;
        }

        if cursor.peek() == Some('[') {
            nodes.push(lex_tag(cursor, errors));
        } else {
            let text = cursor.take_while(|c| c != '[' && !(stop_at_bracket && c == ']'));
            nodes.push(ParsedNode::Text(text));
        }
    }
    nodes
}

fn lex_tag(cursor: &mut Cursor, errors: &mut Vec<CompileError>) -> ParsedNode {
    let (line, col) = cursor.position();
    cursor.advance(); // '['
    let name = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@');

    let mut int_literals = Vec::new();
    loop {
        cursor.take_while(|c| c == ' ' || c == '\t');
        match cursor.peek() {
            Some(']') | None => break,
            _ => {}
        }
        let (token_line, token_col) = cursor.position();
        let token = cursor.take_while(|c| !c.is_whitespace() && c != ']');
        if token.is_empty() {
            cursor.advance();
            continue;
        }
        match parse_int_literal(&token) {
            Some(value) => int_literals.push(value),
            None => errors.push(CompileError::IntLiteralFormat {
                text: token,
                line: token_line,
                col: token_col,
            }),
        }
    }

    if !cursor.bump_if(']') {
        errors.push(CompileError::Syntax {
            line,
            col,
            message: "unterminated tag".into(),
        });
    }

    ParsedNode::Tag {
        name,
        int_literals,
        line,
        col,
    }
}

fn parse_int_literal(token: &str) -> Option<i32> {
    let (negative, rest) = token.strip_prefix('-').map_or((false, token), |r| (true, r));
    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        rest.parse::<i64>().ok()?
    };
    let signed = if negative { -magnitude } else { magnitude };
    i32::try_from(signed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_a_function_tag_with_hex_argument() {
        let (tree, errors) = lex_document("[dlg x][f 0 2 0x10][e]");
        assert!(errors.is_empty(), "{errors:?}");
        let body = &tree.windows[0].body;
        assert_eq!(
            body[0],
            ParsedNode::Tag {
                name: "f".into(),
                int_literals: vec![0, 2, 16],
                line: 1,
                col: 8,
            }
        );
    }

    #[test]
    fn splits_speaker_block_from_body() {
        let (tree, errors) = lex_document("[dlg hi [Bob]]Hello[e]");
        assert!(errors.is_empty(), "{errors:?}");
        let window = &tree.windows[0];
        assert_eq!(window.identifier, "hi");
        assert_eq!(window.speaker_block, Some(vec![ParsedNode::Text("Bob".into())]));
        assert_eq!(
            window.body,
            vec![
                ParsedNode::Text("Hello".into()),
                ParsedNode::Tag {
                    name: "e".into(),
                    int_literals: vec![],
                    line: 1,
                    col: 20,
                }
            ]
        );
    }

    #[test]
    fn lexes_consecutive_windows() {
        let (tree, errors) = lex_document("[dlg a][e][sel b][e]");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(tree.windows.len(), 2);
        assert_eq!(tree.windows[0].kind, WindowKind::Dialogue);
        assert_eq!(tree.windows[1].kind, WindowKind::Selection);
    }

    #[test]
    fn reports_invalid_integer_literal() {
        let (_, errors) = lex_document("[dlg a][f not_a_number 2][e]");
        assert!(matches!(
            errors.as_slice(),
            [CompileError::IntLiteralFormat { text, .. }] if text == "not_a_number"
        ));
    }
}
