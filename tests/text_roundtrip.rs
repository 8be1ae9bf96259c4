//! Surface-syntax round-trip tests: compile then decompile, and the spec's
//! worked scenarios A4-A6.

use message_script::library::{FunctionEntry, FunctionLibrary, LibrarySet, ParameterKind};
use message_script::model::{Speaker, Token, Window};
use message_script::surface::compiler::{CompileOptions, compile};
use message_script::surface::decompiler::{DecompileOptions, decompile_script};
use pretty_assertions::assert_eq;

#[test]
fn a4_bare_dialogue_window() {
    let script = compile("[dlg greet][e]", CompileOptions::default(), None).unwrap();
    assert_eq!(script.windows.len(), 1);
    let Window::Dialogue(w) = &script.windows[0] else {
        panic!("expected dialogue window");
    };
    assert_eq!(w.identifier, "greet");
    assert_eq!(w.speaker, None);
    assert_eq!(w.lines.len(), 1);
    assert!(w.lines[0].tokens.is_empty());
}

#[test]
fn a5_named_speaker_and_newline_token() {
    let script = compile("[dlg hi [Bob]]Hello[n]world[e]", CompileOptions::default(), None).unwrap();
    let Window::Dialogue(w) = &script.windows[0] else {
        panic!("expected dialogue window");
    };
    assert_eq!(w.identifier, "hi");
    let Some(Speaker::Named(name)) = &w.speaker else {
        panic!("expected a named speaker");
    };
    assert_eq!(name.tokens, vec![Token::text("Bob")]);
    assert_eq!(
        w.lines[0].tokens,
        vec![Token::text("Hello"), Token::NewLine, Token::text("world")]
    );
}

#[test]
fn a6_variable_index_speaker_round_trips_through_compile_and_decompile() {
    let source = "[dlg greet [3]]\n[f 0 2 100][e]\n";
    let script = compile(source, CompileOptions::default(), None).unwrap();
    let text = decompile_script(&script, None, DecompileOptions::default());
    assert_eq!(text, source);
}

#[test]
fn round_trips_through_a_function_library() {
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
    let source = "[dlg scene]\n[Wait 10][e]\n";
    let script = compile(source, CompileOptions::default(), Some(&libraries)).unwrap();
    let text = decompile_script(&script, Some(&libraries), DecompileOptions::default());
    assert_eq!(text, source);
}

#[test]
fn multiple_windows_round_trip() {
    // Canonical decompiler output: a window header is always followed by a
    // newline, regardless of how the original source laid it out.
    let source = "[dlg a]\nHi[e]\n[sel b]\nYes[e]\nNo[e]\n";
    let script = compile(source, CompileOptions::default(), None).unwrap();
    assert_eq!(script.windows.len(), 2);
    let text = decompile_script(&script, None, DecompileOptions::default());
    assert_eq!(text, source);
}
