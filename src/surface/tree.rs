//! The internal parse-tree interface between a grammar front-end and the
//! Compiler. Any front-end that produces a [`DocumentTree`] is compatible
//! with [`crate::surface::compiler`] — the Compiler never depends on
//! [`crate::surface::lexer`]'s particular scanning strategy.

/// One node of a window body: either a literal text run or a bracketed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedNode {
    /// A bracketed tag, e.g. `[f 0 2 100]` or `[Bob]`.
    Tag {
        /// The tag name, exactly as written (case folding is the
        /// Compiler's job, not the front-end's).
        name: String,
        /// The tag's space-separated integer-literal arguments, already
        /// parsed from decimal or `0x`-prefixed hex.
        int_literals: Vec<i32>,
        /// 1-based source line the tag started on.
        line: usize,
        /// 1-based source column the tag started on.
        col: usize,
    },
    /// A literal run of text between tags.
    Text(String),
}

/// The kind of window a [`WindowNode`] declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// `[dlg ...]`.
    Dialogue,
    /// `[sel ...]`.
    Selection,
}

/// One parsed window: its header plus its body of [`ParsedNode`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowNode {
    /// Which kind of window this is.
    pub kind: WindowKind,
    /// The window's identifier, as written after the keyword.
    pub identifier: String,
    /// The optional bracketed speaker sub-block (dialogue windows only).
    /// Present only when the source wrote `[dlg ident [ ... ]]`.
    pub speaker_block: Option<Vec<ParsedNode>>,
    /// The window's body, in source order.
    pub body: Vec<ParsedNode>,
}

/// A complete parsed document: an ordered list of windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTree {
    /// The windows, in source order.
    pub windows: Vec<WindowNode>,
}
