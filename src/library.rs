//! The function-name metadata registry.
//!
//! A [`LibrarySet`] aliases numeric `(table_index, function_index)` pairs to
//! human-readable tag names, purely for the Compiler to recognize named
//! tags and for the Decompiler to emit them. The core never inspects a
//! function's semantic meaning; this registry is metadata, not behavior.

/// The kind of a single function parameter. Only the count of parameters
/// matters to the Compiler (it determines how many integer arguments to
/// read from a tag); no parameter kind beyond "a 16-bit integer" is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterKind {
    /// A signed 16-bit integer argument.
    Int16,
}

/// A single named function within a [`FunctionLibrary`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionEntry {
    /// The tag name used in surface syntax (e.g. `Bob` in `[Bob 10]`).
    /// Name resolution is case-sensitive, per the external interface.
    pub name: String,
    /// The opcode's index within its table (`0..=31`).
    pub index: u8,
    /// The tag's expected parameters. Its length is the number of integer
    /// arguments the Compiler reads from the tag.
    pub parameters: Vec<ParameterKind>,
}

/// A sentinel function name recognized by the Decompiler's
/// "omit unused" option.
pub const UNUSED_SENTINEL: &str = "@Unused";

/// A collection of functions sharing a table index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionLibrary {
    /// Equals the `table_index` every function in `functions` belongs to.
    pub index: u8,
    /// A human-readable name for the library itself (e.g. a module name).
    pub name: String,
    /// The functions defined in this library.
    pub functions: Vec<FunctionEntry>,
}

/// A set of libraries, as consumed by the Compiler and Decompiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibrarySet {
    /// The libraries in this set.
    pub libraries: Vec<FunctionLibrary>,
}

impl LibrarySet {
    /// Creates an empty library set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            libraries: Vec::new(),
        }
    }

    /// Finds a function by its surface-syntax tag name. Case-sensitive.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<(&FunctionLibrary, &FunctionEntry)> {
        self.libraries.iter().find_map(|lib| {
            lib.functions
                .iter()
                .find(|f| f.name == name)
                .map(|f| (lib, f))
        })
    }

    /// Finds a function by its numeric `(table_index, function_index)` pair.
    #[must_use]
    pub fn find_by_indices(
        &self,
        table_index: u8,
        function_index: u8,
    ) -> Option<(&FunctionLibrary, &FunctionEntry)> {
        self.libraries
            .iter()
            .find(|lib| lib.index == table_index)
            .and_then(|lib| {
                lib.functions
                    .iter()
                    .find(|f| f.index == function_index)
                    .map(|f| (lib, f))
            })
    }
}

#[cfg(feature = "serde")]
impl LibrarySet {
    /// Parses a [`LibrarySet`] from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not valid JSON matching the
    /// [`LibrarySet`] schema.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serializes this [`LibrarySet`] to a pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (this should not happen for
    /// a well-formed [`LibrarySet`]).
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
